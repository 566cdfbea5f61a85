// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of HassProbe.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::Result;
use hass_probe_core::{StateProvider, domain_counts};

use crate::cli::{DomainsArgs, JsonFormatter, OutputFormat, TableFormatter};
use crate::config::AppConfig;

pub async fn run(args: &DomainsArgs, config: &AppConfig) -> Result<()> {
    let provider = super::snapshot_provider(config, &args.source)?;
    let counts = domain_counts(&provider.get_snapshot().await?);

    match args.format {
        OutputFormat::Table => print!("{}", TableFormatter::domains(&counts)),
        OutputFormat::Json => println!("{}", JsonFormatter::domains(&counts)?),
    }
    Ok(())
}
