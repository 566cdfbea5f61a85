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
use tracing::info;

use crate::cli::ConfigArgs;
use crate::config::AppConfig;

pub fn run(args: &ConfigArgs, config: &AppConfig) -> Result<()> {
    if let Some(path) = &args.write_default {
        if path.exists() {
            anyhow::bail!("Refusing to overwrite existing file: {}", path.display());
        }
        AppConfig::default().save(path)?;
        info!("✅ Default configuration written to {}", path.display());
        println!("Wrote {}", path.display());
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(())
}

/// Copy of the configuration that is safe to print
fn redacted(config: &AppConfig) -> AppConfig {
    let mut shown = config.clone();
    if shown.home_assistant.token.is_some() {
        shown.home_assistant.token = Some("********".to_owned());
    }
    shown
}
