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

//! CLI entry point for HassProbe

mod cli;
mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration decides the default log level, so it is loaded first
    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&config.system.log_level)?;

    debug!("📋 Configuration Summary:");
    debug!("   Home Assistant: {}", config.home_assistant.base_url);
    debug!(
        "   Token: {}",
        if config.home_assistant.token.is_some() {
            "configured"
        } else {
            "not set"
        }
    );
    debug!("   Energy entity: {}", config.energy.entity);
    debug!(
        "   History: {} days, gaps: {}",
        config.energy.history_days, config.energy.gap_policy
    );

    // Create tokio runtime for async HTTP operations
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(commands::run(cli.command, &config))
}

/// Initialize tracing with env filter support
///
/// Respects RUST_LOG, falls back to the configured level. Logs go to stderr
/// so reports on stdout stay machine-readable.
fn init_tracing(level: &str) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set default tracing subscriber")
}
