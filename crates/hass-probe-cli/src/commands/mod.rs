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

mod config;
mod daily;
mod domains;
mod find;
mod history;
mod intraday;

use anyhow::{Context, Result};
use chrono::{DateTime, Days, Utc};
use hass_probe_core::{DayBoundary, EnergyUnit, StateProvider};
use hass_probe_ha::{HaStateProvider, HomeAssistantClient, StatesDumpProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cli::{Commands, SnapshotSource};
use crate::config::AppConfig;

/// Dispatch one CLI command
pub async fn run(command: Commands, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Find(args) => find::run(&args, config).await,
        Commands::Domains(args) => domains::run(&args, config).await,
        Commands::Daily(args) => daily::run(&args, config).await,
        Commands::History(args) => history::run(&args, config).await,
        Commands::Intraday(args) => intraday::run(&args, config).await,
        Commands::Config(args) => config::run(&args, config),
    }
}

/// REST provider for the configured Home Assistant instance
///
/// Falls back to the Supervisor API when no token is configured but
/// `SUPERVISOR_TOKEN` is present (running as an add-on).
fn ha_provider(config: &AppConfig) -> Result<HaStateProvider> {
    let ha = &config.home_assistant;
    let client = match ha.token.as_deref() {
        Some(token) => HomeAssistantClient::with_timeout(&ha.base_url, token, config.timeout())?,
        None if std::env::var_os("SUPERVISOR_TOKEN").is_some() => {
            HomeAssistantClient::from_supervisor()?
        }
        None => anyhow::bail!(
            "No Home Assistant token configured. Set home_assistant.token in the config file \
             or the HA_TOKEN environment variable"
        ),
    };

    let provider = HaStateProvider::new(Arc::new(client));
    info!("🏠 Using Home Assistant at {}", provider.client().base_url());
    Ok(provider)
}

/// Provider for snapshot-only commands: a saved dump if given, HA otherwise
fn snapshot_provider(
    config: &AppConfig,
    source: &SnapshotSource,
) -> Result<Box<dyn StateProvider>> {
    match &source.from_file {
        Some(path) => Ok(Box::new(StatesDumpProvider::new(path))),
        None => Ok(Box::new(ha_provider(config)?)),
    }
}

/// History window `[local midnight of (today - days), now)`
fn history_window(
    now: DateTime<Utc>,
    days: u32,
    boundary: DayBoundary,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let first_day = boundary
        .day_of(now)
        .checked_sub_days(Days::new(u64::from(days)))
        .with_context(|| format!("History window of {days} days is out of range"))?;
    Ok((boundary.start_of(first_day), now))
}

/// Counter unit: the explicit choice, else the entity's `unit_of_measurement`
async fn resolve_unit(
    provider: &dyn StateProvider,
    entity_id: &str,
    explicit: Option<EnergyUnit>,
) -> Result<EnergyUnit> {
    if let Some(unit) = explicit {
        return Ok(unit);
    }

    let state = provider
        .get_state(entity_id)
        .await?
        .with_context(|| format!("Entity not found: {entity_id}"))?;

    let Some(raw) = state.unit_of_measurement() else {
        let fallback = EnergyUnit::default();
        warn!(
            "⚠️ {} has no unit_of_measurement, assuming {}",
            entity_id, fallback
        );
        return Ok(fallback);
    };

    let unit: EnergyUnit = raw.parse().with_context(|| {
        format!("{entity_id} reports unit '{raw}', which is not an energy counter unit")
    })?;
    debug!("Detected unit {} for {}", unit, entity_id);
    Ok(unit)
}
