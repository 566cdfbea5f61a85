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

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use hass_probe_core::{EnergyUnit, EntityMatcher, GapPolicy, Preset};
use std::path::PathBuf;

use crate::config::MAX_HISTORY_DAYS;

#[derive(Parser, Debug)]
#[command(name = "hass-probe")]
#[command(author, version, about = "Explore a Home Assistant instance over its REST API")]
#[command(
    long_about = "Read-only explorer for Home Assistant entities and energy counters.\n\
    \nConnection settings come from hass-probe.toml (or --config), overridden by\n\
    HA_BASE_URL / HA_TOKEN (or HASS_URL / HASS_TOKEN) environment variables.\n\
    \nExamples:\n  \
    hass-probe find --preset energy-stats     # Energy counters usable for daily totals\n  \
    hass-probe domains --from-file states.json\n  \
    hass-probe daily --days 14 --gap-policy carry-forward"
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the state snapshot for matching entities
    #[command(
        long_about = "Search the current state snapshot.\n\
        \nCriteria are OR-combined unless --all is given. Without any criteria every\n\
        entity is listed.\n\
        \nExamples:\n  \
        hass-probe find --preset printer\n  \
        hass-probe find --keyword uptime --domain sensor --all\n  \
        hass-probe find --unit kWh --device-class energy --format json"
    )]
    Find(FindArgs),

    /// Count entities per domain
    Domains(DomainsArgs),

    /// Daily consumption of an accumulating energy counter
    #[command(
        long_about = "Fetch the counter history from midnight N days ago until now and print\n\
        per-day readings, day-over-day consumption in kWh and today's consumption so far.\n\
        \nExamples:\n  \
        hass-probe daily\n  \
        hass-probe daily --entity sensor.house_energy --unit kWh --days 30\n  \
        hass-probe daily --timezone Europe/Prague --gap-policy carry-forward"
    )]
    Daily(DailyArgs),

    /// Inspect the raw history format of an entity
    History(HistoryArgs),

    /// Per-day first and last reading, one history request per day
    Intraday(IntradayArgs),

    /// Print the effective configuration or write a default config file
    Config(ConfigArgs),
}

/// Output format for reports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Where the state snapshot comes from
#[derive(Args, Debug, Default)]
pub struct SnapshotSource {
    /// Read a saved `/api/states` response instead of querying Home Assistant
    #[arg(long, value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct FindArgs {
    /// Named search (printer, uptime, ping, energy, energy-stats, daily)
    #[arg(long = "preset", value_name = "NAME")]
    pub presets: Vec<Preset>,

    /// Keyword matched against entity id and friendly name (case-insensitive)
    #[arg(long = "keyword", value_name = "TEXT")]
    pub keywords: Vec<String>,

    /// Substring of the entity id
    #[arg(long = "entity-contains", value_name = "TEXT")]
    pub entity_contains: Vec<String>,

    /// Exact unit_of_measurement
    #[arg(long = "unit", value_name = "UNIT")]
    pub units: Vec<String>,

    /// Exact device_class
    #[arg(long = "device-class", value_name = "CLASS")]
    pub device_classes: Vec<String>,

    /// Entity domain (sensor, switch, ...)
    #[arg(long = "domain", value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Exact entity id
    #[arg(long = "entity", value_name = "ENTITY_ID")]
    pub entities: Vec<String>,

    /// Require every criterion to match instead of any
    #[arg(long, default_value_t = false)]
    pub all: bool,

    #[command(flatten)]
    pub source: SnapshotSource,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl FindArgs {
    /// Combine the given criteria into one matcher
    pub fn matcher(&self) -> EntityMatcher {
        let mut criteria: Vec<EntityMatcher> =
            self.presets.iter().map(Preset::matcher).collect();

        if !self.keywords.is_empty() {
            criteria.push(EntityMatcher::keywords(&self.keywords));
        }
        if !self.entity_contains.is_empty() {
            criteria.push(EntityMatcher::entity_id_contains(&self.entity_contains));
        }
        if !self.units.is_empty() {
            criteria.push(EntityMatcher::units(&self.units));
        }
        if !self.device_classes.is_empty() {
            criteria.push(EntityMatcher::device_classes(&self.device_classes));
        }
        if !self.domains.is_empty() {
            criteria.push(EntityMatcher::domains(&self.domains));
        }
        if !self.entities.is_empty() {
            criteria.push(EntityMatcher::entities(&self.entities));
        }

        if self.all || criteria.is_empty() {
            EntityMatcher::AllOf(criteria)
        } else {
            EntityMatcher::AnyOf(criteria)
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct DomainsArgs {
    #[command(flatten)]
    pub source: SnapshotSource,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Default)]
pub struct DailyArgs {
    /// Energy counter entity (defaults to energy.entity from config)
    #[arg(long, value_name = "ENTITY_ID")]
    pub entity: Option<String>,

    /// Whole days before today to fetch (defaults to energy.history_days)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_HISTORY_DAYS)))]
    pub days: Option<u32>,

    /// Handling of days without readings (skip, carry-forward)
    #[arg(long, value_name = "POLICY")]
    pub gap_policy: Option<GapPolicy>,

    /// Counter unit (Wh, kWh, MWh). Detected from the entity when omitted.
    #[arg(long, value_name = "UNIT")]
    pub unit: Option<EnergyUnit>,

    /// IANA time zone whose midnight separates days (default UTC)
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Default)]
pub struct HistoryArgs {
    #[arg(long, value_name = "ENTITY_ID")]
    pub entity: Option<String>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_HISTORY_DAYS)))]
    pub days: Option<u32>,

    /// Number of entries shown from each end of the history
    #[arg(long, default_value_t = 3)]
    pub sample: usize,
}

#[derive(Args, Debug, Default)]
pub struct IntradayArgs {
    #[arg(long, value_name = "ENTITY_ID")]
    pub entity: Option<String>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_HISTORY_DAYS)))]
    pub days: Option<u32>,

    /// Counter unit (Wh, kWh, MWh). Detected from the entity when omitted.
    #[arg(long, value_name = "UNIT")]
    pub unit: Option<EnergyUnit>,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Write a config file with default values to PATH instead of printing
    #[arg(long, value_name = "PATH")]
    pub write_default: Option<PathBuf>,
}
