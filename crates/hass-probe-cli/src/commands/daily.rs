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
use chrono::{DateTime, Utc};
use hass_probe_core::{
    DailyDeltaExtractor, DayBoundary, EnergyUnit, GapPolicy, HistoryEntry, StateProvider,
};
use tracing::info;

use crate::cli::{DailyArgs, DailySummary, JsonFormatter, OutputFormat, TableFormatter};
use crate::config::AppConfig;

/// Settings of one `daily` run after merging flags over the config file
#[derive(Debug, Clone)]
struct DailySettings {
    entity_id: String,
    days: u32,
    gap_policy: GapPolicy,
    unit: Option<EnergyUnit>,
    boundary: DayBoundary,
}

impl DailySettings {
    fn resolve(args: &DailyArgs, config: &AppConfig) -> Result<Self> {
        let boundary = match args.timezone.as_deref() {
            Some(zone) => zone.parse()?,
            None => config.day_boundary()?,
        };

        Ok(Self {
            entity_id: args
                .entity
                .clone()
                .unwrap_or_else(|| config.energy.entity.clone()),
            days: args.days.unwrap_or(config.energy.history_days),
            gap_policy: args.gap_policy.unwrap_or(config.energy.gap_policy),
            unit: args.unit.or(config.energy.source_unit),
            boundary,
        })
    }
}

pub async fn run(args: &DailyArgs, config: &AppConfig) -> Result<()> {
    let settings = DailySettings::resolve(args, config)?;
    let provider = super::ha_provider(config)?;

    let unit = super::resolve_unit(&provider, &settings.entity_id, settings.unit).await?;
    let (start, end) = super::history_window(Utc::now(), settings.days, settings.boundary)?;
    info!(
        "📊 Daily consumption for {} over {} days ({}, gaps: {})",
        settings.entity_id, settings.days, unit, settings.gap_policy
    );

    let history = provider
        .get_history(&settings.entity_id, start, end)
        .await?;
    let summary = summarize(&settings, unit, start, end, &history);

    match args.format {
        OutputFormat::Table => print!("{}", TableFormatter::daily(&summary)),
        OutputFormat::Json => println!("{}", JsonFormatter::daily(&summary)?),
    }
    Ok(())
}

/// Run the extractor over a fetched history; "today" is the day of `end`
fn summarize(
    settings: &DailySettings,
    unit: EnergyUnit,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    history: &[HistoryEntry],
) -> DailySummary {
    let extractor = DailyDeltaExtractor::new()
        .with_gap_policy(settings.gap_policy)
        .with_source_unit(unit)
        .with_day_boundary(settings.boundary);

    DailySummary {
        entity_id: settings.entity_id.clone(),
        unit,
        gap_policy: settings.gap_policy,
        day_boundary: settings.boundary.to_string(),
        start,
        end,
        entries: history.len(),
        report: extractor.report(history, settings.boundary.day_of(end)),
    }
}
