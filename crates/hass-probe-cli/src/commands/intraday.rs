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

use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, Utc};
use hass_probe_core::{DailyDeltaExtractor, HistoryEntry, StateProvider};
use tracing::warn;

use crate::cli::{IntradayArgs, IntradayRow, TableFormatter};
use crate::config::AppConfig;

/// One history request per day, oldest day first, today included
pub async fn run(args: &IntradayArgs, config: &AppConfig) -> Result<()> {
    let provider = super::ha_provider(config)?;
    let entity_id = args.entity.as_deref().unwrap_or(&config.energy.entity);
    let boundary = config.day_boundary()?;
    let days = args.days.unwrap_or(config.energy.history_days);

    let unit = super::resolve_unit(
        &provider,
        entity_id,
        args.unit.or(config.energy.source_unit),
    )
    .await?;
    let extractor = DailyDeltaExtractor::new()
        .with_source_unit(unit)
        .with_day_boundary(boundary);

    let today = boundary.day_of(Utc::now());
    let mut rows = Vec::new();
    for day in days_back(today, days)? {
        let start = boundary.start_of(day);
        let end = day
            .checked_add_days(Days::new(1))
            .map_or(DateTime::<Utc>::MAX_UTC, |next| boundary.start_of(next));

        let row = match provider.get_history(entity_id, start, end).await {
            Ok(history) => intraday_row(&extractor, day, &history),
            Err(e) => {
                warn!("⚠️ History for {} on {} failed: {:#}", entity_id, day, e);
                IntradayRow {
                    day,
                    entries: 0,
                    bucket: None,
                    error: Some(format!("{e:#}")),
                }
            }
        };
        rows.push(row);
    }

    print!("{}", TableFormatter::intraday(entity_id, unit, &rows));
    Ok(())
}

/// `today` and the `days` before it, oldest first
fn days_back(today: NaiveDate, days: u32) -> Result<Vec<NaiveDate>> {
    let first = today
        .checked_sub_days(Days::new(u64::from(days)))
        .with_context(|| format!("{days} days before {today} is out of range"))?;
    Ok(first.iter_days().take_while(|day| *day <= today).collect())
}

fn intraday_row(
    extractor: &DailyDeltaExtractor,
    day: NaiveDate,
    history: &[HistoryEntry],
) -> IntradayRow {
    IntradayRow {
        day,
        entries: history.len(),
        bucket: extractor
            .buckets(history)
            .into_iter()
            .find(|bucket| bucket.day == day),
        error: None,
    }
}
