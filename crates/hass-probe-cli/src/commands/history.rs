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
use chrono::{DateTime, NaiveDate, Utc};
use hass_probe_core::{DayBoundary, HistoryEntry, StateProvider};

use crate::cli::{HistoryArgs, HistorySample, TableFormatter};
use crate::config::AppConfig;

pub async fn run(args: &HistoryArgs, config: &AppConfig) -> Result<()> {
    let provider = super::ha_provider(config)?;
    let entity_id = args.entity.as_deref().unwrap_or(&config.energy.entity);
    let boundary = config.day_boundary()?;
    let days = args.days.unwrap_or(config.energy.history_days);

    let (start, end) = super::history_window(Utc::now(), days, boundary)?;
    let history = provider.get_history(entity_id, start, end).await?;

    let sample = sample_history(entity_id, (start, end), &history, args.sample, boundary);
    print!("{}", TableFormatter::history(&sample));
    Ok(())
}

/// First and last `size` entries (never overlapping) and the first entry of each day
fn sample_history(
    entity_id: &str,
    (start, end): (DateTime<Utc>, DateTime<Utc>),
    history: &[HistoryEntry],
    size: usize,
    boundary: DayBoundary,
) -> HistorySample {
    let head: Vec<HistoryEntry> = history.iter().take(size).cloned().collect();
    let tail_start = history.len().saturating_sub(size).max(head.len());
    let tail: Vec<HistoryEntry> = history.iter().skip(tail_start).cloned().collect();

    let mut first_of_day: Vec<(NaiveDate, HistoryEntry)> = Vec::new();
    for entry in history {
        let day = boundary.day_of(entry.last_changed);
        if first_of_day.last().is_none_or(|(seen, _)| *seen != day) {
            first_of_day.push((day, entry.clone()));
        }
    }

    HistorySample {
        entity_id: entity_id.to_owned(),
        start,
        end,
        total: history.len(),
        head,
        tail,
        first_of_day,
    }
}
