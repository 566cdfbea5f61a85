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

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use hass_probe_types::{DailyBucket, DailyDelta, EnergyUnit, GapPolicy, HistoryEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

const DAY_QUARTERS: i64 = 24 * 4;

/// Where one calendar day ends and the next begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundary {
    /// Midnight UTC. HA reports history timestamps in UTC, so this matches
    /// the date printed in the raw `last_changed` field.
    #[default]
    Utc,
    /// Local midnight in the given IANA time zone
    Zone(Tz),
}

impl DayBoundary {
    /// Calendar day a timestamp belongs to
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Utc => at.date_naive(),
            Self::Zone(tz) => at.with_timezone(tz).date_naive(),
        }
    }

    /// First instant of `day`
    ///
    /// When a DST change skips local midnight, the day starts at the first
    /// local time that exists, searched in 15 minute steps.
    pub fn start_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let midnight = day.and_time(NaiveTime::MIN);
        match self {
            Self::Utc => midnight.and_utc(),
            Self::Zone(tz) => (0..DAY_QUARTERS)
                .filter_map(|quarter| {
                    midnight.checked_add_signed(Duration::minutes(15 * quarter))
                })
                .find_map(|local| tz.from_local_datetime(&local).earliest())
                .map_or_else(|| midnight.and_utc(), |local| local.with_timezone(&Utc)),
        }
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc => write!(f, "UTC"),
            Self::Zone(tz) => write!(f, "{}", tz.name()),
        }
    }
}

impl FromStr for DayBoundary {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::Utc);
        }
        trimmed
            .parse::<Tz>()
            .map(Self::Zone)
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{s}': {e}"))
    }
}

/// Full output of one extraction: per-day readings plus the derived deltas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEnergyReport {
    /// Buckets in ascending day order
    pub buckets: Vec<DailyBucket>,
    /// Day-over-day consumption in ascending day order (kWh)
    pub deltas: Vec<DailyDelta>,
    /// Consumption so far on the requested day (kWh), if it has readings
    pub today_kwh: Option<f64>,
}

/// Turns the history of an accumulating counter into per-day consumption
///
/// The extractor is a pure function of its input. Entries whose state does
/// not parse as a finite number are dropped before bucketing, and counter
/// resets are passed through as negative deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyDeltaExtractor {
    gap_policy: GapPolicy,
    source_unit: EnergyUnit,
    boundary: DayBoundary,
    retain_readings: bool,
}

impl DailyDeltaExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    /// Unit the counter reports in (Wh unless told otherwise)
    pub fn with_source_unit(mut self, source_unit: EnergyUnit) -> Self {
        self.source_unit = source_unit;
        self
    }

    pub fn with_day_boundary(mut self, boundary: DayBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Keep every reading in the buckets, not only the first and last
    pub fn with_retained_readings(mut self, retain: bool) -> Self {
        self.retain_readings = retain;
        self
    }

    /// Group valid readings by calendar day
    ///
    /// `history` must be time-ascending; within a bucket the first entry seen
    /// is the opening reading and the last one the closing reading.
    pub fn buckets(&self, history: &[HistoryEntry]) -> Vec<DailyBucket> {
        let mut by_day: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();
        let mut skipped = 0_usize;

        for entry in history {
            let Some(value) = entry.numeric_state() else {
                trace!(
                    "Skipping non-numeric state '{}' at {}",
                    entry.state, entry.last_changed
                );
                skipped += 1;
                continue;
            };

            let day = self.boundary.day_of(entry.last_changed);
            by_day
                .entry(day)
                .and_modify(|bucket| bucket.push(value, self.retain_readings))
                .or_insert_with(|| DailyBucket::new(day, value, self.retain_readings));
        }

        debug!(
            "Bucketed {} history entries into {} days ({} skipped)",
            history.len(),
            by_day.len(),
            skipped
        );

        by_day.into_values().collect()
    }

    /// Day-over-day deltas from buckets sorted by ascending day
    pub fn deltas_from_buckets(&self, buckets: &[DailyBucket]) -> Vec<DailyDelta> {
        buckets
            .windows(2)
            .filter_map(|pair| {
                let (previous, current) = (&pair[0], &pair[1]);

                if self.gap_policy == GapPolicy::Skip
                    && current.day.pred_opt() != Some(previous.day)
                {
                    trace!(
                        "No readings on the day before {}, skipping its delta",
                        current.day
                    );
                    return None;
                }

                Some(DailyDelta {
                    day: current.day,
                    since: previous.day,
                    consumption: self.source_unit.to_kwh(current.closing - previous.closing),
                })
            })
            .collect()
    }

    /// Per-day consumption for every day that has a usable predecessor
    pub fn extract(&self, history: &[HistoryEntry]) -> Vec<DailyDelta> {
        self.deltas_from_buckets(&self.buckets(history))
    }

    /// Buckets, deltas and consumption so far on `today` in one pass
    pub fn report(&self, history: &[HistoryEntry], today: NaiveDate) -> DailyEnergyReport {
        let buckets = self.buckets(history);
        let deltas = self.deltas_from_buckets(&buckets);
        let today_kwh = today_so_far(&buckets, today, self.source_unit);

        DailyEnergyReport {
            buckets,
            deltas,
            today_kwh,
        }
    }
}

/// Daily deltas with the default settings: Wh source, UTC days, gap days skipped
pub fn extract_daily_deltas(history: &[HistoryEntry]) -> Vec<DailyDelta> {
    DailyDeltaExtractor::default().extract(history)
}

/// Consumption from the first to the latest reading of `today` (kWh)
pub fn today_so_far(buckets: &[DailyBucket], today: NaiveDate, unit: EnergyUnit) -> Option<f64> {
    buckets
        .iter()
        .find(|bucket| bucket.day == today)
        .map(|bucket| bucket.intraday_consumption(unit))
}
