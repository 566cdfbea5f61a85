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
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============= Energy Units =============

/// Unit of an accumulating energy counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EnergyUnit {
    /// Watt-hours (HA default for most grid meters)
    #[default]
    #[serde(rename = "Wh", alias = "wh")]
    WattHours,
    #[serde(rename = "kWh", alias = "kwh")]
    KilowattHours,
    #[serde(rename = "MWh", alias = "mwh")]
    MegawattHours,
}

impl EnergyUnit {
    /// Unit symbol as HA reports it in `unit_of_measurement`
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::WattHours => "Wh",
            Self::KilowattHours => "kWh",
            Self::MegawattHours => "MWh",
        }
    }

    /// List all supported units
    pub fn all() -> &'static [EnergyUnit] {
        &[Self::WattHours, Self::KilowattHours, Self::MegawattHours]
    }

    /// Convert a raw counter difference in this unit to kWh
    pub fn to_kwh(&self, value: f64) -> f64 {
        match self {
            Self::WattHours => value / 1000.0,
            Self::KilowattHours => value,
            Self::MegawattHours => value * 1000.0,
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for EnergyUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "wh" => Ok(Self::WattHours),
            "kwh" => Ok(Self::KilowattHours),
            "mwh" => Ok(Self::MegawattHours),
            _ => Err(anyhow::anyhow!(
                "Unknown energy unit: '{}'. Supported units: {}",
                s,
                Self::all()
                    .iter()
                    .map(EnergyUnit::symbol)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

// ============= Gap Handling =============

/// How a calendar day without any valid reading affects day-over-day deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Only compare a day with the calendar day directly before it.
    /// A gap day has no delta and breaks the chain for the day after it.
    #[default]
    Skip,
    /// Compare a day with the most recent earlier day that has readings,
    /// so the delta spans any gap days in between.
    CarryForward,
}

impl GapPolicy {
    pub fn to_config_value(&self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::CarryForward => "carry-forward",
        }
    }
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_config_value())
    }
}

impl FromStr for GapPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "skip" => Ok(Self::Skip),
            "carry-forward" | "carry" => Ok(Self::CarryForward),
            _ => Err(anyhow::anyhow!(
                "Unknown gap policy: '{s}'. Supported policies: skip, carry-forward"
            )),
        }
    }
}

// ============= Daily Aggregates =============

/// Readings of one counter entity that fall on a single calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub day: NaiveDate,

    /// First valid reading of the day
    pub opening: f64,

    /// Last valid reading of the day
    pub closing: f64,

    /// Number of valid readings that fell on this day
    pub count: usize,

    /// Every reading in time order, only populated when requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readings: Vec<f64>,
}

impl DailyBucket {
    pub fn new(day: NaiveDate, value: f64, retain_readings: bool) -> Self {
        Self {
            day,
            opening: value,
            closing: value,
            count: 1,
            readings: if retain_readings { vec![value] } else { Vec::new() },
        }
    }

    /// Record a later reading of the same day
    pub fn push(&mut self, value: f64, retain_readings: bool) {
        self.closing = value;
        self.count += 1;
        if retain_readings {
            self.readings.push(value);
        }
    }

    /// Consumption within the day (closing - opening), converted to kWh
    pub fn intraday_consumption(&self, unit: EnergyUnit) -> f64 {
        unit.to_kwh(self.closing - self.opening)
    }
}

/// Consumption attributed to one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDelta {
    pub day: NaiveDate,

    /// Day whose closing reading was used as the baseline. Equals `day - 1`
    /// unless a carry-forward spanned gap days.
    pub since: NaiveDate,

    /// Consumption in kWh. Negative after a counter reset.
    pub consumption: f64,
}

impl DailyDelta {
    /// Number of calendar days the delta covers
    pub fn span_days(&self) -> i64 {
        (self.day - self.since).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_unit_conversion() {
        assert_eq!(EnergyUnit::WattHours.to_kwh(1000.0), 1.0);
        assert_eq!(EnergyUnit::KilowattHours.to_kwh(2.5), 2.5);
        assert_eq!(EnergyUnit::MegawattHours.to_kwh(0.5), 500.0);
    }

    #[test]
    fn test_energy_unit_parse() {
        assert_eq!("Wh".parse::<EnergyUnit>().unwrap(), EnergyUnit::WattHours);
        assert_eq!("kwh".parse::<EnergyUnit>().unwrap(), EnergyUnit::KilowattHours);
        assert_eq!("MWh".parse::<EnergyUnit>().unwrap(), EnergyUnit::MegawattHours);
        assert!("W".parse::<EnergyUnit>().is_err());
    }

    #[test]
    fn test_energy_unit_serde_symbols() {
        let json = serde_json::to_string(&EnergyUnit::KilowattHours).unwrap();
        assert_eq!(json, "\"kWh\"");
        let parsed: EnergyUnit = serde_json::from_str("\"wh\"").unwrap();
        assert_eq!(parsed, EnergyUnit::WattHours);
    }

    #[test]
    fn test_gap_policy_parse() {
        assert_eq!("skip".parse::<GapPolicy>().unwrap(), GapPolicy::Skip);
        assert_eq!(
            "carry_forward".parse::<GapPolicy>().unwrap(),
            GapPolicy::CarryForward
        );
        assert_eq!(
            "Carry-Forward".parse::<GapPolicy>().unwrap(),
            GapPolicy::CarryForward
        );
        assert!("interpolate".parse::<GapPolicy>().is_err());
        assert_eq!(GapPolicy::default(), GapPolicy::Skip);
    }

    #[test]
    fn test_bucket_tracks_first_and_last() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut bucket = DailyBucket::new(day, 1000.0, false);
        bucket.push(1200.0, false);
        bucket.push(1500.0, false);

        assert_eq!(bucket.opening, 1000.0);
        assert_eq!(bucket.closing, 1500.0);
        assert_eq!(bucket.count, 3);
        assert!(bucket.readings.is_empty());
        assert_eq!(bucket.intraday_consumption(EnergyUnit::WattHours), 0.5);
    }

    #[test]
    fn test_bucket_retains_readings_on_request() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut bucket = DailyBucket::new(day, 1.0, true);
        bucket.push(2.0, true);
        assert_eq!(bucket.readings, vec![1.0, 2.0]);
    }

    #[test]
    fn test_delta_span() {
        let delta = DailyDelta {
            day: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            since: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            consumption: 3.0,
        };
        assert_eq!(delta.span_days(), 3);
    }
}
