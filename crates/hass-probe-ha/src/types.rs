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

use chrono::{DateTime, Utc};
use hass_probe_core::HistoryEntry;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Historical state point from HA history API
///
/// With `minimal_response` only the first point of each entity carries
/// `entity_id` and `attributes`, and later points may omit `last_changed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaHistoryState {
    #[serde(default)]
    pub entity_id: Option<String>,
    pub state: String,
    #[serde(default)]
    pub attributes: Option<serde_json::Value>,
    #[serde(default)]
    pub last_changed: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl HaHistoryState {
    /// Timestamp of the observation: `last_changed`, else `last_updated`
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self
            .last_changed
            .as_deref()
            .or(self.last_updated.as_deref())?;

        match DateTime::parse_from_rfc3339(raw) {
            Ok(timestamp) => Some(timestamp.with_timezone(&Utc)),
            Err(e) => {
                trace!("Could not parse timestamp '{}': {}", raw, e);
                None
            }
        }
    }

    /// Core history entry, or `None` when the point has no usable timestamp
    pub fn into_history_entry(self) -> Option<HistoryEntry> {
        let last_changed = self.timestamp()?;
        Some(HistoryEntry::new(self.state, last_changed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_full_point() {
        let point: HaHistoryState = serde_json::from_value(json!({
            "entity_id": "sensor.grid",
            "state": "1500",
            "attributes": {"unit_of_measurement": "Wh"},
            "last_changed": "2024-01-01T12:00:00.123+00:00",
            "last_updated": "2024-01-01T12:00:05+00:00"
        }))
        .unwrap();

        let entry = point.into_history_entry().unwrap();
        assert_eq!(entry.state, "1500");
        assert_eq!(
            entry.last_changed,
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
                + chrono::Duration::milliseconds(123)
        );
    }

    #[test]
    fn test_minimal_point_falls_back_to_last_updated() {
        let point: HaHistoryState = serde_json::from_value(json!({
            "state": "1600",
            "last_updated": "2024-01-01T13:00:00+00:00"
        }))
        .unwrap();

        assert!(point.entity_id.is_none());
        let entry = point.into_history_entry().unwrap();
        assert_eq!(
            entry.last_changed,
            Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_point_without_timestamp_is_dropped() {
        let missing: HaHistoryState = serde_json::from_value(json!({"state": "1"})).unwrap();
        assert!(missing.into_history_entry().is_none());

        let garbage: HaHistoryState =
            serde_json::from_value(json!({"state": "1", "last_changed": "yesterday"})).unwrap();
        assert!(garbage.into_history_entry().is_none());
    }
}
