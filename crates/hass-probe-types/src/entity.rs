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
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Snapshot of one Home Assistant entity at one instant
///
/// Mirrors a single element of `GET /api/states`. The record is never
/// mutated after it has been fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Entity identifier in `domain.object_id` form (e.g. "sensor.grid_import_energy")
    pub entity_id: String,

    /// Raw state string as reported by HA ("42.5", "on", "unavailable", ...)
    pub state: String,

    /// Free-form attribute map. Missing or `null` attributes become an empty map.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub attributes: Map<String, Value>,

    pub last_changed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl StateRecord {
    /// Domain part of the entity id (text before the first `.`)
    ///
    /// An id without a dot is treated as a bare domain.
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }

    /// String attribute lookup. Non-string values are ignored.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attribute_str("friendly_name")
    }

    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.attribute_str("unit_of_measurement")
    }

    pub fn device_class(&self) -> Option<&str> {
        self.attribute_str("device_class")
    }

    pub fn state_class(&self) -> Option<&str> {
        self.attribute_str("state_class")
    }

    /// Numeric value of the state, if it parses as a finite number
    pub fn numeric_state(&self) -> Option<f64> {
        parse_finite(&self.state)
    }
}

/// One observation of an entity's value over time
///
/// Produced by a state provider in ascending `last_changed` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub state: String,
    pub last_changed: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(state: impl Into<String>, last_changed: DateTime<Utc>) -> Self {
        Self {
            state: state.into(),
            last_changed,
        }
    }

    /// Numeric value of the state, if it parses as a finite number
    ///
    /// "unavailable", "unknown", empty strings, NaN and infinities all yield `None`.
    pub fn numeric_state(&self) -> Option<f64> {
        parse_finite(&self.state)
    }
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
