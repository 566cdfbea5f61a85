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

use crate::filter::EntityMatcher;
use anyhow::Result;
use std::fmt;
use std::str::FromStr;

/// Named entity searches that come up again and again when exploring an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Printers and their consumables
    Printer,
    /// Uptime sensors
    Uptime,
    /// Ping sensors and device trackers (update entities excluded)
    Ping,
    /// Anything electrical: energy, power, voltage, current
    Energy,
    /// Energy counters usable for daily deltas (Wh/kWh/MWh or energy class)
    EnergyStats,
    /// Entities that already reset daily (`_today`, `_daily`, ...)
    Daily,
}

impl Preset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Printer => "printer",
            Self::Uptime => "uptime",
            Self::Ping => "ping",
            Self::Energy => "energy",
            Self::EnergyStats => "energy-stats",
            Self::Daily => "daily",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Printer => "Printer / toner / ink / cartridge entities",
            Self::Uptime => "Uptime entities",
            Self::Ping => "Ping sensors and device trackers",
            Self::Energy => "Energy / power / electricity entities",
            Self::EnergyStats => "Energy counters (kWh, Wh, MWh or device_class energy)",
            Self::Daily => "Today / daily entities",
        }
    }

    pub fn all() -> &'static [Preset] {
        &[
            Self::Printer,
            Self::Uptime,
            Self::Ping,
            Self::Energy,
            Self::EnergyStats,
            Self::Daily,
        ]
    }

    /// Predicate implementing this preset
    pub fn matcher(&self) -> EntityMatcher {
        match self {
            Self::Printer => {
                EntityMatcher::keywords(["canon", "printer", "toner", "ink", "cartridge"])
            }
            Self::Uptime => EntityMatcher::keywords(["uptime"]),
            Self::Ping => EntityMatcher::AllOf(vec![
                EntityMatcher::AnyOf(vec![
                    EntityMatcher::entity_id_contains(["ping"]),
                    EntityMatcher::domains(["device_tracker"]),
                ]),
                EntityMatcher::domains(["update"]).negate(),
            ]),
            Self::Energy => EntityMatcher::AnyOf(vec![
                EntityMatcher::entity_id_contains([
                    "energy",
                    "power",
                    "watt",
                    "kwh",
                    "electricity",
                    "consumption",
                    "voltage",
                    "current_a",
                    "ampere",
                ]),
                EntityMatcher::units(["W", "kW", "Wh", "kWh", "V", "A", "VA"]),
                EntityMatcher::device_classes(["energy", "power", "voltage", "current"]),
            ]),
            Self::EnergyStats => EntityMatcher::AnyOf(vec![
                EntityMatcher::units(["Wh", "kWh", "MWh"]),
                EntityMatcher::device_classes(["energy"]),
            ]),
            Self::Daily => EntityMatcher::entity_id_contains(["_dag", "_daily", "_today", "_day"]),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::all()
            .iter()
            .copied()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown preset: '{}'. Available presets: {}",
                    s,
                    Self::all()
                        .iter()
                        .map(Preset::name)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hass_probe_types::StateRecord;
    use serde_json::{Value, json};

    fn state(entity_id: &str, attributes: Value) -> StateRecord {
        serde_json::from_value(json!({
            "entity_id": entity_id,
            "state": "1",
            "attributes": attributes,
            "last_changed": "2025-10-02T10:00:00+00:00",
            "last_updated": "2025-10-02T10:00:00+00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_names() {
        for preset in Preset::all() {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), *preset);
        }
        assert_eq!("energy_stats".parse::<Preset>().unwrap(), Preset::EnergyStats);
        assert!("bogus".parse::<Preset>().is_err());
    }

    #[test]
    fn test_printer_preset() {
        let matcher = Preset::Printer.matcher();
        assert!(matcher.matches(&state("sensor.canon_mx920_black", json!({}))));
        assert!(matcher.matches(&state(
            "sensor.office",
            json!({"friendly_name": "Office Ink Level"})
        )));
        assert!(!matcher.matches(&state("light.kitchen", json!({}))));
    }

    #[test]
    fn test_ping_preset_excludes_updates() {
        let matcher = Preset::Ping.matcher();
        assert!(matcher.matches(&state("binary_sensor.ping_nas01", json!({}))));
        assert!(matcher.matches(&state("device_tracker.valhalla", json!({}))));
        assert!(!matcher.matches(&state("update.ping_integration", json!({}))));
        assert!(!matcher.matches(&state("sensor.temperature", json!({}))));
    }

    #[test]
    fn test_energy_preset() {
        let matcher = Preset::Energy.matcher();
        assert!(matcher.matches(&state("sensor.grid_connection_import_energy", json!({}))));
        assert!(matcher.matches(&state("sensor.heat_pump", json!({"unit_of_measurement": "W"}))));
        assert!(matcher.matches(&state("sensor.x", json!({"device_class": "voltage"}))));
        assert!(!matcher.matches(&state("sensor.humidity", json!({"unit_of_measurement": "%"}))));
    }

    #[test]
    fn test_energy_stats_preset() {
        let matcher = Preset::EnergyStats.matcher();
        assert!(matcher.matches(&state("sensor.a", json!({"unit_of_measurement": "kWh"}))));
        assert!(matcher.matches(&state("sensor.b", json!({"device_class": "energy"}))));
        assert!(!matcher.matches(&state("sensor.c", json!({"unit_of_measurement": "W"}))));
    }

    #[test]
    fn test_daily_preset_uses_entity_id_only() {
        let matcher = Preset::Daily.matcher();
        assert!(matcher.matches(&state("sensor.solar_energy_today", json!({}))));
        assert!(matcher.matches(&state("sensor.forbrug_dag", json!({}))));
        assert!(!matcher.matches(&state(
            "sensor.solar",
            json!({"friendly_name": "Solar today"})
        )));
    }
}
