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
use hass_probe_core::{DayBoundary, EnergyUnit, GapPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "hass-probe.toml";

/// Longest history window accepted from config or the command line (about ten years)
pub const MAX_HISTORY_DAYS: u32 = 3650;

/// Application configuration, loaded once at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Home Assistant connection
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,

    /// Energy counter used by `daily`, `history` and `intraday`
    #[serde(default)]
    pub energy: EnergyConfig,

    /// System configuration
    #[serde(default)]
    pub system: SystemConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    /// Home Assistant base URL, e.g. "http://homeassistant.local:8123"
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Long-lived access token. Only needed for commands that talk to HA.
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Accumulating energy counter entity
    #[serde(default = "default_energy_entity")]
    pub entity: String,

    /// Number of whole days fetched before today
    #[serde(default = "default_history_days")]
    pub history_days: u32,

    /// Unit of the counter. Detected from `unit_of_measurement` when unset.
    #[serde(default)]
    pub source_unit: Option<EnergyUnit>,

    /// How days without readings affect deltas (skip, carry-forward)
    #[serde(default)]
    pub gap_policy: GapPolicy,

    /// IANA zone whose midnight separates days. UTC when unset.
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    "http://localhost:8123".to_owned()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_energy_entity() -> String {
    "sensor.grid_connection_import_energy".to_owned()
}

fn default_history_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "warn".to_owned()
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            entity: default_energy_entity(),
            history_days: default_history_days(),
            source_unit: None,
            gap_policy: GapPolicy::default(),
            timezone: None,
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or `hass-probe.toml`, or defaults,
    /// then apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Override connection and entity settings from environment variables
    ///
    /// `HA_*` variables win over the `HASS_*` spellings. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(url) = var(&["HA_BASE_URL", "HASS_URL"]) {
            self.home_assistant.base_url = url;
        }
        if let Some(token) = var(&["HA_TOKEN", "HASS_TOKEN"]) {
            self.home_assistant.token = Some(token);
        }
        if let Some(entity) = var(&["ENERGY_ENTITY"]) {
            self.energy.entity = entity;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let base_url = &self.home_assistant.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            anyhow::bail!(
                "home_assistant.base_url must start with http:// or https://, got '{base_url}'"
            );
        }

        if self.home_assistant.timeout_secs == 0 {
            anyhow::bail!("home_assistant.timeout_secs must be at least 1 second");
        }

        if !(1..=MAX_HISTORY_DAYS).contains(&self.energy.history_days) {
            anyhow::bail!(
                "energy.history_days must be between 1 and {}, got {}",
                MAX_HISTORY_DAYS,
                self.energy.history_days
            );
        }

        match self.energy.entity.split_once('.') {
            Some((domain, object_id)) if !domain.is_empty() && !object_id.is_empty() => {}
            _ => anyhow::bail!(
                "energy.entity must look like 'sensor.name', got '{}'",
                self.energy.entity
            ),
        }

        self.day_boundary()?;

        let level = self.system.log_level.to_lowercase();
        if !matches!(
            level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        ) {
            anyhow::bail!(
                "system.log_level must be one of trace, debug, info, warn, error, off; got '{}'",
                self.system.log_level
            );
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.home_assistant.timeout_secs)
    }

    /// Day boundary from `energy.timezone`
    pub fn day_boundary(&self) -> Result<DayBoundary> {
        self.energy
            .timezone
            .as_deref()
            .map(str::parse::<DayBoundary>)
            .transpose()
            .context("Invalid energy.timezone")
            .map(Option::unwrap_or_default)
    }

    /// Save configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.home_assistant.base_url, "http://localhost:8123");
        assert!(config.home_assistant.token.is_none());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.energy.entity, "sensor.grid_connection_import_energy");
        assert_eq!(config.energy.history_days, 7);
        assert_eq!(config.energy.gap_policy, GapPolicy::Skip);
        assert_eq!(config.day_boundary().unwrap(), DayBoundary::Utc);
        assert_eq!(config.system.log_level, "warn");

        // Validation should pass on default
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [home_assistant]
            base_url = "http://10.0.0.5:8123"

            [energy]
            gap_policy = "carry-forward"
            source_unit = "kWh"
            timezone = "Europe/Prague"
            "#,
        )
        .unwrap();

        assert_eq!(config.home_assistant.base_url, "http://10.0.0.5:8123");
        assert_eq!(config.home_assistant.timeout_secs, 10);
        assert_eq!(config.energy.gap_policy, GapPolicy::CarryForward);
        assert_eq!(config.energy.source_unit, Some(EnergyUnit::KilowattHours));
        assert_eq!(config.energy.history_days, 7);
        assert_eq!(config.day_boundary().unwrap().to_string(), "Europe/Prague");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        let vars = env(&[
            ("HASS_URL", "http://hass:8123"),
            ("HA_TOKEN", "abc"),
            ("HASS_TOKEN", "ignored"),
            ("ENERGY_ENTITY", "sensor.house_energy"),
        ]);
        config.apply_env_overrides(|key| vars.get(key).cloned());

        assert_eq!(config.home_assistant.base_url, "http://hass:8123");
        assert_eq!(config.home_assistant.token.as_deref(), Some("abc"));
        assert_eq!(config.energy.entity, "sensor.house_energy");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = AppConfig::default();
        let vars = env(&[("HA_TOKEN", "  "), ("HASS_TOKEN", "fallback")]);
        config.apply_env_overrides(|key| vars.get(key).cloned());

        assert_eq!(config.home_assistant.token.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.home_assistant.base_url = "homeassistant.local".to_owned();
        assert!(config.validate().unwrap_err().to_string().contains("base_url"));

        let mut config = AppConfig::default();
        config.home_assistant.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.energy.history_days = 0;
        assert!(
            config
                .validate()
                .unwrap_err()
                .to_string()
                .contains("history_days")
        );

        let mut config = AppConfig::default();
        config.energy.history_days = MAX_HISTORY_DAYS;
        assert!(config.validate().is_ok());
        config.energy.history_days = MAX_HISTORY_DAYS + 1;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.energy.entity = "grid_energy".to_owned();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.energy.timezone = Some("Nowhere/Special".to_owned());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.system.log_level = "loud".to_owned();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.toml");
        std::fs::write(
            &path,
            "[energy]\nentity = \"sensor.meter\"\nhistory_days = 3\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.energy.entity, "sensor.meter");
        assert_eq!(config.energy.history_days, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");

        let mut config = AppConfig::default();
        config.energy.gap_policy = GapPolicy::CarryForward;
        config.energy.source_unit = Some(EnergyUnit::WattHours);
        config.save(&path).unwrap();

        let reloaded = AppConfig::from_file(&path).unwrap();
        assert_eq!(reloaded.energy.gap_policy, GapPolicy::CarryForward);
        assert_eq!(reloaded.energy.source_unit, Some(EnergyUnit::WattHours));
    }
}
