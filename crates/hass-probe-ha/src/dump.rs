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
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hass_probe_core::{HistoryEntry, StateProvider, StateRecord};
use std::path::PathBuf;
use tracing::{debug, info};

/// Offline provider backed by a saved `/api/states` response
///
/// Useful for exploring a snapshot without network access. History is not
/// available from a dump.
#[derive(Debug, Clone)]
pub struct StatesDumpProvider {
    path: PathBuf,
}

impl StatesDumpProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StateProvider for StatesDumpProvider {
    async fn get_snapshot(&self) -> Result<Vec<StateRecord>> {
        debug!("📂 [DUMP] Reading states from {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read states dump: {}", self.path.display()))?;

        let states: Vec<StateRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse states dump: {}", self.path.display()))?;

        info!(
            "✅ [DUMP] Loaded {} entity states from {}",
            states.len(),
            self.path.display()
        );
        Ok(states)
    }

    async fn get_history(
        &self,
        entity_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>> {
        anyhow::bail!(
            "History for {} is not available from a states dump ({})",
            entity_id,
            self.path.display()
        )
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(&self.path).await.unwrap_or(false))
    }

    fn name(&self) -> &str {
        "StatesDump"
    }
}
