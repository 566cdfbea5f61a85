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
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hass_probe_types::{HistoryEntry, StateRecord};

/// Source of entity snapshots and entity history
///
/// Transport, authentication and parsing failures are the provider's
/// concern; callers receive already-parsed collections.
#[async_trait]
pub trait StateProvider: Send + Sync {
    /// Current state of every known entity
    async fn get_snapshot(&self) -> Result<Vec<StateRecord>>;

    /// Current state of one entity, `None` if the provider does not know it
    async fn get_state(&self, entity_id: &str) -> Result<Option<StateRecord>> {
        Ok(self
            .get_snapshot()
            .await?
            .into_iter()
            .find(|state| state.entity_id == entity_id))
    }

    /// Observations of one entity within `[start, end)`, oldest first
    ///
    /// Returns an empty vector when the entity has no recorded history in range.
    async fn get_history(
        &self,
        entity_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
