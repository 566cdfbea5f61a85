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
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::HomeAssistantClient;
use crate::errors::HaError;
use hass_probe_core::{HistoryEntry, StateProvider, StateRecord};

/// Home Assistant adapter implementing `StateProvider` over the REST API
#[derive(Debug, Clone)]
pub struct HaStateProvider {
    client: Arc<HomeAssistantClient>,
}

impl HaStateProvider {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }

    /// Get reference to the underlying HA client
    pub fn client(&self) -> &Arc<HomeAssistantClient> {
        &self.client
    }
}

#[async_trait]
impl StateProvider for HaStateProvider {
    async fn get_snapshot(&self) -> Result<Vec<StateRecord>> {
        self.client
            .get_all_states()
            .await
            .context("Failed to fetch entity states from Home Assistant")
    }

    async fn get_state(&self, entity_id: &str) -> Result<Option<StateRecord>> {
        match self.client.get_state(entity_id).await {
            Ok(state) => Ok(Some(state)),
            Err(HaError::EntityNotFound(_)) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read entity: {entity_id}")),
        }
    }

    async fn get_history(
        &self,
        entity_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>> {
        let points = self
            .client
            .get_history(entity_id, start, end)
            .await
            .with_context(|| format!("Failed to fetch history for {entity_id}"))?;

        let total = points.len();
        let mut entries: Vec<HistoryEntry> = points
            .into_iter()
            .filter_map(|point| point.into_history_entry())
            .filter(|entry| entry.last_changed >= start && entry.last_changed < end)
            .collect();
        // HA already sorts, but a stable sort keeps equal timestamps in response order
        entries.sort_by_key(|entry| entry.last_changed);

        if entries.len() != total {
            debug!(
                "📊 [ADAPTER] Dropped {} of {} history points for {} (no timestamp or out of range)",
                total - entries.len(),
                total,
                entity_id
            );
        }
        info!(
            "✅ [ADAPTER] {} history entries for {}",
            entries.len(),
            entity_id
        );
        Ok(entries)
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.ping().await.context("Health check failed")
    }

    fn name(&self) -> &str {
        "HomeAssistant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};
    use serde_json::json;

    async fn provider(server: &Server) -> HaStateProvider {
        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        HaStateProvider::new(Arc::new(client))
    }

    #[test]
    fn test_debug_output_hides_token() {
        let client = HomeAssistantClient::new("http://ha.local:8123", "secret_token").unwrap();
        let provider = HaStateProvider::new(Arc::new(client));

        let printed = format!("{provider:?}");
        assert!(printed.contains("HaStateProvider"));
        assert!(printed.contains("http://ha.local:8123"));
        assert!(!printed.contains("secret_token"));
    }

    #[tokio::test]
    async fn test_history_drops_untimed_points_and_clips_window() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/history/period/.*".to_owned()))
            .with_status(200)
            .with_body(
                json!([[
                    {
                        "entity_id": "sensor.grid",
                        "state": "1000",
                        "attributes": {},
                        "last_changed": "2024-01-01T06:00:00+00:00"
                    },
                    {"state": "1200"},
                    {"state": "1500", "last_updated": "2024-01-01T22:00:00+00:00"},
                    {"state": "2000", "last_changed": "2024-01-02T00:00:00+00:00"}
                ]])
                .to_string(),
            )
            .create_async()
            .await;

        let provider = provider(&server).await;
        let history = provider
            .get_history(
                "sensor.grid",
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        let states: Vec<_> = history.iter().map(|e| e.state.as_str()).collect();
        assert_eq!(states, vec!["1000", "1500"]);
    }

    #[tokio::test]
    async fn test_get_state_maps_not_found_to_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/states/sensor.missing")
            .with_status(404)
            .create_async()
            .await;

        let provider = provider(&server).await;
        assert!(provider.get_state("sensor.missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_error_carries_context() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/states")
            .with_status(403)
            .create_async()
            .await;

        let provider = provider(&server).await;
        let err = provider.get_snapshot().await.unwrap_err();
        assert!(err.to_string().contains("Failed to fetch entity states"));
        assert!(matches!(
            err.downcast_ref::<HaError>(),
            Some(HaError::AuthenticationFailed)
        ));
    }

    #[tokio::test]
    async fn test_health_check() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/")
            .with_status(200)
            .create_async()
            .await;

        let provider = provider(&server).await;
        assert!(provider.health_check().await.unwrap());
        assert_eq!(provider.name(), "HomeAssistant");
    }
}
