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

use crate::errors::{HaError, HaResult};
use crate::types::HaHistoryState;
use chrono::{DateTime, SecondsFormat, Utc};
use hass_probe_core::StateRecord;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only Home Assistant REST API client
///
/// Requests are issued once; failures surface to the caller unchanged.
#[derive(Clone)]
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    client: Client,
}

impl fmt::Debug for HomeAssistantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl HomeAssistantClient {
    /// Create a new HA client with the default request timeout
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> HaResult<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    /// Create a new HA client with a custom request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> HaResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(HaError::ConfigError("HA token is empty".to_owned()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HaError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
            client,
        })
    }

    /// Create HA client using Supervisor API environment variables
    /// This is the standard method when running as an HA addon
    pub fn from_supervisor() -> HaResult<Self> {
        let token = std::env::var("SUPERVISOR_TOKEN").map_err(|_| {
            HaError::ConfigError(
                "SUPERVISOR_TOKEN environment variable not set. Are you running as an HA addon?"
                    .to_owned(),
            )
        })?;

        info!("Initializing HA client using Supervisor API");
        Self::new("http://supervisor/core", token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the state of a specific entity
    pub async fn get_state(&self, entity_id: &str) -> HaResult<StateRecord> {
        let url = format!("{}/api/states/{}", self.base_url, entity_id);
        debug!("🔍 [HA QUERY] Getting state for entity: {}", entity_id);
        debug!("   URL: {}", url);

        let response = self.get(&url).await?;
        match response.status() {
            StatusCode::OK => {
                let state: StateRecord = read_json(response).await?;
                debug!("✅ [HA RESULT] Entity: {} = '{}'", entity_id, state.state);
                trace!("   Attributes: {:?}", state.attributes);
                Ok(state)
            }
            StatusCode::NOT_FOUND => {
                debug!("[HA QUERY] Entity not found: {}", entity_id);
                Err(HaError::EntityNotFound(entity_id.to_owned()))
            }
            status => Err(status_error(status, response, entity_id).await),
        }
    }

    /// Get all states
    pub async fn get_all_states(&self) -> HaResult<Vec<StateRecord>> {
        let url = format!("{}/api/states", self.base_url);
        debug!("📋 [HA SNAPSHOT] Fetching all entity states");

        let response = self.get(&url).await?;
        match response.status() {
            StatusCode::OK => {
                let states: Vec<StateRecord> = read_json(response).await?;
                info!("✅ [HA SNAPSHOT] Retrieved {} entity states", states.len());
                Ok(states)
            }
            status => Err(status_error(status, response, "states").await),
        }
    }

    /// Get raw historical states for one entity
    ///
    /// # Arguments
    /// * `entity_id` - Entity ID to fetch history for (e.g., "sensor.grid_connection_import_energy")
    /// * `start_time` - Start of the time range
    /// * `end_time` - End of the time range
    ///
    /// # Returns
    /// History points exactly as HA reports them, oldest first. An entity
    /// without recorded history yields an empty vector.
    pub async fn get_history(
        &self,
        entity_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> HaResult<Vec<HaHistoryState>> {
        // Format: /api/history/period/{start}?filter_entity_id={entity}&end_time={end}
        let start_str = start_time.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end_str = end_time.to_rfc3339_opts(SecondsFormat::Secs, true);

        let url = format!(
            "{}/api/history/period/{}?filter_entity_id={}&end_time={}",
            self.base_url,
            start_str,
            urlencoding::encode(entity_id),
            urlencoding::encode(&end_str)
        );

        debug!("📊 [HA HISTORY] Fetching history for: {}", entity_id);
        debug!("   Time range: {} to {}", start_str, end_str);
        debug!("   URL: {}", url);

        let response = self.get(&url).await?;
        match response.status() {
            StatusCode::OK => {
                // HA returns an array of arrays, one inner array per entity
                let history: Vec<Vec<HaHistoryState>> = read_json(response).await?;

                let Some(entity_history) = history.into_iter().next() else {
                    debug!("⚠️ [HA HISTORY] No history data returned for {}", entity_id);
                    return Ok(Vec::new());
                };

                if let Some(reported) = entity_history.first().and_then(|p| p.entity_id.as_deref())
                    && !reported.eq_ignore_ascii_case(entity_id)
                {
                    error!(
                        "❌ [HA HISTORY] Asked for {} but HA returned {}",
                        entity_id, reported
                    );
                    return Err(HaError::InvalidResponse(format!(
                        "history for {entity_id} returned entity {reported}"
                    )));
                }

                info!(
                    "✅ [HA HISTORY] Retrieved {} points for {}",
                    entity_history.len(),
                    entity_id
                );
                Ok(entity_history)
            }
            StatusCode::NOT_FOUND => {
                error!("❌ [HA HISTORY] Entity not found: {}", entity_id);
                Err(HaError::EntityNotFound(entity_id.to_owned()))
            }
            status => Err(status_error(status, response, entity_id).await),
        }
    }

    /// Health check - ping HA API
    pub async fn ping(&self) -> HaResult<bool> {
        let url = format!("{}/api/", self.base_url);
        debug!("Performing health check");

        match self.get(&url).await {
            Ok(response) => {
                let is_ok = response.status().is_success();
                if is_ok {
                    debug!("Health check passed");
                } else {
                    warn!("Health check failed: status {}", response.status());
                }
                Ok(is_ok)
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn get(&self, url: &str) -> HaResult<Response> {
        Ok(self.client.get(url).bearer_auth(&self.token).send().await?)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> HaResult<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

async fn status_error(status: StatusCode, response: Response, subject: &str) -> HaError {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        error!("❌ [HA ERROR] Authentication failed for: {}", subject);
        return HaError::AuthenticationFailed;
    }

    let message = response.text().await.unwrap_or_default();
    error!("❌ [HA ERROR] Status {} for {}: {}", status, subject, message);
    HaError::ApiError {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn state_json(entity_id: &str, state: &str) -> serde_json::Value {
        json!({
            "entity_id": entity_id,
            "state": state,
            "attributes": {},
            "last_changed": "2025-10-02T10:00:00Z",
            "last_updated": "2025-10-02T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_get_state_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.test_entity")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(state_json("sensor.test_entity", "42.5").to_string())
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let state = client.get_state("sensor.test_entity").await.unwrap();

        assert_eq!(state.entity_id, "sensor.test_entity");
        assert_eq!(state.state, "42.5");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_state_not_found() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states/sensor.nonexistent")
            .match_header("authorization", "Bearer test_token")
            .with_status(404)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.get_state("sensor.nonexistent").await;

        assert!(matches!(result, Err(HaError::EntityNotFound(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_all_states() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_body(
                json!([
                    state_json("sensor.test1", "42"),
                    {
                        "entity_id": "light.kitchen",
                        "state": "on",
                        "attributes": null,
                        "last_changed": "2025-10-02T10:00:00Z",
                        "last_updated": "2025-10-02T10:00:00Z"
                    }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let states = client.get_all_states().await.unwrap();

        assert_eq!(states.len(), 2);
        assert_eq!(states[0].state, "42");
        assert!(states[1].attributes.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_all_states_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states")
            .with_status(401)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "bad_token").unwrap();
        let result = client.get_all_states().await;

        assert!(matches!(result, Err(HaError::AuthenticationFailed)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_keeps_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/states")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.get_all_states().await;

        match result {
            Err(HaError::ApiError { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_json_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/states")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client.get_all_states().await;
        assert!(matches!(result, Err(HaError::JsonError(_))));
    }

    #[tokio::test]
    async fn test_get_history_request_and_parse() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/history/period/2024-01-01T00:00:00Z")
            .match_header("authorization", "Bearer test_token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "filter_entity_id".into(),
                    "sensor.grid_connection_import_energy".into(),
                ),
                Matcher::UrlEncoded("end_time".into(), "2024-01-03T00:00:00Z".into()),
            ]))
            .with_status(200)
            .with_body(
                json!([[
                    {
                        "entity_id": "sensor.grid_connection_import_energy",
                        "state": "1000",
                        "attributes": {"unit_of_measurement": "Wh"},
                        "last_changed": "2024-01-01T00:00:00+00:00",
                        "last_updated": "2024-01-01T00:00:00+00:00"
                    },
                    {"state": "unavailable", "last_changed": "2024-01-01T05:00:00+00:00"},
                    {"state": "2500", "last_updated": "2024-01-02T12:00:00+00:00"}
                ]])
                .to_string(),
            )
            .create_async()
            .await;

        let client = HomeAssistantClient::new(format!("{}/", server.url()), "test_token").unwrap();
        let history = client
            .get_history(
                "sensor.grid_connection_import_energy",
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(history.len(), 3);
        assert_eq!(history[0].state, "1000");
        assert_eq!(history[1].state, "unavailable");
        assert!(history[2].last_changed.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_history_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/history/period/.*".to_owned()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let history = client
            .get_history(
                "sensor.nothing",
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_get_history_wrong_entity_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/api/history/period/.*".to_owned()))
            .with_status(200)
            .with_body(
                json!([[{
                    "entity_id": "sensor.other",
                    "state": "1",
                    "last_changed": "2024-01-01T00:00:00+00:00"
                }]])
                .to_string(),
            )
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        let result = client
            .get_history(
                "sensor.wanted",
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            )
            .await;

        assert!(matches!(result, Err(HaError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_ping_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .create_async()
            .await;

        let client = HomeAssistantClient::new(server.url(), "test_token").unwrap();
        assert!(client.ping().await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ping_unreachable_is_false() {
        // Nothing listens on port 9 (discard) in the test environment
        let client = HomeAssistantClient::with_timeout(
            "http://127.0.0.1:9",
            "test_token",
            Duration::from_millis(200),
        )
        .unwrap();
        assert!(!client.ping().await.unwrap());
    }

    #[test]
    fn test_empty_token_rejected() {
        let result = HomeAssistantClient::new("http://localhost:8123", "  ");
        assert!(matches!(result, Err(HaError::ConfigError(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HomeAssistantClient::new("http://ha.local:8123/", "token").unwrap();
        assert_eq!(client.base_url(), "http://ha.local:8123");
    }
}
