//! HTTP client for the Connected Cars GraphQL API.

use crate::query::{parse_response, FULL_QUERY};
use async_trait::async_trait;
use cc2mqtt_core::{FetchError, SnapshotFetcher, VehicleSnapshot};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Default GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://api.connectedcars.io/graphql";

/// Default organization namespace.
pub const DEFAULT_NAMESPACE: &str = "semler:minskoda";

/// Connected Cars client configuration.
#[derive(Debug, Clone)]
pub struct ConnectedCarsConfig {
    /// GraphQL endpoint URL
    pub api_url: String,
    /// Organization namespace sent with every request
    pub namespace: String,
    /// Access token for the account
    pub access_token: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ConnectedCarsConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            access_token: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Snapshot fetcher backed by the Connected Cars API.
pub struct ConnectedCarsClient {
    client: Client,
    config: ConnectedCarsConfig,
}

impl ConnectedCarsClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is incomplete or the HTTP client
    /// cannot be created.
    pub fn new(config: ConnectedCarsConfig) -> Result<Self, ClientError> {
        if config.access_token.is_empty() {
            return Err(ClientError::Init("access token is empty".to_string()));
        }
        if !config.api_url.starts_with("https://") && !config.api_url.starts_with("http://") {
            return Err(ClientError::Init(format!(
                "unsupported API URL: {}",
                config.api_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| ClientError::Init(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Run a GraphQL query and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns error on network errors or a non-success status.
    pub async fn query(&self, query: &str) -> Result<Value, FetchError> {
        tracing::debug!(url = %self.config.api_url, namespace = %self.config.namespace, "POST GraphQL query");

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.access_token))
            .header("x-organization-namespace", &self.config.namespace)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SnapshotFetcher for ConnectedCarsClient {
    async fn fetch_full(&self) -> Result<VehicleSnapshot, FetchError> {
        let body = self.query(FULL_QUERY).await?;
        let snapshot = parse_response(&body)?;
        tracing::debug!(
            license_plate = %snapshot.license_plate,
            ignition_on = snapshot.ignition.on,
            has_position = snapshot.position.is_some(),
            "Fetched vehicle snapshot"
        );
        Ok(snapshot)
    }
}

/// Errors that can occur when building the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Client initialization failed
    #[error("client init error: {0}")]
    Init(String),
}
