use std::time::Duration;

use dashboard_types::{CatalogField, FlatRow, KvOption, QuerySnapshot, TrendPoint};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::request::{TableRequest, TrendRequest};
use super::{CatalogSource, FetchGateway, GatewayError};
use crate::config::AppConfig;

const TABLE_ENDPOINT: &str = "/query/table";
const TREND_ENDPOINT: &str = "/query/trend";
const FIELDS_ENDPOINT: &str = "/catalog/fields";
const FILTER_OPTIONS_ENDPOINT: &str = "/catalog/filter-options";

/// JSON-over-HTTP client for the query server.
///
/// Data endpoints are `POST` with a JSON body, catalog endpoints are `GET`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    default_measure: String,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        default_measure: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_measure: default_measure.into(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.base_url,
            config.request_timeout(),
            config.default_measure.clone(),
        )
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, endpoint))
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                method: "GET",
                endpoint: endpoint.to_string(),
                source,
            })?;
        read_json("GET", endpoint, response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, endpoint))
            .json(body)
            .send()
            .await
            .map_err(|source| GatewayError::Transport {
                method: "POST",
                endpoint: endpoint.to_string(),
                source,
            })?;
        read_json("POST", endpoint, response).await
    }
}

/// Decode a success body, or turn a non-2xx response into [`GatewayError::Status`].
///
/// Error bodies are expected as `{"message": "..."}`; anything else falls back
/// to the status reason phrase.
async fn read_json<T: DeserializeOwned>(
    method: &'static str,
    endpoint: &str,
    response: Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|source| GatewayError::Transport {
            method,
            endpoint: endpoint.to_string(),
            source,
        })?;

    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        let message = serde_json::from_slice::<serde_json::Value>(&bytes)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| reason.to_string());
        return Err(GatewayError::Status {
            method,
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&bytes).map_err(|source| GatewayError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

impl FetchGateway for HttpGateway {
    async fn fetch_table(
        &self,
        snapshot: &QuerySnapshot,
        field: &str,
    ) -> Result<Vec<FlatRow>, GatewayError> {
        let Some(body) = TableRequest::build(snapshot, field, &self.default_measure) else {
            tracing::debug!("[GATEWAY] Skipping table for '{}': comparison dates unset", field);
            return Ok(Vec::new());
        };
        self.post(TABLE_ENDPOINT, &body).await
    }

    async fn fetch_chart(
        &self,
        snapshot: &QuerySnapshot,
        field: &str,
    ) -> Result<Vec<TrendPoint>, GatewayError> {
        let Some(body) = TrendRequest::build(snapshot, field, &self.default_measure) else {
            tracing::debug!("[GATEWAY] Skipping trend for '{}': as-of date unset", field);
            return Ok(Vec::new());
        };
        self.post(TREND_ENDPOINT, &body).await
    }
}

impl CatalogSource for HttpGateway {
    async fn catalog_fields(&self) -> Result<Vec<CatalogField>, GatewayError> {
        self.get(FIELDS_ENDPOINT).await
    }

    async fn filter_options(&self) -> Result<Vec<KvOption>, GatewayError> {
        self.get(FILTER_OPTIONS_ENDPOINT).await
    }
}
