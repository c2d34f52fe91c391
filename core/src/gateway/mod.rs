//! Backend access for panel data and the field catalog.
//!
//! The orchestrator only sees the [`FetchGateway`] trait; [`HttpGateway`] is the
//! production implementation talking JSON to the query server.

mod http;
mod request;

use std::future::Future;

use dashboard_types::{CatalogField, FlatRow, KvOption, QuerySnapshot, TrendPoint};

pub use http::HttpGateway;
pub use request::{TableRequest, TrendRequest};

/// Errors from a backend call.
///
/// The orchestrator does not distinguish between them; the `Display` text is
/// what ends up on the failed panel.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{method} {endpoint} failed ({status}): {message}")]
    Status {
        method: &'static str,
        endpoint: String,
        status: u16,
        message: String,
    },
    #[error("{method} {endpoint} failed: {source}")]
    Transport {
        method: &'static str,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned an unreadable payload: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Per-field data fetches used by the orchestrator.
///
/// Futures are not required to be `Send`; the driver runs them on a local
/// task set.
pub trait FetchGateway {
    /// Day-over-day comparison rows grouped by `field`
    fn fetch_table(
        &self,
        snapshot: &QuerySnapshot,
        field: &str,
    ) -> impl Future<Output = Result<Vec<FlatRow>, GatewayError>>;

    /// Date x category trend points split by `field`
    fn fetch_chart(
        &self,
        snapshot: &QuerySnapshot,
        field: &str,
    ) -> impl Future<Output = Result<Vec<TrendPoint>, GatewayError>>;
}

/// Catalog lookups made once on startup.
pub trait CatalogSource {
    fn catalog_fields(&self) -> impl Future<Output = Result<Vec<CatalogField>, GatewayError>>;

    /// Every categorical value as `{key: field, value}`
    fn filter_options(&self) -> impl Future<Output = Result<Vec<KvOption>, GatewayError>>;
}
