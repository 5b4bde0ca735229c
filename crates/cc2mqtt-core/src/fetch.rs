//! Snapshot source abstraction.

use crate::snapshot::VehicleSnapshot;
use async_trait::async_trait;

/// Anything that can produce the current state of a vehicle.
///
/// Implementations own their transport, credentials and timeouts.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch a fully materialized snapshot of the first vehicle on the
    /// account.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the upstream API is unreachable, rejects
    /// the request, or answers with something that cannot be mapped.
    async fn fetch_full(&self) -> Result<VehicleSnapshot, FetchError>;
}

/// Errors that can occur while fetching a snapshot.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("request error: {0}")]
    Request(String),
    /// API returned an error status or GraphQL errors
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from API
        message: String,
    },
    /// Response parsing failed
    #[error("parse error: {0}")]
    Parse(String),
    /// The account has no vehicles
    #[error("no vehicle associated with the account")]
    NoVehicle,
}
