//! Initialization errors: surfaced synchronously to whoever triggers client construction.

use crate::retry::BoxError;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("invalid ingestion endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid proxy address {proxy:?}: {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("failed to connect ingestion client: {0}")]
    Connect(#[source] BoxError),

    #[error("ingestion client registry already closed")]
    Closed,
}
