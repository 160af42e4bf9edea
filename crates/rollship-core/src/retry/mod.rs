//! Retry and backoff policy.
//!
//! Error classification (transient vs. permanent) and bounded exponential
//! backoff, shared by the ingestion orchestrator and the transports.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_http_status, should_retry};
pub use error::{BoxError, DeliveryError, ErrorClass, RemoteError, Retryability};
pub use policy::{BackoffPolicy, RetryDecision, DEFAULT_MULTIPLIER, MAX_ATTEMPTS};
pub use run::{execute, execute_with_sleep, Exhausted, Succeeded};
