//! Delivery error type and the retryability capability used for classification.

use std::fmt;
use std::io;

/// Boxed cause carried by a [`DeliveryError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Optional capability: an error that knows whether retrying could ever succeed.
///
/// Transports implement this for their own error types; anything that does not
/// override `is_permanent` is treated as retry-worthy.
pub trait Retryability: std::error::Error {
    /// True when the failure cannot be fixed by retrying (bad mapping,
    /// invalid credentials, missing database or table).
    fn is_permanent(&self) -> bool {
        false
    }
}

impl Retryability for io::Error {}

/// Transient vs. permanent, the only distinction the retry loop cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Permanent,
}

/// Failure of a single delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Worth another attempt (network, throttling, local I/O, unclassified).
    #[error("transient delivery failure: {0}")]
    Transient(#[source] BoxError),
    /// Flagged non-retryable by the remote side.
    #[error("permanent delivery failure: {0}")]
    Permanent(#[source] BoxError),
}

impl DeliveryError {
    /// Wrap an error that may carry the non-retryable flag.
    pub fn from_flagged<E>(err: E) -> Self
    where
        E: Retryability + Send + Sync + 'static,
    {
        if err.is_permanent() {
            DeliveryError::Permanent(Box::new(err))
        } else {
            DeliveryError::Transient(Box::new(err))
        }
    }

    /// Wrap any error as transient.
    pub fn transient<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        DeliveryError::Transient(err.into())
    }

    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            DeliveryError::Transient(e) | DeliveryError::Permanent(e) => &**e,
        }
    }
}

impl Retryability for DeliveryError {
    fn is_permanent(&self) -> bool {
        matches!(self, DeliveryError::Permanent(_))
    }
}

impl From<io::Error> for DeliveryError {
    fn from(err: io::Error) -> Self {
        DeliveryError::from_flagged(err)
    }
}

/// Error reported by the ingestion endpoint itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// HTTP status, when the failure came from a response.
    pub status: Option<u32>,
    /// Service error code (e.g. `BadRequest_MappingReferenceWasNotFound`).
    pub code: Option<String>,
    pub message: String,
    /// Set when the service marked the failure as non-retryable.
    pub permanent: bool,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "HTTP {}: ", status)?;
        }
        if let Some(code) = &self.code {
            write!(f, "{}: ", code)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RemoteError {}

impl Retryability for RemoteError {
    fn is_permanent(&self) -> bool {
        self.permanent
    }
}
