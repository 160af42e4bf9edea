//! Ingestion client: one authenticated connection plus one destination.
//!
//! The remote SDK is modelled by two traits. [`Connector`] is the opaque,
//! authenticated-client factory; calling it is the expensive initialization
//! the registry runs once per process. [`Ingestor`] is the connection it
//! returns. [`IngestionClient`] pairs an ingestor with its destination and
//! turns a file path into a delivery.

mod error;
pub mod http;
mod outcome;

pub use error::InitError;
pub use outcome::{DeliveryOutcome, IngestionState, IngestionStatus};

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::destination::IngestionDestination;
use crate::retry::{BoxError, DeliveryError};

/// Body of one delivery: a reader plus its length when known.
pub struct StreamSource<'a> {
    pub reader: &'a mut (dyn Read + Send),
    pub len: Option<u64>,
}

/// Connection to the ingestion endpoint. Shared by every concurrent delivery.
pub trait Ingestor: Send + Sync {
    fn ingest(
        &self,
        source: StreamSource<'_>,
        destination: &IngestionDestination,
    ) -> Result<DeliveryOutcome, DeliveryError>;

    /// Release the connection.
    fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Authenticated-client factory: resolves credentials and establishes the connection.
pub trait Connector: Send + Sync {
    fn connect(&self, destination: &IngestionDestination) -> Result<Box<dyn Ingestor>, InitError>;
}

#[derive(Debug, thiserror::Error)]
#[error("ingestion client is closed")]
pub struct ClientClosed;

impl crate::retry::Retryability for ClientClosed {}

pub struct IngestionClient {
    ingestor: Box<dyn Ingestor>,
    destination: IngestionDestination,
    closed: AtomicBool,
}

impl std::fmt::Debug for IngestionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionClient")
            .field("destination", &self.destination)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl IngestionClient {
    /// Run the connector and take ownership of `destination`.
    pub fn connect(
        connector: &dyn Connector,
        destination: IngestionDestination,
    ) -> Result<Self, InitError> {
        let ingestor = connector.connect(&destination)?;
        tracing::info!(
            database = destination.database(),
            table = destination.table(),
            mapping = destination.mapping().map(|m| m.name.as_str()).unwrap_or("-"),
            "ingesting rotated files to {}.{}",
            destination.database(),
            destination.table()
        );
        Ok(Self {
            ingestor,
            destination,
            closed: AtomicBool::new(false),
        })
    }

    pub fn destination(&self) -> &IngestionDestination {
        &self.destination
    }

    /// Stream the file at `path` to the destination. Blocking.
    ///
    /// Failing to open or stat the file is a transient error.
    pub fn deliver(&self, path: &Path) -> Result<DeliveryOutcome, DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::from_flagged(ClientClosed));
        }
        let mut file = File::open(path)?;
        let len = file.metadata().ok().map(|m| m.len());
        self.ingestor.ingest(
            StreamSource {
                reader: &mut file,
                len,
            },
            &self.destination,
        )
    }

    /// Release the connection. Later calls are no-ops.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        match self.ingestor.close() {
            Ok(()) => tracing::debug!("ingestion client closed"),
            Err(e) => tracing::warn!(error = %e, "closing ingestion client caused an error"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
