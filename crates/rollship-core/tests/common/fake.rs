//! Scripted in-process ingestor for pipeline scenarios.

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rollship_core::client::{
    Connector, DeliveryOutcome, IngestionState, IngestionStatus, Ingestor, InitError, StreamSource,
};
use rollship_core::retry::{DeliveryError, RemoteError};
use rollship_core::IngestionDestination;

#[derive(Debug, Clone, Copy)]
pub enum Step {
    Accept,
    Transient,
    Permanent,
}

/// Shared view of what the fake saw.
#[derive(Debug, Default)]
pub struct Calls {
    pub attempts: AtomicUsize,
    pub connects: AtomicUsize,
    pub bodies: Mutex<Vec<Vec<u8>>>,
}

pub struct FakeConnector {
    script: Vec<Step>,
    pub calls: Arc<Calls>,
}

impl FakeConnector {
    /// Every delivery follows `script`, one step per attempt; `Transient` once exhausted.
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.calls.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    fn connect(&self, _: &IngestionDestination) -> Result<Box<dyn Ingestor>, InitError> {
        self.calls.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeIngestor {
            script: self.script.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

struct FakeIngestor {
    script: Vec<Step>,
    calls: Arc<Calls>,
}

impl Ingestor for FakeIngestor {
    fn ingest(
        &self,
        source: StreamSource<'_>,
        _: &IngestionDestination,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let n = self.calls.attempts.fetch_add(1, Ordering::SeqCst);
        match self.script.get(n).copied().unwrap_or(Step::Transient) {
            Step::Accept => {
                let mut body = Vec::new();
                source.reader.read_to_end(&mut body)?;
                self.calls.bodies.lock().unwrap().push(body);
                Ok(DeliveryOutcome::single(IngestionStatus::new(IngestionState::Queued)))
            }
            Step::Transient => Err(DeliveryError::transient("service unavailable")),
            Step::Permanent => Err(DeliveryError::from_flagged(RemoteError {
                status: Some(403),
                code: Some("Forbidden".to_string()),
                message: "principal is not authorized".to_string(),
                permanent: true,
            })),
        }
    }
}
