//! Process-wide holder of the single ingestion client.
//!
//! An explicit object rather than a static: the rotation hook creates one,
//! shares it through an `Arc`, and tests build their own with a fake
//! connector. Construction is lazy (the destination is only known once
//! configuration is parsed) and happens at most once per successful init.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::client::{Connector, IngestionClient, InitError};
use crate::destination::IngestionDestination;

#[derive(Debug, Default)]
pub struct ClientRegistry {
    slot: RwLock<Slot>,
    /// Serializes construction so the connector runs once even under a first-call race.
    init: Mutex<()>,
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Ready(Arc<IngestionClient>),
    Closed,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the client, creating it from `destination` via `connector` on first call.
    ///
    /// Later calls ignore both arguments. A failed construction leaves the
    /// registry empty so a later call can try again. Fails with
    /// [`InitError::Closed`] after [`close`](Self::close).
    pub fn get_or_init(
        &self,
        destination: &IngestionDestination,
        connector: &dyn Connector,
    ) -> Result<Arc<IngestionClient>, InitError> {
        if let Some(client) = self.lookup()? {
            return Ok(client);
        }
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = self.lookup()? {
            return Ok(client);
        }
        let client = match IngestionClient::connect(connector, destination.clone()) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                tracing::error!(error = %e, "could not initialize ingestion client");
                return Err(e);
            }
        };
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let closed_meanwhile = matches!(*slot, Slot::Closed);
        if closed_meanwhile {
            // close() ran while the connector was working.
            drop(slot);
            client.close();
            return Err(InitError::Closed);
        }
        *slot = Slot::Ready(Arc::clone(&client));
        Ok(client)
    }

    /// The existing client, or `None` if never initialized (or closed).
    pub fn get(&self) -> Option<Arc<IngestionClient>> {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Ready(client) => Some(Arc::clone(client)),
            Slot::Empty | Slot::Closed => None,
        }
    }

    /// Close the client, if any. Safe to call repeatedly or before init.
    pub fn close(&self) {
        let previous = std::mem::replace(
            &mut *self.slot.write().unwrap_or_else(PoisonError::into_inner),
            Slot::Closed,
        );
        match previous {
            Slot::Ready(client) => client.close(),
            Slot::Empty => tracing::debug!("close requested but no ingestion client was initialized"),
            Slot::Closed => {}
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            *self.slot.read().unwrap_or_else(PoisonError::into_inner),
            Slot::Closed
        )
    }

    fn lookup(&self) -> Result<Option<Arc<IngestionClient>>, InitError> {
        match &*self.slot.read().unwrap_or_else(PoisonError::into_inner) {
            Slot::Ready(client) => Ok(Some(Arc::clone(client))),
            Slot::Empty => Ok(None),
            Slot::Closed => Err(InitError::Closed),
        }
    }
}
