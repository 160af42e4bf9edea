//! Glue for the file-rotation framework.
//!
//! The rotation engine hands us plain callbacks instead of subclass hooks:
//! [`RotationHook::on_rotated`] after a file has been renamed into its archive
//! location, and [`RotationHook::on_shutdown`] when the appender stops.
//! [`RolloverAction`] wraps the engine's own rename so that "rollover
//! complete" is only signalled after ingestion reached a terminal state.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::{Connector, InitError};
use crate::destination::IngestionDestination;
use crate::orchestrator::{IngestionOrchestrator, TaskReport};
use crate::registry::ClientRegistry;
use crate::retry::BackoffPolicy;

/// Entry points the rotation framework calls.
pub struct RotationHook {
    orchestrator: IngestionOrchestrator,
}

impl RotationHook {
    /// Build the hook and eagerly initialize the shared client.
    ///
    /// Initialization errors (bad endpoint, failed connector) are returned
    /// here so the operator sees them at startup.
    pub fn initialize(
        destination: &IngestionDestination,
        policy: BackoffPolicy,
        connector: &dyn Connector,
    ) -> Result<Self, InitError> {
        let registry = Arc::new(ClientRegistry::new());
        registry.get_or_init(destination, connector)?;
        Ok(Self::from_orchestrator(IngestionOrchestrator::new(registry, policy)))
    }

    pub fn from_orchestrator(orchestrator: IngestionOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &IngestionOrchestrator {
        &self.orchestrator
    }

    /// A file was rotated to `path`. Returns once it is delivered or backed out.
    pub fn on_rotated(&self, path: &Path) -> TaskReport {
        self.orchestrator.submit(path)
    }

    /// Appender or process shutdown.
    pub fn on_shutdown(&self) {
        self.orchestrator.shutdown();
    }
}

/// Rollover step that ships the archived file once the delegate has produced it.
pub struct RolloverAction<F> {
    delegate: Option<F>,
    archive_path: PathBuf,
    hook: Arc<RotationHook>,
    complete: AtomicBool,
}

impl<F> RolloverAction<F>
where
    F: FnOnce() -> io::Result<bool>,
{
    /// `delegate` performs the rotation (typically a rename to `archive_path`)
    /// and reports whether it produced the file.
    pub fn new(delegate: F, archive_path: impl Into<PathBuf>, hook: Arc<RotationHook>) -> Self {
        Self {
            delegate: Some(delegate),
            archive_path: archive_path.into(),
            hook,
            complete: AtomicBool::new(false),
        }
    }

    /// Run the delegate, then ingest the archived file if it was produced.
    ///
    /// Delegate I/O errors propagate; ingestion failures do not. Returns the
    /// delegate's result and the ingestion report, if ingestion ran.
    pub fn execute(&mut self) -> io::Result<(bool, Option<TaskReport>)> {
        let Some(delegate) = self.delegate.take() else {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "rollover action already executed",
            ));
        };
        let produced = delegate()?;
        let report = if produced {
            Some(self.hook.on_rotated(&self.archive_path))
        } else {
            tracing::debug!(path = %self.archive_path.display(), "rollover produced no file, nothing to ingest");
            None
        };
        self.complete.store(true, Ordering::Release);
        Ok((produced, report))
    }

    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Release the shared ingestion client.
    pub fn close(&self) {
        self.hook.on_shutdown();
    }
}
