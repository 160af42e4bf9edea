//! Ingestion task orchestration: retry, classify, and fall back to backout.
//!
//! Each submitted file moves `Pending -> Attempting -> {Delivered | Relocated}`.
//! Failures never escape `submit`: the rotation that produced the file must
//! complete whatever happens to the upload.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::backout::{BackoutRelocator, RelocationError};
use crate::client::DeliveryOutcome;
use crate::registry::ClientRegistry;
use crate::retry::{self, BackoffPolicy, DeliveryError, ErrorClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Attempting,
    Delivered,
    Relocated,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Attempting => "attempting",
            TaskState::Delivered => "delivered",
            TaskState::Relocated => "relocated",
        };
        f.write_str(s)
    }
}

/// Why a file ended up relocated.
#[derive(Debug)]
pub enum RelocationCause {
    /// The endpoint flagged the failure as non-retryable.
    Permanent(DeliveryError),
    /// Transient failures used up every attempt.
    Exhausted(DeliveryError),
    /// No ingestion client has been initialized (or it was closed).
    NoClient,
}

impl fmt::Display for RelocationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocationCause::Permanent(e) => write!(f, "permanent failure: {}", e),
            RelocationCause::Exhausted(e) => write!(f, "retries exhausted: {}", e),
            RelocationCause::NoClient => f.write_str("no ingestion client"),
        }
    }
}

/// Terminal result of one submitted file.
#[derive(Debug)]
pub enum TaskReport {
    Delivered {
        path: PathBuf,
        attempts: u32,
        outcome: DeliveryOutcome,
    },
    Relocated {
        path: PathBuf,
        attempts: u32,
        cause: RelocationCause,
        /// Where the file went, or why it stayed at `path`.
        backout: Result<PathBuf, RelocationError>,
    },
}

impl TaskReport {
    pub fn state(&self) -> TaskState {
        match self {
            TaskReport::Delivered { .. } => TaskState::Delivered,
            TaskReport::Relocated { .. } => TaskState::Relocated,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            TaskReport::Delivered { path, .. } | TaskReport::Relocated { path, .. } => path,
        }
    }

    /// Delivery attempts made (0 when no client was available).
    pub fn attempts(&self) -> u32 {
        match self {
            TaskReport::Delivered { attempts, .. } | TaskReport::Relocated { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.state() == TaskState::Delivered
    }
}

impl fmt::Display for TaskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskReport::Delivered { path, attempts, .. } => {
                write!(f, "{}: delivered after {} attempt(s)", path.display(), attempts)
            }
            TaskReport::Relocated {
                path,
                cause,
                backout: Ok(target),
                ..
            } => write!(f, "{}: {}; moved to {}", path.display(), cause, target.display()),
            TaskReport::Relocated {
                path,
                cause,
                backout: Err(e),
                ..
            } => write!(f, "{}: {}; backout failed ({})", path.display(), cause, e),
        }
    }
}

pub struct IngestionOrchestrator {
    registry: Arc<ClientRegistry>,
    policy: BackoffPolicy,
    relocator: BackoutRelocator,
    sleep: fn(Duration),
}

impl IngestionOrchestrator {
    pub fn new(registry: Arc<ClientRegistry>, policy: BackoffPolicy) -> Self {
        Self {
            registry,
            policy,
            relocator: BackoutRelocator::new(),
            sleep: std::thread::sleep,
        }
    }

    /// Replace the sleep between attempts (tests record delays instead of waiting).
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Deliver `path`, retrying transient failures; back it out if delivery fails.
    ///
    /// Blocks until a terminal state is reached and never fails.
    pub fn submit(&self, path: &Path) -> TaskReport {
        tracing::debug!(path = %path.display(), state = %TaskState::Pending, "ingestion task submitted");
        let Some(client) = self.registry.get() else {
            tracing::error!(path = %path.display(), "no ingestion client available");
            return self.relocate(path, 0, RelocationCause::NoClient);
        };

        tracing::debug!(path = %path.display(), state = %TaskState::Attempting, "starting delivery");
        let result = retry::execute_with_sleep(
            &self.policy,
            |attempt| {
                tracing::debug!(path = %path.display(), attempt, "delivery attempt");
                client.deliver(path)
            },
            |err| match retry::classify(err) {
                ErrorClass::Transient => {
                    tracing::debug!(path = %path.display(), error = %err, "classified transient");
                    true
                }
                ErrorClass::Permanent => {
                    tracing::warn!(path = %path.display(), error = %err, "classified permanent, not retrying");
                    false
                }
            },
            self.sleep,
        );

        match result {
            Ok(done) => {
                done.value.log(path);
                tracing::info!(
                    path = %path.display(),
                    attempts = done.attempts,
                    state = %TaskState::Delivered,
                    "rotated file delivered"
                );
                TaskReport::Delivered {
                    path: path.to_path_buf(),
                    attempts: done.attempts,
                    outcome: done.value,
                }
            }
            Err(exhausted) => {
                let cause = match retry::classify(&exhausted.last_error) {
                    ErrorClass::Permanent => RelocationCause::Permanent(exhausted.last_error),
                    ErrorClass::Transient => RelocationCause::Exhausted(exhausted.last_error),
                };
                tracing::warn!(
                    path = %path.display(),
                    attempts = exhausted.attempts,
                    cause = %cause,
                    "ingestion failed, backing out file"
                );
                self.relocate(path, exhausted.attempts, cause)
            }
        }
    }

    fn relocate(&self, path: &Path, attempts: u32, cause: RelocationCause) -> TaskReport {
        let backout = self.relocator.relocate(path);
        if let Err(e) = &backout {
            let target = crate::backout::backout_path(path)
                .unwrap_or_else(|_| crate::backout::backout_dir(path));
            tracing::error!(
                path = %path.display(),
                target = %target.display(),
                error = %e,
                "backout failed; file left at its rotated path"
            );
        }
        TaskReport::Relocated {
            path: path.to_path_buf(),
            attempts,
            cause,
            backout,
        }
    }

    /// Release the shared client. Tolerates a never-initialized registry.
    pub fn shutdown(&self) {
        self.registry.close();
    }
}
