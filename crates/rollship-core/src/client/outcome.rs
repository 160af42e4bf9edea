//! Per-file ingestion status reported by the endpoint. Informational only.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionState {
    /// Accepted and queued for batching on the service side.
    Queued,
    Pending,
    Succeeded,
    PartiallySucceeded,
    Failed,
    Skipped,
}

impl fmt::Display for IngestionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IngestionState::Queued => "Queued",
            IngestionState::Pending => "Pending",
            IngestionState::Succeeded => "Succeeded",
            IngestionState::PartiallySucceeded => "PartiallySucceeded",
            IngestionState::Failed => "Failed",
            IngestionState::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionStatus {
    pub status: IngestionState,
    pub failure_status: Option<String>,
    pub error_code: Option<String>,
}

impl IngestionStatus {
    pub fn new(status: IngestionState) -> Self {
        Self {
            status,
            failure_status: None,
            error_code: None,
        }
    }
}

/// Status collection for one delivered file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub statuses: Vec<IngestionStatus>,
}

impl DeliveryOutcome {
    pub fn single(status: IngestionStatus) -> Self {
        Self {
            statuses: vec![status],
        }
    }

    /// Log each status record for `path`.
    pub fn log(&self, path: &Path) {
        if self.statuses.is_empty() {
            tracing::info!(path = %path.display(), "delivered (no status reported)");
        }
        for s in &self.statuses {
            tracing::info!(
                path = %path.display(),
                status = %s.status,
                failure_status = s.failure_status.as_deref().unwrap_or("-"),
                error_code = s.error_code.as_deref().unwrap_or("-"),
                "ingestion status"
            );
        }
    }
}
