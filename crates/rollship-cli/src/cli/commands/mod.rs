//! CLI command handlers, one file per command.

mod completions;
mod config;
mod reprocess;
mod rotate;
mod ship;

pub use completions::{run_completions, run_man};
pub use config::run_config;
pub use reprocess::run_reprocess;
pub use rotate::run_rotate;
pub use ship::run_ship;

use std::sync::Arc;

use anyhow::Result;
use rollship_core::client::http::HttpConnector;
use rollship_core::config::ShipConfig;
use rollship_core::RotationHook;

/// Validate `cfg` and connect the shared ingestion client.
pub(crate) fn build_hook(cfg: &ShipConfig) -> Result<Arc<RotationHook>> {
    let destination = cfg.destination()?;
    let connector = HttpConnector::new(cfg.credentials());
    tracing::info!(
        endpoint = %destination.endpoint(),
        database = destination.database(),
        table = destination.table(),
        auth = cfg.credentials().auth_type(),
        "initializing ingestion client"
    );
    let hook = RotationHook::initialize(&destination, cfg.backoff(), &connector)?;
    Ok(Arc::new(hook))
}
