//! `rollship ship` – deliver rotated files concurrently.

use anyhow::Result;
use rollship_core::config::ShipConfig;
use rollship_core::{RotationHook, TaskReport};
use std::path::PathBuf;
use std::sync::Arc;

use super::build_hook;

pub async fn run_ship(cfg: &ShipConfig, files: Vec<PathBuf>) -> Result<()> {
    let hook = build_hook(cfg)?;
    let reports = ship_all(&hook, files).await;
    hook.on_shutdown();
    summarize(&reports?);
    Ok(())
}

/// Each file gets its own blocking task; they share the one client in `hook`.
pub(crate) async fn ship_all(hook: &Arc<RotationHook>, files: Vec<PathBuf>) -> Result<Vec<TaskReport>> {
    let handles: Vec<_> = files
        .into_iter()
        .map(|path| {
            let hook = Arc::clone(hook);
            tokio::task::spawn_blocking(move || hook.on_rotated(&path))
        })
        .collect();

    // Await every task before reporting a failure.
    let mut reports = Vec::with_capacity(handles.len());
    let mut failed = None;
    for handle in handles {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(e) => {
                tracing::error!(error = %e, "delivery task failed");
                failed.get_or_insert(e);
            }
        }
    }
    match failed {
        Some(e) => Err(e.into()),
        None => Ok(reports),
    }
}

/// Print one line per file. Relocated files are not an error: they sit in backout/.
pub(crate) fn summarize(reports: &[TaskReport]) {
    for r in reports {
        println!("{}", r);
    }
    let delivered = reports.iter().filter(|r| r.is_delivered()).count();
    println!("{} delivered, {} relocated", delivered, reports.len() - delivered);
}
