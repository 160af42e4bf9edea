//! `rollship reprocess` – retry files previously moved to backout/.

use anyhow::{Context, Result};
use rollship_core::backout::BACKOUT_DIR;
use rollship_core::config::ShipConfig;
use std::fs;
use std::path::{Path, PathBuf};

use super::build_hook;
use super::ship::{ship_all, summarize};

pub async fn run_reprocess(cfg: &ShipConfig, dir: &Path) -> Result<()> {
    let hook = build_hook(cfg)?;
    let reports = match restore_backout(dir) {
        Ok(restored) if restored.is_empty() => {
            println!("no files restored from {}", dir.join(BACKOUT_DIR).display());
            Ok(Vec::new())
        }
        Ok(restored) => ship_all(&hook, restored).await,
        Err(e) => Err(e),
    };
    hook.on_shutdown();
    let reports = reports?;
    if !reports.is_empty() {
        summarize(&reports);
    }
    Ok(())
}

/// Move every regular file in `dir/backout` back into `dir`.
///
/// A file already present under the same name in `dir` is a newer rotation
/// that has not been shipped; the backed-out copy stays where it is.
fn restore_backout(dir: &Path) -> Result<Vec<PathBuf>> {
    let backout = dir.join(BACKOUT_DIR);
    if !backout.is_dir() {
        return Ok(Vec::new());
    }
    let mut restored = Vec::new();
    for entry in fs::read_dir(&backout).with_context(|| format!("failed to list {}", backout.display()))? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let target = dir.join(entry.file_name());
        if target.symlink_metadata().is_ok() {
            tracing::warn!(
                path = %entry.path().display(),
                target = %target.display(),
                "name taken by a newer file, leaving backout entry in place"
            );
            continue;
        }
        fs::rename(entry.path(), &target)
            .with_context(|| format!("failed to restore {}", entry.path().display()))?;
        tracing::info!(path = %target.display(), "restored from backout");
        restored.push(target);
    }
    restored.sort();
    Ok(restored)
}
