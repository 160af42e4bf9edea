//! `rollship rotate` – rename the active log and ship the archive.

use anyhow::{Context, Result};
use rollship_core::config::ShipConfig;
use rollship_core::RolloverAction;
use std::fs;
use std::path::PathBuf;

use super::{build_hook, ship::summarize};

pub async fn run_rotate(cfg: &ShipConfig, active: PathBuf, archive: PathBuf) -> Result<()> {
    let hook = build_hook(cfg)?;

    let outcome = tokio::task::spawn_blocking(move || {
        let from = active.clone();
        let to = archive.clone();
        let mut action = RolloverAction::new(
            move || -> std::io::Result<bool> {
                if !from.exists() {
                    return Ok(false);
                }
                fs::rename(&from, &to)?;
                Ok(true)
            },
            archive,
            hook,
        );
        let result = action
            .execute()
            .with_context(|| format!("failed to rotate {}", active.display()));
        action.close();
        result
    })
    .await??;

    match outcome {
        (_, Some(report)) => summarize(std::slice::from_ref(&report)),
        (_, None) => println!("nothing to rotate"),
    }
    Ok(())
}
