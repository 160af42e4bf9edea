//! `rollship config` – show the effective configuration.

use anyhow::Result;
use rollship_core::config::ShipConfig;
use std::path::Path;

pub fn run_config(cfg: &ShipConfig, source: &Path) -> Result<()> {
    println!("# {}", source.display());
    print!("{}", toml::to_string_pretty(&cfg.redacted())?);
    if let Err(e) = cfg.validate() {
        println!("# incomplete: {}", e);
    }
    Ok(())
}
