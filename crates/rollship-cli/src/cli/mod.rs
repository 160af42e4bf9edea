//! CLI for rollship: ship rotated log files and recover backed-out ones.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use rollship_core::config::{self, ShipConfig};
use std::path::{Path, PathBuf};

use commands::{
    run_completions, run_config, run_man, run_reprocess, run_rotate, run_ship,
};

/// Top-level CLI for rollship.
#[derive(Debug, Parser)]
#[command(name = "rollship")]
#[command(about = "Ship rotated log files to a streaming ingestion endpoint", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/rollship/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Deliver already-rotated files; failures are moved to a sibling backout/ dir.
    Ship {
        /// Rotated files to deliver.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Rename the active log to its archive name, then deliver the archive.
    Rotate {
        /// Log file currently being written.
        active: PathBuf,
        /// Name the rotated file receives.
        archive: PathBuf,
    },

    /// Move files from <DIR>/backout back into <DIR> and deliver them again.
    Reprocess {
        /// Directory whose backout/ subdirectory should be drained.
        dir: PathBuf,
    },

    /// Print the effective configuration (secrets redacted).
    Config,

    /// Generate shell completions to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Render the man page to stdout.
    Man,
}

fn load_config(path: Option<&Path>) -> Result<(ShipConfig, PathBuf)> {
    let (cfg, source) = match path {
        Some(p) => (config::load_from(p)?, p.to_path_buf()),
        None => (config::load_or_init()?, config::config_path()?),
    };
    Ok((cfg.resolve_env(), source))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let config_arg = cli.config.as_deref();

        match cli.command {
            CliCommand::Ship { files } => {
                let (cfg, _) = load_config(config_arg)?;
                tracing::debug!("loaded config: {:?}", cfg.redacted());
                run_ship(&cfg, files).await?;
            }
            CliCommand::Rotate { active, archive } => {
                let (cfg, _) = load_config(config_arg)?;
                run_rotate(&cfg, active, archive).await?;
            }
            CliCommand::Reprocess { dir } => {
                let (cfg, _) = load_config(config_arg)?;
                run_reprocess(&cfg, &dir).await?;
            }
            CliCommand::Config => {
                let (cfg, source) = load_config(config_arg)?;
                run_config(&cfg, &source)?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}
