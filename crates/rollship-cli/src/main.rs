use rollship_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Log to the state file; a read-only home must not stop shipping.
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable ({:#}), using stderr", err);
    }

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("rollship error: {:#}", err);
        std::process::exit(1);
    }
}
