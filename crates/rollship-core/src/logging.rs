//! Logging init: append to a file under the XDG state dir, or fall back to stderr.

use anyhow::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,rollship=debug,rollship_core=debug";

/// Set to override the log file location.
pub const ENV_LOG_FILE: &str = "ROLLSHIP_LOG_FILE";

/// One log record's destination. A record the file refuses (disk full,
/// revoked permissions) is written to stderr instead of being dropped.
enum LogSink<'a> {
    File(&'a File),
    Stderr,
}

impl Write for LogSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let LogSink::File(f) = self {
            let mut file: &File = *f;
            if let Ok(n) = file.write(buf) {
                return Ok(n);
            }
            *self = LogSink::Stderr;
        }
        io::stderr().lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => {
                let mut file: &File = *f;
                file.flush()
            }
            LogSink::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct AppendFile(File);

impl<'a> MakeWriter<'a> for AppendFile {
    type Writer = LogSink<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogSink::File(&self.0)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `$ROLLSHIP_LOG_FILE`, else `~/.local/state/rollship/rollship.log`.
pub fn log_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(ENV_LOG_FILE).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rollship")?;
    Ok(xdg_dirs.place_state_file("rollship.log")?)
}

/// Install the file logger and return the log path.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_path()?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(AppendFile(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!("rollship logging initialized at {}", path.display());
    Ok(path)
}

/// Initialize logging to stderr only. Use when init_logging() fails so the CLI doesn't crash.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollship.log");
        fs::write(&path, b"earlier\n").unwrap();
        let maker = AppendFile(OpenOptions::new().append(true).open(&path).unwrap());

        maker.make_writer().write_all(b"first record\n").unwrap();
        maker.make_writer().write_all(b"second record\n").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "earlier\nfirst record\nsecond record\n"
        );
    }

    #[test]
    fn unwritable_file_falls_back_to_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.log");
        fs::write(&path, b"").unwrap();
        let read_only = File::open(&path).unwrap();
        let mut sink = LogSink::File(&read_only);

        assert_eq!(sink.write(b"record\n").unwrap(), 7);
        assert!(matches!(sink, LogSink::Stderr));
        assert!(fs::read(&path).unwrap().is_empty());
    }
}
