//! Backout relocation: the last-resort home for files that could not be delivered.
//!
//! A file that exhausted its retries is renamed into a sibling `backout/`
//! directory, `<parent>/backout/<file name>`, where an operator can pick it up
//! for manual reprocessing. The rename is the atomicity boundary: the file is
//! always at exactly one of the two paths.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the directory created next to rotated files.
pub const BACKOUT_DIR: &str = "backout";

#[derive(Debug, thiserror::Error)]
pub enum RelocationError {
    #[error("cannot back out {path}: path has no file name")]
    NoFileName { path: PathBuf },

    #[error("cannot create backout directory {dir} for {path}: {err}")]
    CreateDir {
        path: PathBuf,
        dir: PathBuf,
        #[source]
        err: io::Error,
    },

    #[error("cannot move {path} to {target}: {err}")]
    Move {
        path: PathBuf,
        target: PathBuf,
        #[source]
        err: io::Error,
    },
}

/// Backout directory for `path`: `<parent>/backout`.
pub fn backout_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(BACKOUT_DIR),
        _ => PathBuf::from(".").join(BACKOUT_DIR),
    }
}

/// Where `path` lands when backed out: `<parent>/backout/<file name>`.
pub fn backout_path(path: &Path) -> Result<PathBuf, RelocationError> {
    let name = path.file_name().ok_or_else(|| RelocationError::NoFileName {
        path: path.to_path_buf(),
    })?;
    Ok(backout_dir(path).join(name))
}

/// Moves failed files into their backout directory.
#[derive(Debug, Clone, Default)]
pub struct BackoutRelocator {
    _private: (),
}

impl BackoutRelocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `path` to its backout path, replacing any earlier backout of the same name.
    ///
    /// The backout directory is created if missing; an existing one is fine.
    /// Returns the new location.
    pub fn relocate(&self, path: &Path) -> Result<PathBuf, RelocationError> {
        let target = backout_path(path)?;
        let dir = backout_dir(path);
        fs::create_dir_all(&dir).map_err(|err| RelocationError::CreateDir {
            path: path.to_path_buf(),
            dir: dir.clone(),
            err,
        })?;
        // Same filesystem (sibling directory), so rename is atomic and replaces the target.
        fs::rename(path, &target).map_err(|err| RelocationError::Move {
            path: path.to_path_buf(),
            target: target.clone(),
            err,
        })?;
        sync_dir(&dir);
        tracing::warn!(
            path = %path.display(),
            target = %target.display(),
            "moved undeliverable file to backout"
        );
        Ok(target)
    }
}

/// Persist the directory entry; failure only costs durability across a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::debug!(dir = %dir.display(), error = %e, "backout directory fsync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
