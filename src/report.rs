//! Append-only failure log.
//!
//! Every per-target failure cause ends up here as one human-readable line:
//! `<timestamp> <target>: <cause>`. The engine only ever writes this file;
//! nothing reads it back. Reporting must never fail the caller, so write
//! errors are downgraded to warnings.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Shared, append-only error log. The mutex keeps concurrent workers from
/// interleaving bytes within a single entry.
#[derive(Debug)]
pub struct ErrorReporter {
    path: PathBuf,
    file: Mutex<File>,
}

impl ErrorReporter {
    /// Open (or create) the log for appending.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Append one full entry for a failed target.
    pub fn report(&self, target: &str, cause: &str) {
        let line = format!(
            "{} {target}: {cause}\n",
            Local::now().format("%Y-%m-%dT%H:%M:%S")
        );
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = file.write_all(line.as_bytes()) {
            warn!(path = %self.path.display(), error = %e, "Failed to append to error log");
        }
    }
}
