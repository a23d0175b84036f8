//! Durable, resumable medal archive.
//!
//! The archive is one JSON document mapping target → ordered medal list.
//! [`MedalStore`] is the single writer of that document: workers hand their
//! batch results to the orchestrator, which calls [`MedalStore::merge`] once
//! per batch. Each merge rewrites the document through a temp file and an
//! atomic rename, so a reader (or a crash) between batches always sees a
//! complete snapshot — never a half-written one.
//!
//! Resume mode reads the existing document in full; its key set is the
//! progress set used to skip already-harvested targets. Fresh mode discards
//! any prior document before the first batch runs.

use crate::models::{BatchResult, Medal};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Whether to start over or continue a prior harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Discard any existing archive document.
    Fresh,
    /// Load the existing document and skip its targets.
    Resume,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("archive io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("archive at {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The durable archive plus its in-memory image.
#[derive(Debug)]
pub struct MedalStore {
    path: PathBuf,
    archive: BTreeMap<String, Vec<Medal>>,
}

impl MedalStore {
    /// Open the archive at `path` in the given mode.
    pub fn open(path: &Path, mode: StoreMode) -> Result<Self, StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        let archive = match mode {
            StoreMode::Fresh => {
                if path.exists() {
                    info!(path = %path.display(), "Fresh mode: discarding existing archive");
                    fs::remove_file(path).map_err(io_err)?;
                }
                BTreeMap::new()
            }
            StoreMode::Resume => {
                if path.exists() {
                    let text = fs::read_to_string(path).map_err(io_err)?;
                    let archive: BTreeMap<String, Vec<Medal>> = serde_json::from_str(&text)
                        .map_err(|source| StoreError::Corrupt {
                            path: path.to_path_buf(),
                            source,
                        })?;
                    info!(
                        path = %path.display(),
                        targets = archive.len(),
                        "Resume mode: loaded existing archive"
                    );
                    archive
                } else {
                    info!(path = %path.display(), "Resume mode: no existing archive, starting empty");
                    BTreeMap::new()
                }
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// The targets already present in the archive. Taken once before
    /// batching starts; the orchestrator does not consult it mid-run.
    pub fn completed(&self) -> HashSet<String> {
        self.archive.keys().cloned().collect()
    }

    /// Number of targets currently in the archive.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Merge one batch result and persist the whole document.
    ///
    /// A non-destructive superset update: keys in `batch` are added or
    /// overwritten, nothing is ever removed. The write goes through a
    /// sibling temp file and a rename so no reader observes a partial
    /// document.
    pub fn merge(&mut self, batch: BatchResult) -> Result<(), StoreError> {
        let incoming = batch.len();
        self.archive.extend(batch);
        self.persist()?;
        debug!(incoming, total = self.archive.len(), "Merged batch into archive");
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(&self.archive).map_err(|source| {
            StoreError::Corrupt {
                path: self.path.to_path_buf(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}
