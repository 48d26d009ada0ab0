/*!
 * Resumable progress for the batch pipeline.
 *
 * A checkpoint is a small JSON document holding every translated entry so far
 * and the index of the last completed batch:
 *
 * ```json
 * { "entries": [{ "index": 1, "timeCode": "...", "text": "..." }], "lastBatchIndex": 0 }
 * ```
 *
 * Reads never fail the caller: an unreadable or corrupt file is reported and
 * treated as absent. Writes go to a temporary file in the same directory which
 * then replaces the checkpoint, so a reader never sees a partial document.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::CheckpointError;
use crate::subtitle_processor::SubtitleEntry;

/// Translated entries so far and the last batch they cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Translated entries of batches `0..=last_batch_index`, in order
    pub entries: Vec<SubtitleEntry>,
    /// Zero-based index of the last completed batch
    pub last_batch_index: usize,
}

impl Checkpoint {
    pub fn new(entries: Vec<SubtitleEntry>, last_batch_index: usize) -> Self {
        Self { entries, last_batch_index }
    }

    /// Batch the pipeline continues from, `None` if the stored index is out of range
    pub fn next_batch_index(&self) -> Option<usize> {
        self.last_batch_index.checked_add(1)
    }
}

/// File-backed checkpoint storage
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the checkpoint, if there is a usable one
    pub fn load(&self) -> Option<Checkpoint> {
        match self.try_load() {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!("Ignoring unreadable checkpoint {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Read the checkpoint, reporting why it could not be used
    pub fn try_load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let checkpoint: Checkpoint = serde_json::from_str(&content)?;
        debug!(
            "Loaded checkpoint {} ({} entries, last batch {})",
            self.path.display(),
            checkpoint.entries.len(),
            checkpoint.last_batch_index
        );
        Ok(Some(checkpoint))
    }

    /// Persist the checkpoint; a failure is logged and otherwise ignored
    pub fn save(&self, checkpoint: &Checkpoint) {
        if let Err(e) = self.try_save(checkpoint) {
            warn!("Failed to save checkpoint {}: {}", self.path.display(), e);
        }
    }

    /// Persist the checkpoint atomically
    pub fn try_save(&self, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        let json = serde_json::to_vec_pretty(checkpoint)?;
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(&json)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Remove the checkpoint; a missing file is not an error
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed checkpoint {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove checkpoint {}: {}", self.path.display(), e),
        }
    }
}
