//! Sent-post identifier store.
//!
//! A file-backed set of post IDs that have already been relayed. IDs are
//! only ever added; the set never expires entries within its lifetime, so
//! deleting the file is the one way to reset history.
//!
//! The store is single-writer: it is owned by the scheduler task and passed
//! `&mut` into each fetch. Persistence happens once per cycle, not per
//! item, so a crash mid-cycle can re-send items delivered after the last
//! flush. That window is accepted.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::Result;

/// Persisted set of already-relayed post IDs.
#[derive(Debug)]
pub struct SentStore {
    path: PathBuf,
    ids: HashSet<String>,
}

impl SentStore {
    /// Load the store from disk.
    ///
    /// A missing or unreadable file means "no prior history": the relay
    /// must keep working even if its memory is gone, at the cost of
    /// possible duplicates.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match Self::read_ids(&path).await {
            Ok(Some(ids)) => {
                log::info!("Loaded {} sent post IDs from {}", ids.len(), path.display());
                ids
            }
            Ok(None) => {
                log::info!(
                    "No sent-post history at {}, starting fresh",
                    path.display()
                );
                HashSet::new()
            }
            Err(e) => {
                log::warn!(
                    "Failed to read sent-post history from {}: {}. Starting fresh.",
                    path.display(),
                    e
                );
                HashSet::new()
            }
        };

        Self { path, ids }
    }

    /// Create an empty in-memory store rooted at `path` without touching disk.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: HashSet::new(),
        }
    }

    async fn read_ids(path: &Path) -> Result<Option<HashSet<String>>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let ids: Vec<String> = serde_json::from_slice(&bytes)?;
        Ok(Some(ids.into_iter().collect()))
    }

    /// Whether an ID has already been relayed.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Mark an ID as relayed (in memory only until `persist`).
    ///
    /// Returns false if the ID was already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    /// Number of stored IDs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Write the full set back to disk.
    ///
    /// Writes to a temp file and renames over the target, so a crash leaves
    /// either the old file or the new one, never a torn write.
    pub async fn persist(&self) -> Result<()> {
        let ids: Vec<&String> = self.ids.iter().collect();
        let bytes = serde_json::to_vec(&ids)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
