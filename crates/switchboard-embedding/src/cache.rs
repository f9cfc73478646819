// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact-text embedding cache with JSON snapshot import/export.
//!
//! Entries are keyed by the exact input text (no semantic dedup) and grow for
//! the life of the process. The map is sharded, so readers never wait on an
//! async operation and no guard is held across an `.await`.

use std::collections::HashMap;
use std::path::Path;

use dashmap::DashMap;
use switchboard_core::SwitchboardError;
use tracing::{debug, info};

/// Concurrent text-to-vector cache.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: DashMap<String, Vec<f32>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached vector for `text`, if present.
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.entries.get(text).map(|entry| entry.value().clone())
    }

    /// Store a vector, replacing any previous entry for the same text.
    pub fn insert(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.entries.insert(text.into(), vector);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of all entries as a plain map.
    pub fn snapshot(&self) -> HashMap<String, Vec<f32>> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Merge entries into the cache. Returns how many were merged.
    pub fn extend(&self, entries: HashMap<String, Vec<f32>>) -> usize {
        let count = entries.len();
        for (text, vector) in entries {
            self.entries.insert(text, vector);
        }
        count
    }

    /// Write the cache to `path` as a JSON object of `text -> [f32]`.
    pub async fn export_snapshot(&self, path: &Path) -> Result<usize, SwitchboardError> {
        let snapshot = self.snapshot();
        let count = snapshot.len();
        let json = serde_json::to_vec(&snapshot).map_err(|e| SwitchboardError::Embedding {
            message: format!("failed to serialize embedding cache: {e}"),
            source: Some(Box::new(e)),
        })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| snapshot_io_error(path, e))?;
        }
        tokio::fs::write(path, json)
            .await
            .map_err(|e| snapshot_io_error(path, e))?;

        info!(path = %path.display(), entries = count, "saved embedding cache snapshot");
        Ok(count)
    }

    /// Merge a snapshot written by [`export_snapshot`](Self::export_snapshot)
    /// into the cache. A missing file is not an error and merges nothing.
    pub async fn import_snapshot(&self, path: &Path) -> Result<usize, SwitchboardError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no embedding cache snapshot to load");
                return Ok(0);
            }
            Err(e) => return Err(snapshot_io_error(path, e)),
        };

        let entries: HashMap<String, Vec<f32>> =
            serde_json::from_slice(&bytes).map_err(|e| SwitchboardError::Embedding {
                message: format!("invalid embedding cache snapshot {}: {e}", path.display()),
                source: Some(Box::new(e)),
            })?;

        let count = self.extend(entries);
        info!(path = %path.display(), entries = count, "loaded embedding cache snapshot");
        Ok(count)
    }
}

fn snapshot_io_error(path: &Path, e: std::io::Error) -> SwitchboardError {
    SwitchboardError::Embedding {
        message: format!("embedding cache snapshot I/O failed for {}: {e}", path.display()),
        source: Some(Box::new(e)),
    }
}
