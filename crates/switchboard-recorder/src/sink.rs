// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destinations for decision records.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use switchboard_core::SwitchboardError;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::record::DecisionRecord;

/// Somewhere decision records go. Errors are logged by the recorder worker
/// and never reach the request path.
#[async_trait]
pub trait DecisionSink: Send + Sync + 'static {
    fn name(&self) -> &str;

    async fn write(&self, record: &DecisionRecord) -> Result<(), SwitchboardError>;
}

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl DecisionSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn write(&self, record: &DecisionRecord) -> Result<(), SwitchboardError> {
        info!(
            target: "switchboard::decisions",
            task_type = %record.task_type,
            confidence = record.confidence,
            selected_model = %record.selected_model,
            override_applied = record.override_applied,
            override_reason = ?record.override_reason,
            outcome = %record.outcome,
            prompt_length = record.prompt_length,
            prompt_snippet = %record.prompt_snippet,
            "model selection decision"
        );
        Ok(())
    }
}

/// Appends records to a JSON-lines file.
pub struct JsonlSink {
    path: PathBuf,
    file: tokio::sync::Mutex<Option<File>>,
}

impl JsonlSink {
    /// The file is created on the first write, along with missing parent directories.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: tokio::sync::Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record back from a JSON-lines file. Malformed lines are
    /// skipped; a missing file yields no records.
    pub async fn read_records(path: &Path) -> Result<Vec<DecisionRecord>, SwitchboardError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(path, e)),
        };

        let mut records = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), line = number + 1, error = %e, "skipping malformed decision record"),
            }
        }
        Ok(records)
    }

    async fn open(&self) -> Result<File, SwitchboardError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&self.path, e))?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| io_error(&self.path, e))
    }
}

#[async_trait]
impl DecisionSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn write(&self, record: &DecisionRecord) -> Result<(), SwitchboardError> {
        let mut line = serde_json::to_vec(record)
            .map_err(|e| SwitchboardError::Recorder(format!("failed to serialize decision record: {e}")))?;
        line.push(b'\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(&line).await.map_err(|e| io_error(&self.path, e))?;
            file.flush().await.map_err(|e| io_error(&self.path, e))?;
        }
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> SwitchboardError {
    SwitchboardError::Recorder(format!("decision log I/O failed for {}: {e}", path.display()))
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<DecisionRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DecisionSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn write(&self, record: &DecisionRecord) -> Result<(), SwitchboardError> {
        self.records
            .lock()
            .map_err(|_| SwitchboardError::Recorder("memory sink lock poisoned".into()))?
            .push(record.clone());
        Ok(())
    }
}
