// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decision recorder: a bounded channel drained by a background worker.
//!
//! Submitting never waits and never fails. When the channel is full the
//! record is dropped with a warning; sink errors are logged by the worker.

use std::path::PathBuf;
use std::sync::Arc;

use switchboard_config::model::RecorderConfig;
use switchboard_core::{ClassificationResult, ModelSelection};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::record::{DecisionOutcome, DecisionRecord};
use crate::sink::{DecisionSink, JsonlSink, TracingSink};
use crate::telemetry;

/// Handle used by the request path to record routing decisions.
pub struct DecisionRecorder {
    tx: Option<mpsc::Sender<DecisionRecord>>,
    worker: Option<JoinHandle<()>>,
    snippet_chars: usize,
}

impl DecisionRecorder {
    /// Starts the worker over `sinks`. Must be called inside a Tokio runtime.
    ///
    /// Returns a disabled recorder when recording is turned off or there is
    /// nowhere to write.
    pub fn spawn(sinks: Vec<Arc<dyn DecisionSink>>, config: &RecorderConfig) -> Self {
        if !config.enabled || sinks.is_empty() {
            debug!("decision recording disabled");
            return Self::disabled(config.snippet_chars);
        }

        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        info!(
            sinks = ?sinks.iter().map(|s| s.name().to_string()).collect::<Vec<_>>(),
            capacity = config.channel_capacity,
            "decision recorder started"
        );
        Self {
            tx: Some(tx),
            worker: Some(tokio::spawn(run_worker(rx, sinks))),
            snippet_chars: config.snippet_chars,
        }
    }

    /// Tracing sink always, plus a JSON-lines file when `log_path` is set.
    pub fn from_config(config: &RecorderConfig) -> Self {
        let mut sinks: Vec<Arc<dyn DecisionSink>> = vec![Arc::new(TracingSink)];
        if let Some(path) = &config.log_path {
            sinks.push(Arc::new(JsonlSink::new(PathBuf::from(path))));
        }
        Self::spawn(sinks, config)
    }

    /// A recorder that only updates metrics.
    pub fn disabled(snippet_chars: usize) -> Self {
        Self {
            tx: None,
            worker: None,
            snippet_chars,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn snippet_chars(&self) -> usize {
        self.snippet_chars
    }

    /// Builds and submits a record for one decision.
    pub fn record(
        &self,
        prompt: &str,
        classification: &ClassificationResult,
        selection: &ModelSelection,
        outcome: DecisionOutcome,
    ) {
        self.submit(DecisionRecord::new(
            prompt,
            classification,
            selection,
            outcome,
            self.snippet_chars,
        ));
    }

    /// Submits a prepared record without waiting.
    pub fn submit(&self, record: DecisionRecord) {
        telemetry::record_decision(&record);

        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                warn!(
                    selected_model = %record.selected_model,
                    "decision recorder backlog full, dropping record"
                );
            }
            Err(TrySendError::Closed(_)) => {
                debug!("decision recorder worker gone, dropping record");
            }
        }
    }

    /// Stops accepting records and waits until the worker has written the backlog.
    pub async fn shutdown(mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && let Err(e) = worker.await
        {
            warn!(error = %e, "decision recorder worker ended abnormally");
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<DecisionRecord>, sinks: Vec<Arc<dyn DecisionSink>>) {
    while let Some(record) = rx.recv().await {
        for sink in &sinks {
            if let Err(e) = sink.write(&record).await {
                warn!(sink = sink.name(), error = %e, "failed to write decision record");
            }
        }
    }
    debug!("decision recorder worker stopped");
}
