// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The request path: classify, select, adapt, invoke, record.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use switchboard_adapter::RequestAdapter;
use switchboard_config::SwitchboardConfig;
use switchboard_core::{
    CanonicalRequest, ClassificationResult, EmbeddingBackend, ModelSelection, ProviderTransport, SwitchboardError,
    TaskCategory,
};
use switchboard_embedding::{EmbeddingCache, EmbeddingProvider, FallbackEmbedder};
use switchboard_engine::{HttpTransport, Invocation, InvocationEngine, RetryPolicy};
use switchboard_recorder::{DecisionOutcome, DecisionRecord, DecisionRecorder};
use switchboard_router::{ModelSelector, TaskClassifier, infer_task_from_messages};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a request was routed before invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    /// Present only when the model was chosen automatically.
    pub classification: Option<ClassificationResult>,
    pub selection: ModelSelection,
    /// Category used for prompt and temperature tuning, if any.
    pub task: Option<TaskCategory>,
}

/// A handled request.
#[derive(Debug)]
pub struct Handled {
    pub decision: RoutingDecision,
    pub invocation: Invocation,
}

/// Adaptive LLM invocation layer.
///
/// One instance is shared by every request; nothing here takes an exclusive
/// lock across an `.await`.
pub struct Switchboard {
    embeddings: Arc<EmbeddingProvider>,
    classifier: Option<TaskClassifier>,
    selector: ModelSelector,
    adapter: RequestAdapter,
    engine: InvocationEngine,
    recorder: DecisionRecorder,
    snapshot_path: Option<PathBuf>,
}

impl Switchboard {
    /// Production wiring: configured embedding backends, HTTP transport, and
    /// recorder sinks. Must be called inside a Tokio runtime.
    pub fn from_config(config: &SwitchboardConfig) -> Result<Self, SwitchboardError> {
        let embeddings = EmbeddingProvider::from_config(
            &config.embedding,
            &config.providers,
            Arc::new(EmbeddingCache::new()),
        )?;
        let transport = Arc::new(HttpTransport::new(config.providers.clone())?);
        let recorder = DecisionRecorder::from_config(&config.recorder);
        Ok(Self::assemble(config, embeddings, transport, recorder))
    }

    /// Wiring with caller-supplied embedding backends, transport, and
    /// recorder. Used for custom transports and in tests.
    pub fn with_parts(
        config: &SwitchboardConfig,
        backends: Vec<Arc<dyn EmbeddingBackend>>,
        transport: Arc<dyn ProviderTransport>,
        recorder: DecisionRecorder,
    ) -> Self {
        let embeddings = EmbeddingProvider::new(
            backends,
            Arc::new(EmbeddingCache::new()),
            FallbackEmbedder::new(config.embedding.fallback_dimension, config.embedding.max_fallback_tokens),
        );
        Self::assemble(config, embeddings, transport, recorder)
    }

    fn assemble(
        config: &SwitchboardConfig,
        embeddings: EmbeddingProvider,
        transport: Arc<dyn ProviderTransport>,
        recorder: DecisionRecorder,
    ) -> Self {
        let embeddings = Arc::new(embeddings);
        let classifier = config
            .classifier
            .enabled
            .then(|| TaskClassifier::new(embeddings.clone(), config.classifier.clone()));
        let engine = InvocationEngine::new(transport, RetryPolicy::from(&config.retry))
            .with_local_provider(config.providers.local_provider_forced());

        info!(
            classifier = if classifier.is_some() { "embedding" } else { "keyword" },
            transport = engine.transport_name(),
            recording = recorder.is_enabled(),
            "switchboard ready"
        );
        Self {
            embeddings,
            classifier,
            selector: ModelSelector::new(config.routing.clone()),
            adapter: RequestAdapter::new(config.providers.clone()),
            engine,
            recorder,
            snapshot_path: config.embedding.cache_snapshot_path.as_ref().map(PathBuf::from),
        }
    }

    pub fn selector(&self) -> &ModelSelector {
        &self.selector
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingProvider> {
        &self.embeddings
    }

    /// Classifies the most recent user message.
    ///
    /// Uses the embedding classifier when enabled and the keyword heuristic
    /// otherwise.
    pub async fn classify(&self, request: &CanonicalRequest) -> ClassificationResult {
        match &self.classifier {
            Some(classifier) => {
                let prompt = request.last_user_text().unwrap_or_default();
                classifier.classify(&prompt).await
            }
            None => infer_task_from_messages(&request.messages),
        }
    }

    /// Decides which model serves `request` and which task tuning applies.
    pub async fn route(&self, request: &CanonicalRequest) -> RoutingDecision {
        if !request.wants_auto_model() {
            return RoutingDecision {
                classification: None,
                selection: ModelSelection {
                    model_id: request.model.clone(),
                    override_reason: None,
                },
                task: request.task.category(),
            };
        }

        let classification = self.classify(request).await;
        let selection = self.selector.select(&classification, request);
        let task = request.task.category().or_else(|| {
            self.selector
                .routing()
                .tune_classified_tasks
                .then_some(classification.category)
        });
        RoutingDecision {
            classification: Some(classification),
            selection,
            task,
        }
    }

    /// Routes, adapts, and invokes `request`.
    pub async fn handle(
        &self,
        request: &CanonicalRequest,
        cancel: &CancellationToken,
    ) -> Result<Handled, SwitchboardError> {
        self.run(request, cancel, None).await
    }

    /// [`handle`](Self::handle) with an overall deadline on the invocation.
    pub async fn handle_with_timeout(
        &self,
        request: &CanonicalRequest,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<Handled, SwitchboardError> {
        self.run(request, cancel, Some(timeout)).await
    }

    async fn run(
        &self,
        request: &CanonicalRequest,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<Handled, SwitchboardError> {
        let decision = self.route(request).await;
        let params = self.adapter.adapt(request, &decision.selection, decision.task);
        debug!(model = %params.model, stream = params.stream, "invoking provider");

        let result = match timeout {
            Some(limit) => self.engine.invoke_with_timeout(params, cancel, limit).await,
            None => self.engine.invoke(params, cancel).await,
        };
        self.record(request, &decision, &result);

        result.map(|invocation| Handled { decision, invocation })
    }

    /// Only automatic selections are decisions worth recording.
    fn record(
        &self,
        request: &CanonicalRequest,
        decision: &RoutingDecision,
        result: &Result<Invocation, SwitchboardError>,
    ) {
        let Some(classification) = &decision.classification else {
            return;
        };
        let prompt = request.last_user_text().unwrap_or_default();
        let record = DecisionRecord::new(
            &prompt,
            classification,
            &decision.selection,
            DecisionOutcome::from_result(result),
            self.recorder.snippet_chars(),
        );
        let record = match result {
            Ok(invocation) => record.with_attempts(invocation.attempts),
            Err(SwitchboardError::RetryExhausted { attempts, .. }) => record.with_attempts(*attempts),
            Err(_) => record,
        };
        self.recorder.submit(record);
    }

    /// Merges the configured embedding cache snapshot into the live cache.
    /// Failures are logged and leave the cache as it was.
    pub async fn load_cache_snapshot(&self) -> usize {
        let Some(path) = &self.snapshot_path else {
            return 0;
        };
        match self.embeddings.cache().import_snapshot(path).await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "could not load embedding cache snapshot");
                0
            }
        }
    }

    /// Writes the embedding cache to the configured snapshot path, if any.
    pub async fn save_cache_snapshot(&self) -> Result<usize, SwitchboardError> {
        match &self.snapshot_path {
            Some(path) => self.embeddings.cache().export_snapshot(path).await,
            None => Ok(0),
        }
    }

    /// Saves the cache snapshot and drains the decision recorder.
    pub async fn shutdown(self) {
        if let Err(e) = self.save_cache_snapshot().await {
            warn!(error = %e, "could not save embedding cache snapshot");
        }
        self.recorder.shutdown().await;
    }
}
