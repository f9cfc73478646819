// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider: cache, backend chain, and deterministic fallback.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use switchboard_config::model::{EmbeddingConfig, ProvidersConfig};
use switchboard_core::{EmbeddingBackend, SwitchboardError};
use tracing::{debug, info, warn};

use crate::backend::{OllamaEmbedder, OpenAiEmbedder};
use crate::cache::EmbeddingCache;
use crate::fallback::FallbackEmbedder;

/// Turns text into fixed-dimension vectors and never fails.
///
/// Backends are tried in order; the first successful answer is cached and
/// returned. If none answers, the bag-of-words fallback is used. The vector
/// dimension is pinned by the first answer of a backend or the fallback: later
/// answers with a different dimension are discarded, and when nothing can
/// produce the pinned dimension a zero vector ("no signal") is returned instead.
///
/// Cache entries never pin the dimension. A hit is served only once a live
/// source has pinned a matching dimension; otherwise it is recomputed and
/// replaced, so an imported snapshot from another model cannot take over.
pub struct EmbeddingProvider {
    backends: Vec<Arc<dyn EmbeddingBackend>>,
    cache: Arc<EmbeddingCache>,
    fallback: FallbackEmbedder,
    dimension: OnceLock<usize>,
}

impl EmbeddingProvider {
    /// Creates a provider over an explicit backend chain and shared cache.
    pub fn new(
        backends: Vec<Arc<dyn EmbeddingBackend>>,
        cache: Arc<EmbeddingCache>,
        fallback: FallbackEmbedder,
    ) -> Self {
        Self {
            backends,
            cache,
            fallback,
            dimension: OnceLock::new(),
        }
    }

    /// Builds the configured chain: local inference server, then hosted API
    /// when an OpenAI key is present, then the fallback.
    pub fn from_config(
        embedding: &EmbeddingConfig,
        providers: &ProvidersConfig,
        cache: Arc<EmbeddingCache>,
    ) -> Result<Self, SwitchboardError> {
        let timeout = Duration::from_secs(embedding.request_timeout_secs);
        let mut backends: Vec<Arc<dyn EmbeddingBackend>> = Vec::new();

        if embedding.enable_local {
            backends.push(Arc::new(OllamaEmbedder::new(
                &providers.ollama_api_base,
                &embedding.local_model,
                timeout,
            )?));
        }
        if embedding.enable_hosted
            && let Some(key) = providers.openai_api_key.as_deref()
        {
            backends.push(Arc::new(OpenAiEmbedder::new(
                &providers.openai_api_base,
                key,
                &embedding.hosted_model,
                timeout,
            )?));
        }

        info!(
            backends = ?backends.iter().map(|b| b.name().to_string()).collect::<Vec<_>>(),
            fallback_dimension = embedding.fallback_dimension,
            "embedding provider configured"
        );

        Ok(Self::new(
            backends,
            cache,
            FallbackEmbedder::new(embedding.fallback_dimension, embedding.max_fallback_tokens),
        ))
    }

    /// The shared cache.
    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Pinned dimension, once any source has answered.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension.get().copied()
    }

    /// Embed `text`. Never fails; a zero vector means "no signal".
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if let Some(hit) = self.cache.get(text) {
            if self.dimension() == Some(hit.len()) {
                return hit;
            }
            debug!(
                dim = hit.len(),
                expected = ?self.dimension(),
                "recomputing cached embedding of unverified dimension"
            );
        }

        for backend in &self.backends {
            match backend.embed(text).await {
                Ok(vector) if self.accepts(vector.len()) => {
                    debug!(backend = backend.name(), dim = vector.len(), "embedding computed");
                    self.cache.insert(text, vector.clone());
                    return vector;
                }
                Ok(vector) => {
                    warn!(
                        backend = backend.name(),
                        dim = vector.len(),
                        expected = ?self.dimension(),
                        "discarding embedding with mismatched dimension"
                    );
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "embedding backend failed");
                }
            }
        }

        if self.accepts(self.fallback.dimension()) {
            let vector = self.fallback.embed(text);
            self.cache.insert(text, vector.clone());
            return vector;
        }

        warn!(
            expected = ?self.dimension(),
            "no embedding source matches the pinned dimension, returning zero vector"
        );
        vec![0.0; self.dimension().unwrap_or(self.fallback.dimension())]
    }

    /// Pins the dimension on first use and checks it afterwards.
    fn accepts(&self, dim: usize) -> bool {
        dim > 0 && *self.dimension.get_or_init(|| dim) == dim
    }
}
