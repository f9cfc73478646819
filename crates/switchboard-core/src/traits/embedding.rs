// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding backend trait for text-to-vector conversion.

use async_trait::async_trait;

use crate::error::SwitchboardError;

/// A single source of embeddings (local inference server, hosted API, ...).
///
/// Backends may fail freely; the embedding provider chains them and
/// degrades to a deterministic fallback.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync + 'static {
    /// Human-readable backend name used in logs.
    fn name(&self) -> &str;

    /// Embeds a single non-empty text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SwitchboardError>;
}
