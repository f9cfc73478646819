// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding backend for classifier and pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use switchboard_core::{EmbeddingBackend, SwitchboardError};

/// Answers from substring rules, checked in insertion order.
///
/// A text matching no rule gets the default vector, or an error when no
/// default is set.
#[derive(Debug, Default)]
pub struct StaticEmbeddingBackend {
    rules: Vec<(String, Vec<f32>)>,
    default: Option<Vec<f32>>,
    calls: AtomicUsize,
}

impl StaticEmbeddingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that fails every call.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Texts containing `needle` (case-insensitive) embed to `vector`.
    pub fn with_rule(mut self, needle: &str, vector: Vec<f32>) -> Self {
        self.rules.push((needle.to_lowercase(), vector));
        self
    }

    /// Vector for texts matching no rule.
    pub fn with_default(mut self, vector: Vec<f32>) -> Self {
        self.default = Some(vector);
        self
    }

    /// Number of embed calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingBackend for StaticEmbeddingBackend {
    fn name(&self) -> &str {
        "static"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, SwitchboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|(needle, _)| lower.contains(needle.as_str()))
            .map(|(_, v)| v.clone())
            .or_else(|| self.default.clone())
            .ok_or_else(|| SwitchboardError::Embedding {
                message: format!("no static embedding for {text:?}"),
                source: None,
            })
    }
}
