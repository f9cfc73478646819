// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding-based task classification.
//!
//! Each category is represented by the mean embedding of its curated example
//! prompts. A prompt is assigned to the most similar prototype, then two
//! dampening rules push uncertain results towards `general`:
//!
//! 1. below the category threshold, with `general` as a close runner-up,
//!    the runner-up wins;
//! 2. anything under the global confidence floor becomes `general`.

use std::sync::Arc;

use futures::future::join_all;
use switchboard_config::model::ClassifierConfig;
use switchboard_core::{ClassificationResult, TaskCategory};
use switchboard_embedding::{EmbeddingProvider, cosine_similarity, is_zero, mean_vector};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::prototypes;

/// Mean embedding of a category's example prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPrototype {
    pub category: TaskCategory,
    pub vector: Vec<f32>,
}

/// Classifies prompts into a [`TaskCategory`] with a confidence score.
pub struct TaskClassifier {
    embeddings: Arc<EmbeddingProvider>,
    config: ClassifierConfig,
    prototypes: OnceCell<Vec<CategoryPrototype>>,
}

impl TaskClassifier {
    pub fn new(embeddings: Arc<EmbeddingProvider>, config: ClassifierConfig) -> Self {
        Self {
            embeddings,
            config,
            prototypes: OnceCell::new(),
        }
    }

    /// The category prototypes, built on first use.
    ///
    /// Concurrent callers during cold start wait for the single in-flight
    /// build instead of starting their own.
    pub async fn prototypes(&self) -> &[CategoryPrototype] {
        self.prototypes
            .get_or_init(|| self.build_prototypes())
            .await
    }

    async fn build_prototypes(&self) -> Vec<CategoryPrototype> {
        let mut built = Vec::with_capacity(TaskCategory::ALL.len());
        for category in TaskCategory::ALL {
            let vectors: Vec<Vec<f32>> =
                join_all(prototypes::examples(category).iter().map(|e| self.embeddings.embed(e)))
                    .await
                    .into_iter()
                    .filter(|v| !is_zero(v))
                    .collect();

            match mean_vector(&vectors) {
                Some(vector) => {
                    info!(task_type = %category, examples = vectors.len(), "initialized task prototype");
                    built.push(CategoryPrototype { category, vector });
                }
                None => warn!(task_type = %category, "no usable embeddings for task prototype"),
            }
        }
        built
    }

    /// Classify `prompt`. Always returns one of the four categories with a
    /// confidence in `[0, 1]`; an unusable embedding yields `general`.
    pub async fn classify(&self, prompt: &str) -> ClassificationResult {
        if prompt.trim().is_empty() {
            return ClassificationResult::no_signal();
        }

        let prototypes = self.prototypes().await;
        let embedding = self.embeddings.embed(prompt).await;
        if is_zero(&embedding) || prototypes.is_empty() {
            debug!("no embedding signal, defaulting to general");
            return ClassificationResult::no_signal();
        }

        let mut similarities: Vec<(TaskCategory, f32)> = prototypes
            .iter()
            .map(|p| (p.category, cosine_similarity(&embedding, &p.vector)))
            .collect();
        similarities.sort_by(|a, b| b.1.total_cmp(&a.1));
        debug!(?similarities, "task similarities");

        let result = apply_policy(&self.config, &similarities);
        info!(
            task_type = %result.category,
            confidence = format!("{:.2}", result.confidence),
            "classified task"
        );
        result
    }
}

fn to_confidence(similarity: f32) -> f32 {
    ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Turn similarities sorted best-first into a classification.
pub fn apply_policy(
    config: &ClassifierConfig,
    similarities: &[(TaskCategory, f32)],
) -> ClassificationResult {
    let Some(&(mut category, top)) = similarities.first() else {
        return ClassificationResult::no_signal();
    };
    let mut confidence = to_confidence(top);

    if confidence < config.threshold(category)
        && let Some(&(TaskCategory::General, runner_up)) = similarities.get(1)
    {
        let runner_up = to_confidence(runner_up);
        if confidence - runner_up < config.ambiguity_gap {
            info!(from = %category, "reclassified ambiguous task as general due to small confidence gap");
            category = TaskCategory::General;
            confidence = runner_up;
        }
    }

    if confidence < config.confidence_floor && category != TaskCategory::General {
        info!(
            task_type = %category,
            confidence = format!("{confidence:.2}"),
            "low confidence, defaulting to general"
        );
        category = TaskCategory::General;
    }

    ClassificationResult {
        category,
        confidence,
    }
}
