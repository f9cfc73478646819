// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task-aware model selection with keyword and length overrides.
//!
//! Priority order, first match wins:
//! coding keywords > long prompt > reasoning terms > base task mapping.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use switchboard_config::model::RoutingConfig;
use switchboard_core::{
    CanonicalRequest, ClassificationResult, ModelSelection, OverrideReason, TaskCategory,
};
use tracing::info;

/// Used when the routing table has no usable entry at all.
const DEFAULT_MODEL: &str = "qwen3:32b";

/// A task category and the model that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskModelInfo {
    pub task_type: TaskCategory,
    pub model_name: String,
    pub description: String,
}

/// Maps classifications to concrete model identifiers.
///
/// The routing table can be swapped at runtime with [`reload`](Self::reload);
/// in-flight selections keep the table they started with.
pub struct ModelSelector {
    routing: ArcSwap<RoutingConfig>,
}

impl ModelSelector {
    pub fn new(routing: RoutingConfig) -> Self {
        Self {
            routing: ArcSwap::from_pointee(routing),
        }
    }

    /// Replace the routing table.
    pub fn reload(&self, routing: RoutingConfig) {
        info!(
            coding = %routing.coding_model,
            reasoning = %routing.reasoning_model,
            creative = %routing.creative_model,
            general = %routing.general_model,
            "routing table reloaded"
        );
        self.routing.store(Arc::new(routing));
    }

    /// The current routing table.
    pub fn routing(&self) -> Arc<RoutingConfig> {
        self.routing.load_full()
    }

    /// Select a model for `request`, inspecting its most recent user message.
    pub fn select(
        &self,
        classification: &ClassificationResult,
        request: &CanonicalRequest,
    ) -> ModelSelection {
        let prompt = request.last_user_text().unwrap_or_default();
        self.select_for_prompt(classification, &prompt)
    }

    /// Select a model for a classified prompt.
    pub fn select_for_prompt(
        &self,
        classification: &ClassificationResult,
        prompt: &str,
    ) -> ModelSelection {
        let routing = self.routing.load();
        let category = classification.category;
        let lower = prompt.to_lowercase();
        let contains_any = |terms: &[String]| {
            terms
                .iter()
                .any(|t| !t.is_empty() && lower.contains(&t.to_lowercase()))
        };

        let (target, override_reason) = if category != TaskCategory::Coding
            && contains_any(&routing.coding_keywords)
        {
            (TaskCategory::Coding, Some(OverrideReason::CodingKeywordsDetected))
        } else if category != TaskCategory::Reasoning
            && prompt.split_whitespace().count() > routing.long_prompt_words
        {
            (TaskCategory::Reasoning, Some(OverrideReason::LongComplexPrompt))
        } else if category != TaskCategory::Reasoning && contains_any(&routing.reasoning_terms) {
            (TaskCategory::Reasoning, Some(OverrideReason::ReasoningTermsDetected))
        } else {
            (category, None)
        };

        let model_id = resolve_model(&routing, target);
        if let Some(reason) = override_reason {
            info!(task_type = %category, %reason, model = %model_id, "overriding task model");
        }
        info!(model = %model_id, task_type = %category, "selected model");

        ModelSelection {
            model_id,
            override_reason,
        }
    }

    /// Every task category with its configured model.
    pub fn available_task_models(&self) -> Vec<TaskModelInfo> {
        let routing = self.routing.load();
        TaskCategory::ALL
            .into_iter()
            .map(|task_type| TaskModelInfo {
                task_type,
                model_name: resolve_model(&routing, task_type),
                description: format!("Optimized for {task_type} tasks"),
            })
            .collect()
    }
}

/// The category's model, falling back to the general model and then to a
/// compiled-in default so the result is never empty.
fn resolve_model(routing: &RoutingConfig, category: TaskCategory) -> String {
    [routing.model_for(category), routing.general_model.as_str()]
        .into_iter()
        .map(str::trim)
        .find(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MODEL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use switchboard_core::Message;

    use super::*;

    fn selector() -> ModelSelector {
        ModelSelector::new(RoutingConfig::default())
    }

    fn classified(category: TaskCategory, confidence: f32) -> ClassificationResult {
        ClassificationResult {
            category,
            confidence,
        }
    }

    fn words(n: usize) -> String {
        vec!["once"; n].join(" ")
    }

    #[test]
    fn coding_keywords_override_general() {
        let selection = selector().select_for_prompt(
            &classified(TaskCategory::General, 0.52),
            "Can you debug this function for me?",
        );
        assert_eq!(selection.model_id, "qwen2.5-coder:32b-instruct-q8_0");
        assert_eq!(
            selection.override_reason,
            Some(OverrideReason::CodingKeywordsDetected)
        );
    }

    #[test]
    fn long_creative_prompt_goes_to_reasoning_model() {
        let selection =
            selector().select_for_prompt(&classified(TaskCategory::Creative, 0.8), &words(150));
        assert_eq!(selection.model_id, "mixtral:8x22b-instruct-v0.1-q4_K_M");
        assert_eq!(
            selection.override_reason,
            Some(OverrideReason::LongComplexPrompt)
        );
    }

    #[test]
    fn coding_keywords_take_priority_over_length() {
        let prompt = format!("{} now write the code", words(150));
        let selection =
            selector().select_for_prompt(&classified(TaskCategory::Creative, 0.8), &prompt);
        assert_eq!(
            selection.override_reason,
            Some(OverrideReason::CodingKeywordsDetected)
        );
    }

    #[test]
    fn exactly_the_word_limit_is_not_long() {
        let selection =
            selector().select_for_prompt(&classified(TaskCategory::Creative, 0.8), &words(100));
        assert_eq!(selection.model_id, "qwen3:8b");
        assert_eq!(selection.override_reason, None);
    }

    #[test]
    fn reasoning_terms_override_creative() {
        let selection = selector().select_for_prompt(
            &classified(TaskCategory::Creative, 0.7),
            "Contrast these two poems",
        );
        assert_eq!(
            selection.override_reason,
            Some(OverrideReason::ReasoningTermsDetected)
        );
    }

    #[test]
    fn reasoning_category_ignores_reasoning_overrides() {
        let selection = selector().select_for_prompt(
            &classified(TaskCategory::Reasoning, 0.9),
            &format!("analyze {}", words(200)),
        );
        assert_eq!(selection.model_id, "mixtral:8x22b-instruct-v0.1-q4_K_M");
        assert_eq!(selection.override_reason, None);
    }

    #[test]
    fn coding_category_uses_base_mapping() {
        let selection =
            selector().select_for_prompt(&classified(TaskCategory::Coding, 0.9), "write code");
        assert_eq!(selection.model_id, "qwen2.5-coder:32b-instruct-q8_0");
        assert_eq!(selection.override_reason, None);
    }

    #[test]
    fn select_reads_last_user_message() {
        let request = CanonicalRequest::new(
            vec![
                Message::user("tell me a story"),
                Message::assistant("once upon a time"),
                Message::user("now compile it"),
            ],
            "auto",
        );
        let selection = selector().select(&classified(TaskCategory::Creative, 0.9), &request);
        assert_eq!(
            selection.override_reason,
            Some(OverrideReason::CodingKeywordsDetected)
        );
    }

    #[test]
    fn empty_mapping_falls_back_to_general_then_default() {
        let selector = selector();
        let mut routing = RoutingConfig::default();
        routing.creative_model = String::new();
        selector.reload(routing.clone());
        let selection =
            selector.select_for_prompt(&classified(TaskCategory::Creative, 0.9), "a poem");
        assert_eq!(selection.model_id, "qwen3:32b");

        routing.general_model = "  ".into();
        routing.creative_model = String::new();
        selector.reload(routing);
        let selection =
            selector.select_for_prompt(&classified(TaskCategory::Creative, 0.9), "a poem");
        assert_eq!(selection.model_id, DEFAULT_MODEL);
    }

    #[test]
    fn reload_swaps_table() {
        let selector = selector();
        let mut routing = RoutingConfig::default();
        routing.general_model = "openai/gpt-4o-mini".into();
        selector.reload(routing);

        let selection =
            selector.select_for_prompt(&classified(TaskCategory::General, 0.9), "hello there");
        assert_eq!(selection.model_id, "openai/gpt-4o-mini");
    }

    #[test]
    fn task_model_catalog_lists_every_category() {
        let catalog = selector().available_task_models();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog[0].task_type, TaskCategory::Coding);
        assert_eq!(catalog[0].description, "Optimized for coding tasks");

        let json = serde_json::to_value(&catalog[3]).unwrap();
        assert_eq!(json["task_type"], "general");
        assert_eq!(json["model_name"], "qwen3:32b");
    }
}
