// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The decision record written for every routed request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use switchboard_core::{ClassificationResult, ModelSelection, OverrideReason, SwitchboardError, TaskCategory};

/// How the invocation that followed a decision ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Success,
    RetryExhausted,
    NonRetryable,
    Cancelled,
    Timeout,
    Failed,
}

impl DecisionOutcome {
    pub fn from_error(error: &SwitchboardError) -> Self {
        match error {
            SwitchboardError::RetryExhausted { .. } => DecisionOutcome::RetryExhausted,
            SwitchboardError::NonRetryable { .. } => DecisionOutcome::NonRetryable,
            SwitchboardError::Cancelled => DecisionOutcome::Cancelled,
            SwitchboardError::Timeout { .. } => DecisionOutcome::Timeout,
            _ => DecisionOutcome::Failed,
        }
    }

    pub fn from_result<T>(result: &Result<T, SwitchboardError>) -> Self {
        match result {
            Ok(_) => DecisionOutcome::Success,
            Err(e) => Self::from_error(e),
        }
    }
}

/// One routing decision. The prompt itself never leaves this layer, only a
/// short snippet of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: DateTime<Utc>,
    pub prompt_snippet: String,
    /// Length of the full prompt in characters.
    pub prompt_length: usize,
    pub task_type: TaskCategory,
    /// Rounded to two decimals.
    pub confidence: f32,
    pub selected_model: String,
    pub override_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<OverrideReason>,
    pub outcome: DecisionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl DecisionRecord {
    pub fn new(
        prompt: &str,
        classification: &ClassificationResult,
        selection: &ModelSelection,
        outcome: DecisionOutcome,
        snippet_chars: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            prompt_snippet: snippet(prompt, snippet_chars),
            prompt_length: prompt.chars().count(),
            task_type: classification.category,
            confidence: (classification.confidence * 100.0).round() / 100.0,
            selected_model: selection.model_id.clone(),
            override_applied: selection.override_reason.is_some(),
            override_reason: selection.override_reason,
            outcome,
            attempts: None,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }
}

/// Truncates `prompt` to at most `max_chars` characters, ending in `...` when cut.
pub fn snippet(prompt: &str, max_chars: usize) -> String {
    if prompt.chars().count() <= max_chars {
        return prompt.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = prompt.chars().take(keep).collect();
    out.push_str("...");
    out
}
