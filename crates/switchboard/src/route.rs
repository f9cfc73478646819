// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard classify` and `switchboard select` command implementations.

use serde::Serialize;
use switchboard_config::SwitchboardConfig;
use switchboard_core::types::AUTO_MODEL;
use switchboard_core::{CanonicalRequest, ClassificationResult, Message, ModelSelection, SwitchboardError};
use switchboard_pipeline::Switchboard;

/// Structured output for `select --json`.
#[derive(Debug, Serialize)]
pub struct SelectOutput {
    pub classification: Option<ClassificationResult>,
    pub selection: ModelSelection,
}

fn auto_request(prompt: &str) -> CanonicalRequest {
    CanonicalRequest::new(vec![Message::user(prompt)], AUTO_MODEL)
}

/// Run the `switchboard classify` command.
pub async fn run_classify(config: &SwitchboardConfig, prompt: &str, json: bool) -> Result<(), SwitchboardError> {
    let switchboard = Switchboard::from_config(config)?;
    switchboard.load_cache_snapshot().await;

    let result = switchboard.classify(&auto_request(prompt)).await;
    if json {
        println!("{}", to_json(&result));
    } else {
        println!("{} (confidence {:.2})", result.category, result.confidence);
    }

    switchboard.shutdown().await;
    Ok(())
}

/// Run the `switchboard select` command.
///
/// Routes without invoking, so nothing is recorded.
pub async fn run_select(config: &SwitchboardConfig, prompt: &str, json: bool) -> Result<(), SwitchboardError> {
    let switchboard = Switchboard::from_config(config)?;
    switchboard.load_cache_snapshot().await;

    let decision = switchboard.route(&auto_request(prompt)).await;
    if json {
        let output = SelectOutput {
            classification: decision.classification,
            selection: decision.selection,
        };
        println!("{}", to_json(&output));
    } else {
        println!("{}", describe(decision.classification.as_ref(), &decision.selection));
    }

    switchboard.shutdown().await;
    Ok(())
}

fn describe(classification: Option<&ClassificationResult>, selection: &ModelSelection) -> String {
    let mut line = selection.model_id.clone();
    if let Some(c) = classification {
        line.push_str(&format!("  [{} {:.2}]", c.category, c.confidence));
    }
    if let Some(reason) = selection.override_reason {
        line.push_str(&format!("  override: {reason}"));
    }
    line
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use switchboard_core::{OverrideReason, TaskCategory};

    use super::*;

    #[test]
    fn describe_includes_classification_and_override() {
        let line = describe(
            Some(&ClassificationResult {
                category: TaskCategory::Creative,
                confidence: 0.714,
            }),
            &ModelSelection {
                model_id: "qwen2.5-coder:32b-instruct-q8_0".into(),
                override_reason: Some(OverrideReason::CodingKeywordsDetected),
            },
        );
        assert_eq!(
            line,
            "qwen2.5-coder:32b-instruct-q8_0  [creative 0.71]  override: coding_keywords_detected"
        );
    }

    #[test]
    fn select_output_serializes() {
        let output = SelectOutput {
            classification: None,
            selection: ModelSelection {
                model_id: "qwen3:32b".into(),
                override_reason: None,
            },
        };
        let json = to_json(&output);
        assert!(json.contains("\"model_id\": \"qwen3:32b\""));
        assert!(json.contains("\"classification\": null"));
    }
}
