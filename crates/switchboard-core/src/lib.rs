// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchboard invocation layer.
//!
//! This crate provides the canonical request and response model, the error
//! taxonomy, and the traits the other crates plug into. It has no I/O of its own.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{SwitchboardError, TransportError};
pub use traits::{EmbeddingBackend, ProviderTransport};
pub use types::{
    CanonicalRequest, ClassificationResult, Message, ModelSelection, OverrideReason,
    ProviderFamily, ProviderParameters, TaskCategory, TaskHint,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::types::{ContentBlock, MessageContent, Role, AUTO_MODEL};

    #[test]
    fn task_category_display_and_parse() {
        for category in TaskCategory::ALL {
            let s = category.to_string();
            assert_eq!(TaskCategory::from_str(&s).unwrap(), category);
        }
        assert_eq!(TaskCategory::General.to_string(), "general");
    }

    #[test]
    fn chat_is_an_alias_for_general() {
        assert_eq!(TaskCategory::from_str("chat").unwrap(), TaskCategory::General);
        let parsed: TaskCategory = serde_json::from_str("\"chat\"").unwrap();
        assert_eq!(parsed, TaskCategory::General);
    }

    #[test]
    fn task_hint_parses_auto_and_categories() {
        assert_eq!(TaskHint::from_str("auto").unwrap(), TaskHint::Auto);
        assert_eq!(TaskHint::from_str("AUTO").unwrap(), TaskHint::Auto);
        assert_eq!(
            TaskHint::from_str("Coding").unwrap(),
            TaskHint::Task(TaskCategory::Coding)
        );
        assert!(TaskHint::from_str("poetry").is_err());
    }

    #[test]
    fn task_hint_serde_uses_strings() {
        let json = serde_json::to_string(&TaskHint::Task(TaskCategory::Creative)).unwrap();
        assert_eq!(json, "\"creative\"");
        let hint: TaskHint = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(hint, TaskHint::Auto);
    }

    #[test]
    fn override_reason_wire_names() {
        assert_eq!(
            OverrideReason::CodingKeywordsDetected.to_string(),
            "coding_keywords_detected"
        );
        assert_eq!(OverrideReason::LongComplexPrompt.to_string(), "long_complex_prompt");
        assert_eq!(
            serde_json::to_string(&OverrideReason::ReasoningTermsDetected).unwrap(),
            "\"reasoning_terms_detected\""
        );
    }

    #[test]
    fn provider_family_from_prefixed_model() {
        assert_eq!(
            ProviderFamily::from_model("openrouter/anthropic/claude-3"),
            Some(ProviderFamily::OpenRouter)
        );
        assert_eq!(ProviderFamily::from_model("ollama/qwen3:8b"), Some(ProviderFamily::Ollama));
        assert_eq!(ProviderFamily::from_model("gpt-4o"), None);
        assert_eq!(ProviderFamily::from_model("acme/model"), None);
    }

    #[test]
    fn message_content_accepts_string_or_blocks() {
        let plain: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(plain.content, MessageContent::Text("hi".into()));

        let blocks: Message = serde_json::from_str(
            r#"{"role":"system","content":[{"type":"text","text":"a","cache_control":{"type":"ephemeral"}}]}"#,
        )
        .unwrap();
        assert_eq!(blocks.role, Role::System);
        match &blocks.content {
            MessageContent::Blocks(b) => assert!(matches!(
                &b[0],
                ContentBlock::Text { cache_control: Some(_), .. }
            )),
            other => panic!("expected blocks, got {other:?}"),
        }
    }

    #[test]
    fn last_user_text_picks_most_recent_user() {
        let request = CanonicalRequest::new(
            vec![
                Message::user("first"),
                Message::assistant("reply"),
                Message::user("second"),
                Message::assistant("reply 2"),
            ],
            AUTO_MODEL,
        );
        assert!(request.wants_auto_model());
        assert_eq!(request.last_user_text().as_deref(), Some("second"));
    }

    #[test]
    fn transport_error_converts_to_switchboard_error() {
        let err: SwitchboardError = TransportError::rejected("bad auth").into();
        assert!(matches!(err, SwitchboardError::NonRetryable { .. }));

        let err: SwitchboardError = TransportError::transient("reset").into();
        assert!(matches!(err, SwitchboardError::Provider { .. }));
    }
}
