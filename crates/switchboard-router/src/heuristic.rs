// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword task heuristic.
//!
//! Zero-cost substitute for the embedding classifier: looks only at the most
//! recent user message, no network, no latency.

use switchboard_core::types::Role;
use switchboard_core::{ClassificationResult, Message, TaskCategory};

const CODING_HINTS: &[&str] = &["code", "function", "programming", "script", "algorithm", "debug"];
const REASONING_HINTS: &[&str] = &["explain", "why", "how", "analyze", "compare", "evaluate"];
const CREATIVE_HINTS: &[&str] = &["story", "creative", "imagine", "design", "generate"];

/// Guess the task category from the last user message.
///
/// A keyword match yields confidence `1.0`; the `general` default yields `0.5`.
pub fn infer_task_from_messages(messages: &[Message]) -> ClassificationResult {
    let text = messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.text().to_lowercase())
        .unwrap_or_default();

    let matched = [
        (TaskCategory::Coding, CODING_HINTS),
        (TaskCategory::Reasoning, REASONING_HINTS),
        (TaskCategory::Creative, CREATIVE_HINTS),
    ]
    .into_iter()
    .find(|(_, hints)| hints.iter().any(|h| text.contains(h)));

    match matched {
        Some((category, _)) => ClassificationResult {
            category,
            confidence: 1.0,
        },
        None => ClassificationResult {
            category: TaskCategory::General,
            confidence: 0.5,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(text: &str) -> ClassificationResult {
        infer_task_from_messages(&[Message::system("be brief"), Message::user(text)])
    }

    #[test]
    fn keyword_groups_in_priority_order() {
        assert_eq!(infer("Write a Python script").category, TaskCategory::Coding);
        assert_eq!(infer("Why is the sky blue?").category, TaskCategory::Reasoning);
        assert_eq!(infer("Imagine a city on Mars").category, TaskCategory::Creative);
        // "debug" beats "explain"
        assert_eq!(infer("Explain and debug this").category, TaskCategory::Coding);
    }

    #[test]
    fn no_keyword_is_general_with_half_confidence() {
        let result = infer("Good morning!");
        assert_eq!(result.category, TaskCategory::General);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn only_the_last_user_message_counts() {
        let result = infer_task_from_messages(&[
            Message::user("write some code"),
            Message::assistant("done"),
            Message::user("thanks!"),
        ]);
        assert_eq!(result.category, TaskCategory::General);
    }

    #[test]
    fn no_user_message_is_general() {
        assert_eq!(
            infer_task_from_messages(&[]).category,
            TaskCategory::General
        );
    }
}
