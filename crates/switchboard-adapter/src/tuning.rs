// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-task system instructions and sampling temperatures.

use switchboard_core::types::{ContentBlock, MessageContent, Role};
use switchboard_core::{Message, TaskCategory};
use tracing::debug;

/// The system instruction appended for `category`.
pub fn task_instruction(category: TaskCategory) -> &'static str {
    match category {
        TaskCategory::Coding => {
            "You are an expert programmer. Provide clean, efficient, and well-documented code. \
             Focus on best practices, security, and performance. Include error handling \
             and explain your implementation choices. Be precise and thorough."
        }
        TaskCategory::Reasoning => {
            "You are a logical reasoning expert. Break down complex problems step by step. \
             Consider multiple perspectives, identify assumptions, and evaluate evidence critically. \
             Be thorough in your analysis and explain your reasoning clearly."
        }
        TaskCategory::Creative => {
            "You are a creative assistant. Think outside the box and generate novel ideas. \
             Use vivid language, metaphors, and storytelling techniques. \
             Don't be constrained by conventional thinking."
        }
        TaskCategory::General => {
            "You are a helpful, friendly assistant. Provide concise, accurate information. \
             Be conversational but efficient. Anticipate follow-up questions and provide \
             relevant context when appropriate."
        }
    }
}

/// Recommended sampling temperature for `category`.
pub fn task_temperature(category: TaskCategory) -> f32 {
    match category {
        TaskCategory::Coding => 0.1,
        TaskCategory::Reasoning => 0.2,
        TaskCategory::Creative => 0.8,
        TaskCategory::General => 0.5,
    }
}

/// The caller's temperature, or the task default when the caller left it at `0`.
/// An unknown task leaves the caller's value untouched.
pub fn optimize_temperature(task: Option<TaskCategory>, requested: f32) -> f32 {
    match task {
        Some(category) if requested == 0.0 => {
            let tuned = task_temperature(category);
            debug!(task_type = %category, from = requested, to = tuned, "optimized temperature");
            tuned
        }
        _ => requested,
    }
}

/// Append the task instruction to the first system message, or insert a new
/// system message at the front when there is none.
pub fn augment_messages(messages: &mut Vec<Message>, category: TaskCategory) {
    let instruction = task_instruction(category);

    let Some(system) = messages.iter_mut().find(|m| m.role == Role::System) else {
        messages.insert(0, Message::system(instruction));
        debug!(task_type = %category, "inserted task system message");
        return;
    };

    match &mut system.content {
        MessageContent::Text(text) => append_instruction(text, instruction),
        MessageContent::Blocks(blocks) => {
            let last_text = blocks.iter_mut().rev().find_map(|b| match b {
                ContentBlock::Text { text, .. } => Some(text),
                ContentBlock::ImageUrl { .. } => None,
            });
            match last_text {
                Some(text) => append_instruction(text, instruction),
                None => blocks.push(ContentBlock::text(instruction)),
            }
        }
    }
    debug!(task_type = %category, "enhanced system message with task instructions");
}

fn append_instruction(text: &mut String, instruction: &str) {
    text.push_str(if text.ends_with('.') { " " } else { ". " });
    text.push_str(instruction);
}
