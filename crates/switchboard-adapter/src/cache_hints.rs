// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ephemeral prompt-cache hints.
//!
//! Targets: the first system message, the two most recent user messages and
//! the most recent assistant message. Plain string content is wrapped in a
//! single text block. Message order and text are never changed, and applying
//! the hints again adds nothing.

use switchboard_core::Message;
use switchboard_core::types::{CacheControl, ContentBlock, MessageContent, Role};

/// Mark the cache-eligible messages in place.
pub fn apply_cache_hints(messages: &mut [Message]) {
    if let Some(system) = messages.iter_mut().find(|m| m.role == Role::System) {
        mark_first_text_block(&mut system.content);
    }

    let mut targets = Vec::with_capacity(3);
    let (mut users, mut assistant) = (0, false);
    for (i, message) in messages.iter().enumerate().rev() {
        match message.role {
            Role::User if users < 2 => {
                users += 1;
                targets.push(i);
            }
            Role::Assistant if !assistant => {
                assistant = true;
                targets.push(i);
            }
            _ => {}
        }
        if users == 2 && assistant {
            break;
        }
    }

    for i in targets {
        mark_all_text_blocks(&mut messages[i].content);
    }
}

/// Structured blocks of `content`, wrapping plain text into one block first.
fn wrap(content: &mut MessageContent) -> Option<&mut Vec<ContentBlock>> {
    if let MessageContent::Text(text) = content {
        *content = MessageContent::Blocks(vec![ContentBlock::text(std::mem::take(text))]);
    }
    match content {
        MessageContent::Blocks(blocks) => Some(blocks),
        MessageContent::Text(_) => None,
    }
}

/// Hint the first text block unless some text block already carries a hint.
fn mark_first_text_block(content: &mut MessageContent) {
    let Some(blocks) = wrap(content) else {
        return;
    };
    let already_marked = blocks.iter().any(|b| {
        matches!(
            b,
            ContentBlock::Text {
                cache_control: Some(_),
                ..
            }
        )
    });
    if already_marked {
        return;
    }
    if let Some(ContentBlock::Text { cache_control, .. }) = blocks
        .iter_mut()
        .find(|b| matches!(b, ContentBlock::Text { .. }))
    {
        *cache_control = Some(CacheControl::ephemeral());
    }
}

fn mark_all_text_blocks(content: &mut MessageContent) {
    for block in wrap(content).into_iter().flatten() {
        if let ContentBlock::Text { cache_control, .. } = block
            && cache_control.is_none()
        {
            *cache_control = Some(CacheControl::ephemeral());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hinted_blocks(message: &Message) -> Vec<bool> {
        match &message.content {
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .map(|b| {
                    matches!(
                        b,
                        ContentBlock::Text {
                            cache_control: Some(_),
                            ..
                        }
                    )
                })
                .collect(),
            MessageContent::Text(_) => Vec::new(),
        }
    }

    fn conversation() -> Vec<Message> {
        vec![
            Message::system("system prompt"),
            Message::user("u1"),
            Message::assistant("a1"),
            Message::user("u2"),
            Message::assistant("a2"),
            Message::user("u3"),
        ]
    }

    #[test]
    fn marks_system_last_two_users_and_last_assistant() {
        let mut messages = conversation();
        apply_cache_hints(&mut messages);

        assert_eq!(hinted_blocks(&messages[0]), vec![true]);
        assert!(matches!(messages[1].content, MessageContent::Text(_)));
        assert!(matches!(messages[2].content, MessageContent::Text(_)));
        assert_eq!(hinted_blocks(&messages[3]), vec![true]);
        assert_eq!(hinted_blocks(&messages[4]), vec![true]);
        assert_eq!(hinted_blocks(&messages[5]), vec![true]);
    }

    #[test]
    fn wrapping_preserves_text_and_order() {
        let original = conversation();
        let mut messages = original.clone();
        apply_cache_hints(&mut messages);

        let before: Vec<_> = original.iter().map(|m| (m.role, m.text())).collect();
        let after: Vec<_> = messages.iter().map(|m| (m.role, m.text())).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let mut once = conversation();
        once[0].content = MessageContent::Blocks(vec![
            ContentBlock::text("part one"),
            ContentBlock::text("part two"),
        ]);
        apply_cache_hints(&mut once);
        let mut twice = once.clone();
        apply_cache_hints(&mut twice);

        assert_eq!(once, twice);
        assert_eq!(hinted_blocks(&twice[0]), vec![true, false]);
    }

    #[test]
    fn every_unmarked_text_block_of_a_target_is_marked() {
        let mut messages = vec![Message {
            content: MessageContent::Blocks(vec![
                ContentBlock::text("look at"),
                ContentBlock::ImageUrl {
                    image_url: serde_json::json!({"url": "data:image/png;base64,AAA"}),
                },
                ContentBlock::text("this"),
            ]),
            ..Message::user("")
        }];
        apply_cache_hints(&mut messages);
        assert_eq!(hinted_blocks(&messages[0]), vec![true, false, true]);
    }
}
