// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API wire format.
//!
//! System messages move to the top-level `system` field, tool results become
//! `tool_result` blocks on a user turn, and assistant tool calls become
//! `tool_use` blocks. Tool-call deltas in the stream are re-emitted in the
//! chat-completions delta shape so callers see one format.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use switchboard_core::types::{ChunkStream, ContentBlock, MessageContent, ProviderResponse, Role, StreamChunk, TokenUsage};
use switchboard_core::{ProviderParameters, SwitchboardError, TransportError};

use super::{decode_error, stream_error};

/// Sent when the caller set no output limit; the API requires one.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Extended-thinking budget for a reasoning effort level.
fn thinking_budget(effort: &str) -> u32 {
    match effort.trim().to_ascii_lowercase().as_str() {
        "high" => 4096,
        "medium" => 2048,
        _ => 1024,
    }
}

fn text_block(text: &str, cache_control: Option<&switchboard_core::types::CacheControl>) -> Value {
    let mut block = json!({"type": "text", "text": text});
    if let Some(control) = cache_control {
        block["cache_control"] = json!(control);
    }
    block
}

/// `data:<media>;base64,<payload>` becomes a base64 source; anything else a URL source.
fn image_block(image_url: &Value) -> Option<Value> {
    let url = image_url.get("url").and_then(Value::as_str).or_else(|| image_url.as_str())?;
    let source = match url.strip_prefix("data:").and_then(|rest| rest.split_once(";base64,")) {
        Some((media_type, data)) => json!({"type": "base64", "media_type": media_type, "data": data}),
        None => json!({"type": "url", "url": url}),
    };
    Some(json!({"type": "image", "source": source}))
}

fn blocks(content: &MessageContent) -> Vec<Value> {
    match content {
        MessageContent::Text(text) if text.is_empty() => Vec::new(),
        MessageContent::Text(text) => vec![text_block(text, None)],
        MessageContent::Blocks(items) => items
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text, .. } if text.is_empty() => None,
                ContentBlock::Text { text, cache_control } => Some(text_block(text, cache_control.as_ref())),
                ContentBlock::ImageUrl { image_url } => image_block(image_url),
            })
            .collect(),
    }
}

/// Chat-completions `tool_calls` entries as `tool_use` blocks.
fn tool_use_blocks(calls: &Value) -> Vec<Value> {
    calls
        .as_array()
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let function = call.get("function")?;
                    let input = function
                        .get("arguments")
                        .and_then(Value::as_str)
                        .and_then(|args| serde_json::from_str(args).ok())
                        .unwrap_or_else(|| json!({}));
                    Some(json!({
                        "type": "tool_use",
                        "id": call.get("id").cloned().unwrap_or(Value::Null),
                        "name": function.get("name").cloned().unwrap_or(Value::Null),
                        "input": input,
                    }))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Chat-completions function definitions as Anthropic tool definitions.
fn tool_definition(tool: &Value) -> Value {
    match tool.get("function") {
        Some(function) => json!({
            "name": function.get("name").cloned().unwrap_or(Value::Null),
            "description": function.get("description").cloned().unwrap_or_else(|| json!("")),
            "input_schema": function
                .get("parameters")
                .cloned()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        }),
        None => tool.clone(),
    }
}

fn tool_choice(choice: &str) -> Value {
    match choice {
        "auto" => json!({"type": "auto"}),
        "required" | "any" => json!({"type": "any"}),
        "none" => json!({"type": "none"}),
        name => json!({"type": "tool", "name": name}),
    }
}

pub(super) fn request_body(params: &ProviderParameters) -> Value {
    let mut system = Vec::new();
    let mut messages = Vec::new();

    for message in &params.messages {
        match message.role {
            Role::System => system.extend(blocks(&message.content)),
            Role::Tool => messages.push(json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": message.tool_call_id,
                    "content": message.text(),
                }],
            })),
            Role::Assistant => {
                let mut content = blocks(&message.content);
                if let Some(calls) = &message.tool_calls {
                    content.extend(tool_use_blocks(calls));
                }
                messages.push(json!({"role": "assistant", "content": content}));
            }
            Role::User => {
                let content = match &message.content {
                    MessageContent::Text(text) => json!(text),
                    blocks_content => json!(blocks(blocks_content)),
                };
                messages.push(json!({"role": "user", "content": content}));
            }
        }
    }

    let mut max_tokens = params.token_limit.map_or(DEFAULT_MAX_TOKENS, |limit| limit.value);
    let mut body = json!({
        "model": params.bare_model(),
        "messages": messages,
        "temperature": params.temperature,
        "stream": params.stream,
    });
    if !system.is_empty() {
        body["system"] = json!(system);
    }
    if let Some(top_p) = params.top_p {
        body["top_p"] = json!(top_p);
    }
    if let Some(effort) = &params.reasoning_effort {
        let budget = thinking_budget(effort);
        if max_tokens <= budget {
            max_tokens = budget + DEFAULT_MAX_TOKENS;
        }
        body["thinking"] = json!({"type": "enabled", "budget_tokens": budget});
    }
    body["max_tokens"] = json!(max_tokens);
    if !params.tools.is_empty() {
        body["tools"] = Value::Array(params.tools.iter().map(tool_definition).collect());
        if let Some(choice) = &params.tool_choice {
            body["tool_choice"] = tool_choice(choice);
        }
    }
    body
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        TokenUsage {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    id: Option<String>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

fn tool_call(id: &str, name: &str, arguments: String) -> Value {
    json!({
        "id": id,
        "type": "function",
        "function": {"name": name, "arguments": arguments},
    })
}

pub(super) fn parse_response(body: &str) -> Result<ProviderResponse, TransportError> {
    let response: MessageResponse = serde_json::from_str(body).map_err(|e| decode_error("message response", e))?;

    let mut content = String::new();
    let mut tool_calls = Vec::new();
    for block in response.content {
        match block {
            ResponseBlock::Text { text } => content.push_str(&text),
            ResponseBlock::ToolUse { id, name, input } => tool_calls.push(tool_call(&id, &name, input.to_string())),
            ResponseBlock::Other => {}
        }
    }

    Ok(ProviderResponse {
        id: response.id,
        model: response.model,
        content,
        tool_calls,
        finish_reason: response.stop_reason,
        usage: response.usage.map(TokenUsage::from),
    })
}

// --- Streaming ---

#[derive(Debug, Deserialize)]
struct MessageStart {
    message: StartedMessage,
}

#[derive(Debug, Deserialize)]
struct StartedMessage {
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct BlockStart {
    index: u32,
    content_block: ResponseBlock,
}

#[derive(Debug, Deserialize)]
struct BlockDelta {
    index: u32,
    delta: Delta,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    delta: StopDelta,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct StopDelta {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEvent {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    type_: String,
    message: String,
}

fn parse<T: DeserializeOwned>(event: &str, data: &str) -> Result<T, SwitchboardError> {
    serde_json::from_str(data).map_err(|e| stream_error(format!("failed to parse {event}: {e}")))
}

/// Maps one named event to a chunk. Events that carry nothing for the caller yield `None`.
fn decode_event(event: &str, data: &str) -> Option<Result<StreamChunk, SwitchboardError>> {
    let chunk = match event {
        "message_start" => parse::<MessageStart>(event, data).map(|start| {
            start.message.usage.map(|usage| StreamChunk {
                usage: Some(usage.into()),
                ..Default::default()
            })
        }),
        "content_block_start" => parse::<BlockStart>(event, data).map(|start| match start.content_block {
            ResponseBlock::ToolUse { id, name, .. } => {
                let mut call = tool_call(&id, &name, String::new());
                call["index"] = json!(start.index);
                Some(StreamChunk {
                    tool_calls: vec![call],
                    ..Default::default()
                })
            }
            _ => None,
        }),
        "content_block_delta" => parse::<BlockDelta>(event, data).map(|delta| match delta.delta {
            Delta::TextDelta { text } => Some(StreamChunk::text(text)),
            Delta::InputJsonDelta { partial_json } => Some(StreamChunk {
                tool_calls: vec![json!({
                    "index": delta.index,
                    "function": {"arguments": partial_json},
                })],
                ..Default::default()
            }),
            Delta::Other => None,
        }),
        "message_delta" => parse::<MessageDelta>(event, data).map(|delta| {
            Some(StreamChunk {
                finish_reason: delta.delta.stop_reason,
                usage: delta.usage.map(TokenUsage::from),
                ..Default::default()
            })
        }),
        "error" => match parse::<ErrorEvent>(event, data) {
            Ok(e) => Err(stream_error(format!(
                "Anthropic API error ({}): {}",
                e.error.type_, e.error.message
            ))),
            Err(e) => Err(e),
        },
        // ping, content_block_stop, message_stop, and unknown future events
        _ => Ok(None),
    };
    chunk.transpose()
}

pub(super) fn parse_stream(response: reqwest::Response) -> ChunkStream {
    let chunks = response.bytes_stream().eventsource().filter_map(|result| async move {
        match result {
            Ok(event) => decode_event(&event.event, &event.data),
            Err(e) => Some(Err(stream_error(format!("SSE stream error: {e}")))),
        }
    });
    Box::pin(chunks)
}

#[cfg(test)]
mod tests {
    use switchboard_core::Message;
    use switchboard_core::types::CacheControl;

    use super::*;

    #[test]
    fn system_messages_become_top_level_blocks_with_cache_hints() {
        let mut system = Message::system("rules");
        system.content = MessageContent::Blocks(vec![ContentBlock::Text {
            text: "rules".into(),
            cache_control: Some(CacheControl::ephemeral()),
        }]);
        let params = ProviderParameters::new(
            "anthropic/claude-sonnet-4-20250514",
            vec![system, Message::user("hi")],
        );

        let body = request_body(&params);
        assert_eq!(body["system"][0]["cache_control"]["type"], "ephemeral");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["content"], "hi");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn reasoning_effort_enables_thinking_with_room_to_answer() {
        let mut params = ProviderParameters::new("anthropic/claude-3-7-sonnet-latest", vec![Message::user("why")]);
        params.reasoning_effort = Some("high".into());
        params.token_limit = Some(switchboard_core::types::TokenLimit {
            field: switchboard_core::types::TokenLimitField::MaxTokens,
            value: 1000,
        });

        let body = request_body(&params);
        assert_eq!(body["thinking"]["budget_tokens"], 4096);
        assert!(body["max_tokens"].as_u64().unwrap() > 4096);
    }

    #[test]
    fn tool_round_trip_uses_native_blocks() {
        let mut assistant = Message::assistant("");
        assistant.tool_calls = Some(json!([{
            "id": "call_1",
            "type": "function",
            "function": {"name": "lookup", "arguments": "{\"q\":\"rust\"}"}
        }]));
        let mut tool = Message::user("42");
        tool.role = Role::Tool;
        tool.tool_call_id = Some("call_1".into());

        let mut params = ProviderParameters::new("anthropic/claude-sonnet-4-20250514", vec![assistant, tool]);
        params.tools = vec![json!({"type": "function", "function": {"name": "lookup", "parameters": {"type": "object"}}})];
        params.tool_choice = Some("auto".into());

        let body = request_body(&params);
        assert_eq!(body["messages"][0]["content"][0]["type"], "tool_use");
        assert_eq!(body["messages"][0]["content"][0]["input"]["q"], "rust");
        assert_eq!(body["messages"][1]["content"][0]["tool_use_id"], "call_1");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
        assert_eq!(body["tool_choice"]["type"], "auto");
    }

    #[test]
    fn data_url_images_become_base64_sources() {
        let block = image_block(&json!({"url": "data:image/png;base64,AAAA"})).unwrap();
        assert_eq!(block["source"]["media_type"], "image/png");
        let remote = image_block(&json!({"url": "https://example.com/cat.png"})).unwrap();
        assert_eq!(remote["source"]["type"], "url");
    }

    #[test]
    fn response_tool_use_is_reported_as_tool_call() {
        let body = json!({
            "id": "msg_1",
            "model": "claude",
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "x"},
                {"type": "text", "text": "Looking up."},
                {"type": "tool_use", "id": "tu_1", "name": "lookup", "input": {"q": "rust"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 5, "output_tokens": 7}
        })
        .to_string();

        let response = parse_response(&body).unwrap();
        assert_eq!(response.content, "Looking up.");
        assert_eq!(response.tool_calls[0]["function"]["name"], "lookup");
        assert_eq!(response.tool_calls[0]["function"]["arguments"], "{\"q\":\"rust\"}");
    }

    #[test]
    fn stream_events_map_to_chunks() {
        let text = decode_event(
            "content_block_delta",
            r#"{"index":0,"delta":{"type":"text_delta","text":"Hello"}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(text.text.as_deref(), Some("Hello"));

        let stop = decode_event(
            "message_delta",
            r#"{"delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":25}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(stop.finish_reason.as_deref(), Some("end_turn"));
        assert_eq!(stop.usage.unwrap().output_tokens, 25);

        assert!(decode_event("ping", "{}").is_none());
        assert!(decode_event("some_future_event", r#"{"x":1}"#).is_none());
        assert!(decode_event(
            "error",
            r#"{"error":{"type":"overloaded_error","message":"Overloaded"}}"#
        )
        .unwrap()
        .is_err());
    }
}
