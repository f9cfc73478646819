// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-completions wire format (OpenAI, Groq, OpenRouter).

use eventsource_stream::Eventsource;
use futures::StreamExt;
use futures::future;
use serde::Deserialize;
use serde_json::{Value, json};
use switchboard_core::types::{ChunkStream, ProviderResponse, StreamChunk, TokenUsage};
use switchboard_core::{ProviderParameters, SwitchboardError, TransportError};

use super::{decode_error, stream_error};

pub(super) fn request_body(params: &ProviderParameters) -> Value {
    let mut body = json!({
        "model": params.bare_model(),
        "messages": params.messages,
        "temperature": params.temperature,
        "stream": params.stream,
    });
    if let Some(top_p) = params.top_p {
        body["top_p"] = json!(top_p);
    }
    if let Some(limit) = params.token_limit {
        body[limit.field.to_string()] = json!(limit.value);
    }
    if !params.tools.is_empty() {
        body["tools"] = json!(params.tools);
        if let Some(choice) = &params.tool_choice {
            body["tool_choice"] = json!(choice);
        }
    }
    if let Some(format) = &params.response_format {
        body["response_format"] = format.clone();
    }
    if let Some(effort) = &params.reasoning_effort {
        body["reasoning_effort"] = json!(effort);
    }
    if params.stream {
        body["stream_options"] = json!({"include_usage": true});
    }
    body
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    id: Option<String>,
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<Value>,
}

pub(super) fn parse_response(body: &str) -> Result<ProviderResponse, TransportError> {
    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(|e| decode_error("chat completion", e))?;
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TransportError::transient("chat completion had no choices"))?;

    Ok(ProviderResponse {
        id: completion.id,
        model: completion.model,
        content: choice.message.content.unwrap_or_default(),
        tool_calls: choice.message.tool_calls,
        finish_reason: choice.finish_reason,
        usage: completion.usage.map(TokenUsage::from),
    })
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    usage: Option<Usage>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<Value>,
}

/// Decodes one `data:` payload. Keep-alive chunks with nothing in them yield `None`.
fn decode_chunk(data: &str) -> Result<Option<StreamChunk>, SwitchboardError> {
    let chunk: CompletionChunk = serde_json::from_str(data)
        .map_err(|e| stream_error(format!("failed to parse stream chunk: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(stream_error(format!("provider error mid-stream: {error}")));
    }

    let mut out = StreamChunk {
        usage: chunk.usage.map(TokenUsage::from),
        ..Default::default()
    };
    if let Some(choice) = chunk.choices.into_iter().next() {
        out.text = choice.delta.content.filter(|t| !t.is_empty());
        out.tool_calls = choice.delta.tool_calls;
        out.finish_reason = choice.finish_reason;
    }

    let empty = out.text.is_none() && out.tool_calls.is_empty() && out.finish_reason.is_none() && out.usage.is_none();
    Ok((!empty).then_some(out))
}

/// Reads server-sent chunks until the `[DONE]` sentinel.
pub(super) fn parse_stream(response: reqwest::Response) -> ChunkStream {
    let chunks = response
        .bytes_stream()
        .eventsource()
        .take_while(|result| future::ready(!matches!(result, Ok(event) if event.data.trim() == "[DONE]")))
        .filter_map(|result| async move {
            match result {
                Ok(event) => decode_chunk(&event.data).transpose(),
                Err(e) => Some(Err(stream_error(format!("SSE stream error: {e}")))),
            }
        });
    Box::pin(chunks)
}
