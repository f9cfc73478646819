// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Native chat API of the local inference server.

use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use switchboard_core::types::{ChunkStream, ProviderResponse, StreamChunk, TokenUsage};
use switchboard_core::{ProviderParameters, SwitchboardError, TransportError};
use tracing::warn;

use super::{decode_error, ndjson, stream_error};

/// `response_format` in chat-completions shape mapped to the server's `format` field.
fn format_field(response_format: &Value) -> Option<Value> {
    match response_format.get("type").and_then(Value::as_str) {
        Some("json_object") => Some(json!("json")),
        Some("json_schema") => response_format
            .pointer("/json_schema/schema")
            .cloned(),
        _ => None,
    }
}

pub(super) fn request_body(params: &ProviderParameters) -> Value {
    let messages: Vec<Value> = params
        .messages
        .iter()
        .map(|message| {
            let mut out = json!({"role": message.role, "content": message.text()});
            if let Some(calls) = &message.tool_calls {
                out["tool_calls"] = calls.clone();
            }
            out
        })
        .collect();

    let mut options = json!({"temperature": params.temperature});
    if let Some(top_p) = params.top_p {
        options["top_p"] = json!(top_p);
    }
    if let Some(limit) = params.token_limit {
        options["num_predict"] = json!(limit.value);
    }

    let mut body = json!({
        "model": params.bare_model(),
        "messages": messages,
        "stream": params.stream,
        "options": options,
    });
    if !params.tools.is_empty() {
        body["tools"] = json!(params.tools);
    }
    if let Some(format) = params.response_format.as_ref().and_then(format_field) {
        body["format"] = format;
    }
    body
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    message: Option<ChatMessage>,
    #[serde(default)]
    done: bool,
    done_reason: Option<String>,
    prompt_eval_count: Option<u32>,
    eval_count: Option<u32>,
    error: Option<String>,
}

impl ChatResponse {
    fn usage(&self) -> Option<TokenUsage> {
        (self.prompt_eval_count.is_some() || self.eval_count.is_some()).then(|| TokenUsage {
            input_tokens: self.prompt_eval_count.unwrap_or_default(),
            output_tokens: self.eval_count.unwrap_or_default(),
        })
    }
}

pub(super) fn parse_response(body: &str) -> Result<ProviderResponse, TransportError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| decode_error("chat response", e))?;
    if let Some(error) = response.error {
        return Err(TransportError::transient(format!("local server error: {error}")));
    }

    let usage = response.usage();
    let message = response.message.unwrap_or(ChatMessage {
        content: String::new(),
        tool_calls: Vec::new(),
    });
    Ok(ProviderResponse {
        id: None,
        model: response.model,
        content: message.content,
        tool_calls: message.tool_calls,
        finish_reason: response.done_reason.or_else(|| response.done.then(|| "stop".to_string())),
        usage,
    })
}

fn decode_line(line: &str) -> Option<Result<StreamChunk, SwitchboardError>> {
    let response: ChatResponse = match serde_json::from_str(line) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "skipping malformed stream line from local server");
            return None;
        }
    };
    if let Some(error) = &response.error {
        return Some(Err(stream_error(format!("local server error: {error}"))));
    }

    let usage = if response.done { response.usage() } else { None };
    let finish_reason = if response.done {
        response.done_reason.clone().or_else(|| Some("stop".to_string()))
    } else {
        None
    };
    let (text, tool_calls) = match response.message {
        Some(message) => ((!message.content.is_empty()).then_some(message.content), message.tool_calls),
        None => (None, Vec::new()),
    };

    let chunk = StreamChunk {
        text,
        tool_calls,
        finish_reason,
        usage,
    };
    let empty = chunk.text.is_none() && chunk.tool_calls.is_empty() && chunk.finish_reason.is_none();
    (!empty).then_some(Ok(chunk))
}

pub(super) fn parse_stream(response: reqwest::Response) -> ChunkStream {
    let chunks = ndjson::lines(response).filter_map(|line| async move {
        match line {
            Ok(line) => decode_line(&line),
            Err(e) => Some(Err(stream_error(format!("stream read failed: {e}")))),
        }
    });
    Box::pin(chunks)
}
