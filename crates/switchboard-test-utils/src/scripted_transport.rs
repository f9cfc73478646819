// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider transport that replays scripted per-attempt results.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use switchboard_core::types::{ChunkStream, ProviderResponse, StreamChunk, TokenUsage};
use switchboard_core::{ProviderParameters, ProviderTransport, TransportError};

/// One scripted attempt.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    /// Succeed with this text. Streams split it into one chunk per word.
    Reply(String),
    /// Fail the attempt.
    Fail(TransportError),
    /// Stream these chunks, then never finish.
    Hang(Vec<String>),
}

/// A transport whose attempts are answered from a FIFO script.
///
/// When the script runs out, every further attempt replies `"mock response"`.
/// Every set of parameters it receives is kept for later inspection.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<ScriptedTurn>>,
    seen: Mutex<Vec<ProviderParameters>>,
    attempts: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(turns: impl IntoIterator<Item = ScriptedTurn>) -> Self {
        Self {
            script: Mutex::new(turns.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Script that fails with each error in turn, then replies with `reply`.
    pub fn failing_then(errors: impl IntoIterator<Item = TransportError>, reply: &str) -> Self {
        let mut turns: Vec<ScriptedTurn> = errors.into_iter().map(ScriptedTurn::Fail).collect();
        turns.push(ScriptedTurn::Reply(reply.to_string()));
        Self::new(turns)
    }

    /// Script that fails every attempt with `error`.
    pub fn always_failing(error: TransportError, attempts: usize) -> Self {
        Self::new(std::iter::repeat_n(ScriptedTurn::Fail(error), attempts))
    }

    /// Number of attempts made so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Parameters received, in attempt order.
    pub fn seen(&self) -> Vec<ProviderParameters> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn next_turn(&self, params: &ProviderParameters) -> ScriptedTurn {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(params.clone());
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| ScriptedTurn::Reply("mock response".to_string()))
    }
}

fn word_chunks(text: &str) -> Vec<StreamChunk> {
    text.split_inclusive(' ').map(StreamChunk::text).collect()
}

#[async_trait]
impl ProviderTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, params: &ProviderParameters) -> Result<ProviderResponse, TransportError> {
        match self.next_turn(params) {
            ScriptedTurn::Reply(text) => Ok(ProviderResponse {
                id: Some(format!("scripted-{}", self.attempts())),
                model: params.model.clone(),
                content: text,
                tool_calls: Vec::new(),
                finish_reason: Some("stop".to_string()),
                usage: Some(TokenUsage {
                    input_tokens: 10,
                    output_tokens: 20,
                }),
            }),
            ScriptedTurn::Hang(chunks) => Ok(ProviderResponse {
                id: None,
                model: params.model.clone(),
                content: chunks.concat(),
                tool_calls: Vec::new(),
                finish_reason: None,
                usage: None,
            }),
            ScriptedTurn::Fail(err) => Err(err),
        }
    }

    async fn stream(&self, params: &ProviderParameters) -> Result<ChunkStream, TransportError> {
        match self.next_turn(params) {
            ScriptedTurn::Reply(text) => {
                let mut chunks = word_chunks(&text);
                chunks.push(StreamChunk {
                    finish_reason: Some("stop".to_string()),
                    ..Default::default()
                });
                Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
            }
            ScriptedTurn::Hang(texts) => {
                let head = stream::iter(texts.into_iter().map(|t| Ok(StreamChunk::text(t))));
                Ok(Box::pin(head.chain(stream::pending())))
            }
            ScriptedTurn::Fail(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ProviderParameters {
        ProviderParameters::new("openai/gpt-4o", Vec::new())
    }

    #[tokio::test]
    async fn replays_script_in_order_then_defaults() {
        let transport =
            ScriptedTransport::failing_then([TransportError::transient("boom")], "done");

        assert!(transport.complete(&params()).await.is_err());
        assert_eq!(transport.complete(&params()).await.unwrap().content, "done");
        assert_eq!(
            transport.complete(&params()).await.unwrap().content,
            "mock response"
        );
        assert_eq!(transport.attempts(), 3);
        assert_eq!(transport.seen().len(), 3);
    }

    #[tokio::test]
    async fn stream_splits_reply_into_words() {
        let transport = ScriptedTransport::new([ScriptedTurn::Reply("hello big world".into())]);
        let mut p = params();
        p.stream = true;

        let chunks: Vec<_> = transport.stream(&p).await.unwrap().collect().await;
        let text: String = chunks
            .iter()
            .filter_map(|c| c.as_ref().ok().and_then(|c| c.text.clone()))
            .collect();
        assert_eq!(text, "hello big world");
        assert_eq!(chunks.len(), 4);
    }
}
