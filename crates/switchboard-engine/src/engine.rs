// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invocation engine: bounded retries with fixed backoff and caller cancellation.
//!
//! The engine owns the retry loop. Transports make exactly one attempt and
//! classify their own failures, so the loop only has to look at the
//! [`Outcome`] of each attempt.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use switchboard_core::types::{ChunkStream, ProviderResponse, TokenUsage};
use switchboard_core::{ProviderFamily, ProviderParameters, ProviderTransport, SwitchboardError, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::retry::{Outcome, RetryPolicy};

/// Response of a successful attempt.
pub enum InvocationOutput {
    Complete(ProviderResponse),
    /// Ends early, without an error item, once the caller cancels.
    Stream(ChunkStream),
}

impl fmt::Debug for InvocationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationOutput::Complete(response) => f.debug_tuple("Complete").field(response).finish(),
            InvocationOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl InvocationOutput {
    /// Drains a stream into a single response. Complete responses pass through.
    pub async fn into_response(self, model: &str) -> Result<ProviderResponse, SwitchboardError> {
        let mut stream = match self {
            InvocationOutput::Complete(response) => return Ok(response),
            InvocationOutput::Stream(stream) => stream,
        };

        let mut response = ProviderResponse {
            id: None,
            model: model.to_string(),
            content: String::new(),
            tool_calls: Vec::new(),
            finish_reason: None,
            usage: None,
        };
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(text) = chunk.text {
                response.content.push_str(&text);
            }
            response.tool_calls.extend(chunk.tool_calls);
            if chunk.finish_reason.is_some() {
                response.finish_reason = chunk.finish_reason;
            }
            if let Some(usage) = chunk.usage {
                let total = response.usage.get_or_insert_with(TokenUsage::default);
                total.input_tokens = total.input_tokens.max(usage.input_tokens);
                total.output_tokens = total.output_tokens.max(usage.output_tokens);
            }
        }
        Ok(response)
    }
}

/// A finished invocation.
#[derive(Debug)]
pub struct Invocation {
    pub output: InvocationOutput,
    /// Model identifier actually sent, after any prefix correction.
    pub model: String,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
}

/// Executes adapted requests against a [`ProviderTransport`].
pub struct InvocationEngine {
    transport: Arc<dyn ProviderTransport>,
    policy: RetryPolicy,
    local_forced: bool,
}

impl InvocationEngine {
    pub fn new(transport: Arc<dyn ProviderTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            local_forced: false,
        }
    }

    /// Route prefix corrections to the local server instead of OpenAI.
    pub fn with_local_provider(mut self, forced: bool) -> Self {
        self.local_forced = forced;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Runs `params` until an attempt succeeds, a non-retryable error occurs,
    /// the attempt budget is spent, or `cancel` fires.
    ///
    /// A "provider missing" answer is corrected once by prefixing the model
    /// and retried immediately; the correction does not use up an attempt.
    pub async fn invoke(
        &self,
        mut params: ProviderParameters,
        cancel: &CancellationToken,
    ) -> Result<Invocation, SwitchboardError> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;
        let mut corrected = false;
        let mut last_error = None;

        while attempt < max_attempts {
            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(attempt - 1)),
                result = self.attempt(&params) => result,
            };

            let error = match Outcome::from(result) {
                Outcome::Success(output) => {
                    debug!(model = %params.model, attempt, "provider call succeeded");
                    let output = match output {
                        InvocationOutput::Stream(stream) => InvocationOutput::Stream(Box::pin(
                            stream.take_until(cancel.clone().cancelled_owned()),
                        )),
                        complete => complete,
                    };
                    return Ok(Invocation {
                        output,
                        model: params.model,
                        attempts: attempt,
                    });
                }
                Outcome::ProviderMissing(model) if !corrected => {
                    corrected = true;
                    attempt -= 1;
                    let fixed = self.corrected_model(&params.model);
                    warn!(model = %model, corrected = %fixed, "model has no provider prefix, correcting");
                    params.model = fixed;
                    params.provider = None;
                    continue;
                }
                Outcome::ProviderMissing(model) => {
                    return Err(TransportError::ProviderMissing { model }.into());
                }
                Outcome::Fatal(e) => {
                    warn!(model = %params.model, attempt, error = %e, "provider rejected request");
                    return Err(e.into());
                }
                Outcome::RateLimited(e) | Outcome::Transient(e) => e,
            };

            if attempt < max_attempts {
                let delay = self.policy.delay_for(&error);
                warn!(
                    model = %params.model,
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %error,
                    "provider call failed, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(self.cancelled(attempt)),
                    _ = tokio::time::sleep(delay) => {}
                }
            } else {
                warn!(model = %params.model, attempt, error = %error, "provider call failed, no attempts left");
            }
            last_error = Some(error);
        }

        Err(SwitchboardError::RetryExhausted {
            attempts: max_attempts,
            last_error: last_error.unwrap_or_else(|| TransportError::transient("no attempt was made")),
        })
    }

    /// [`invoke`](Self::invoke) with an overall deadline.
    pub async fn invoke_with_timeout(
        &self,
        params: ProviderParameters,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<Invocation, SwitchboardError> {
        match tokio::time::timeout(timeout, self.invoke(params, cancel)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs_f64(), "invocation deadline elapsed");
                Err(SwitchboardError::Timeout { duration: timeout })
            }
        }
    }

    async fn attempt(&self, params: &ProviderParameters) -> Result<InvocationOutput, TransportError> {
        if params.stream {
            self.transport.stream(params).await.map(InvocationOutput::Stream)
        } else {
            self.transport.complete(params).await.map(InvocationOutput::Complete)
        }
    }

    fn corrected_model(&self, model: &str) -> String {
        let family = if self.local_forced {
            ProviderFamily::Ollama
        } else {
            ProviderFamily::OpenAi
        };
        format!("{}/{model}", family.prefix())
    }

    fn cancelled(&self, attempts: u32) -> SwitchboardError {
        info!(attempts, transport = self.transport.name(), "invocation cancelled");
        SwitchboardError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use switchboard_core::Message;
    use switchboard_test_utils::{ScriptedTransport, ScriptedTurn};
    use tokio::time::Instant;

    use super::*;

    fn params(model: &str) -> ProviderParameters {
        ProviderParameters::new(model, vec![Message::user("hello")])
    }

    fn engine(transport: &Arc<ScriptedTransport>) -> InvocationEngine {
        InvocationEngine::new(transport.clone(), RetryPolicy::default())
    }

    fn complete(invocation: Invocation) -> ProviderResponse {
        match invocation.output {
            InvocationOutput::Complete(response) => response,
            other => panic!("expected complete response, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_back_off_then_succeed() {
        let transport = Arc::new(ScriptedTransport::failing_then(
            [TransportError::transient("reset"), TransportError::transient("502")],
            "done",
        ));
        let start = Instant::now();

        let invocation = engine(&transport)
            .invoke(params("openai/gpt-4o"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(invocation.attempts, 3);
        assert_eq!(transport.attempts(), 3);
        assert_eq!(complete(invocation).content, "done");
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_exhaust_the_budget() {
        let limited = TransportError::RateLimited {
            message: "429 Too Many Requests".into(),
        };
        let transport = Arc::new(ScriptedTransport::always_failing(limited.clone(), 5));
        let start = Instant::now();

        let err = engine(&transport)
            .invoke(params("openai/gpt-4o"), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            SwitchboardError::RetryExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error, limited);
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
        assert_eq!(transport.attempts(), 3);
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_error_names_attempts_and_last_error() {
        let transport = Arc::new(ScriptedTransport::always_failing(
            TransportError::transient("connection reset"),
            3,
        ));
        let err = engine(&transport)
            .invoke(params("openai/gpt-4o"), &CancellationToken::new())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("after 3 attempts"), "got: {err}");
        assert!(err.contains("connection reset"), "got: {err}");
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_fails_immediately() {
        let transport = Arc::new(ScriptedTransport::always_failing(
            TransportError::NonRetryable {
                message: "invalid api key".into(),
                status: Some(401),
            },
            3,
        ));
        let start = Instant::now();

        let err = engine(&transport)
            .invoke(params("openai/gpt-4o"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SwitchboardError::NonRetryable { .. }));
        assert_eq!(transport.attempts(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_stops_further_attempts() {
        let transport = Arc::new(ScriptedTransport::always_failing(
            TransportError::RateLimited {
                message: "slow down".into(),
            },
            3,
        ));
        let engine = engine(&transport);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let canceller = async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(engine.invoke(params("openai/gpt-4o"), &cancel), canceller);

        assert!(matches!(result, Err(SwitchboardError::Cancelled)));
        assert_eq!(transport.attempts(), 1);
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    #[tokio::test]
    async fn already_cancelled_token_makes_no_attempt() {
        let transport = Arc::new(ScriptedTransport::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine(&transport).invoke(params("openai/gpt-4o"), &cancel).await;
        assert!(matches!(result, Err(SwitchboardError::Cancelled)));
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_provider_is_corrected_once_without_using_an_attempt() {
        let transport = Arc::new(ScriptedTransport::new([
            ScriptedTurn::Fail(TransportError::ProviderMissing {
                model: "gpt-4o".into(),
            }),
            ScriptedTurn::Reply("fixed".into()),
        ]));

        let invocation = engine(&transport)
            .invoke(params("gpt-4o"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(invocation.model, "openai/gpt-4o");
        assert_eq!(invocation.attempts, 1);
        let seen = transport.seen();
        assert_eq!(seen[0].model, "gpt-4o");
        assert_eq!(seen[1].model, "openai/gpt-4o");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_provider_correction_prefers_forced_local_server() {
        let transport = Arc::new(ScriptedTransport::new([ScriptedTurn::Fail(
            TransportError::ProviderMissing {
                model: "mystery".into(),
            },
        )]));

        let invocation = engine(&transport)
            .with_local_provider(true)
            .invoke(params("mystery"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(invocation.model, "ollama/mystery");
    }

    #[tokio::test(start_paused = true)]
    async fn missing_provider_twice_is_non_retryable() {
        let missing = TransportError::ProviderMissing {
            model: "gpt-4o".into(),
        };
        let transport = Arc::new(ScriptedTransport::always_failing(missing, 3));

        let err = engine(&transport)
            .invoke(params("gpt-4o"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::NonRetryable { .. }));
        assert_eq!(transport.attempts(), 2);
    }

    #[tokio::test]
    async fn streams_are_delivered_in_order() {
        let transport = Arc::new(ScriptedTransport::new([ScriptedTurn::Reply(
            "one two three".into(),
        )]));
        let mut p = params("openai/gpt-4o");
        p.stream = true;

        let invocation = engine(&transport).invoke(p, &CancellationToken::new()).await.unwrap();
        let response = invocation.output.into_response("openai/gpt-4o").await.unwrap();
        assert_eq!(response.content, "one two three");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn cancelling_ends_an_open_stream() {
        let transport = Arc::new(ScriptedTransport::new([ScriptedTurn::Hang(vec![
            "partial ".into(),
            "answer".into(),
        ])]));
        let cancel = CancellationToken::new();
        let mut p = params("openai/gpt-4o");
        p.stream = true;

        let invocation = engine(&transport).invoke(p, &cancel).await.unwrap();
        let InvocationOutput::Stream(mut stream) = invocation.output else {
            panic!("expected a stream");
        };

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text.as_deref(), Some("partial "));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.text.as_deref(), Some("answer"));

        cancel.cancel();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_turns_into_timeout_error() {
        let transport = Arc::new(ScriptedTransport::always_failing(
            TransportError::transient("reset"),
            3,
        ));
        let err = engine(&transport)
            .invoke_with_timeout(
                params("openai/gpt-4o"),
                &CancellationToken::new(),
                Duration::from_secs(7),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::Timeout { .. }));
    }
}
