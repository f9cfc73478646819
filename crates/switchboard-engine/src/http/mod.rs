// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP provider transport.
//!
//! [`HttpTransport`] picks a wire codec from the resolved provider family,
//! makes one request, and sorts failures into [`TransportError`] kinds.
//! OpenAI, Groq, and OpenRouter share the chat-completions codec; Anthropic
//! and Ollama have their own.

mod anthropic;
pub(crate) mod ndjson;
mod ollama;
mod openai;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use switchboard_config::model::ProvidersConfig;
use switchboard_core::types::{ChunkStream, ProviderResponse};
use switchboard_core::{ProviderFamily, ProviderParameters, ProviderTransport, SwitchboardError, TransportError};
use tracing::debug;

/// Wire codec selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    ChatCompletions,
    Messages,
    OllamaChat,
}

/// Where and how to send one request.
struct Endpoint {
    codec: Codec,
    url: String,
    headers: HeaderMap,
}

/// Talks to provider HTTP APIs. One instance serves every family.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    providers: ProvidersConfig,
}

impl HttpTransport {
    /// Creates a transport using the credentials and base URLs in `providers`.
    pub fn new(providers: ProvidersConfig) -> Result<Self, SwitchboardError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(providers.request_timeout_secs))
            .build()
            .map_err(|e| SwitchboardError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client, providers })
    }

    fn endpoint(&self, params: &ProviderParameters) -> Result<Endpoint, TransportError> {
        let family = params.family().ok_or_else(|| TransportError::ProviderMissing {
            model: params.model.clone(),
        })?;
        let p = &self.providers;
        let base = |configured: &str| {
            params
                .api_base
                .as_deref()
                .unwrap_or(configured)
                .trim_end_matches('/')
                .to_string()
        };
        let key = |configured: &Option<String>| {
            params
                .api_key
                .clone()
                .or_else(|| configured.clone())
                .filter(|k| !k.trim().is_empty())
        };

        let mut headers = HeaderMap::new();
        let (codec, url) = match family {
            ProviderFamily::OpenAi => {
                bearer(&mut headers, family, key(&p.openai_api_key))?;
                (Codec::ChatCompletions, format!("{}/chat/completions", base(&p.openai_api_base)))
            }
            ProviderFamily::Groq => {
                bearer(&mut headers, family, key(&p.groq_api_key))?;
                (Codec::ChatCompletions, format!("{}/chat/completions", base(&p.groq_api_base)))
            }
            ProviderFamily::OpenRouter => {
                bearer(&mut headers, family, key(&p.openrouter_api_key))?;
                (Codec::ChatCompletions, format!("{}/chat/completions", base(&p.openrouter_api_base)))
            }
            ProviderFamily::Anthropic => {
                let api_key = key(&p.anthropic_api_key).ok_or_else(|| missing_key(family))?;
                insert(&mut headers, "x-api-key", &api_key)?;
                insert(&mut headers, "anthropic-version", &p.anthropic_version)?;
                (Codec::Messages, format!("{}/v1/messages", base(&p.anthropic_api_base)))
            }
            ProviderFamily::Ollama => (Codec::OllamaChat, format!("{}/api/chat", base(&p.ollama_api_base))),
            ProviderFamily::Bedrock => {
                return Err(TransportError::rejected(
                    "bedrock models require AWS request signing; supply a custom transport",
                ));
            }
        };

        for (name, value) in &params.headers {
            insert(&mut headers, name, value)?;
        }
        Ok(Endpoint { codec, url, headers })
    }

    async fn send(&self, params: &ProviderParameters) -> Result<(Codec, reqwest::Response), TransportError> {
        let endpoint = self.endpoint(params)?;
        let body = match endpoint.codec {
            Codec::ChatCompletions => openai::request_body(params),
            Codec::Messages => anthropic::request_body(params),
            Codec::OllamaChat => ollama::request_body(params),
        };

        let response = self
            .client
            .post(&endpoint.url)
            .headers(endpoint.headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, url = %endpoint.url, stream = params.stream, "provider response received");
        if status.is_success() {
            return Ok((endpoint.codec, response));
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

#[async_trait]
impl ProviderTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn complete(&self, params: &ProviderParameters) -> Result<ProviderResponse, TransportError> {
        let (codec, response) = self.send(params).await?;
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::transient(format!("failed to read response body: {e}")))?;
        match codec {
            Codec::ChatCompletions => openai::parse_response(&body),
            Codec::Messages => anthropic::parse_response(&body),
            Codec::OllamaChat => ollama::parse_response(&body),
        }
    }

    async fn stream(&self, params: &ProviderParameters) -> Result<ChunkStream, TransportError> {
        let (codec, response) = self.send(params).await?;
        Ok(match codec {
            Codec::ChatCompletions => openai::parse_stream(response),
            Codec::Messages => anthropic::parse_stream(response),
            Codec::OllamaChat => ollama::parse_stream(response),
        })
    }
}

fn bearer(headers: &mut HeaderMap, family: ProviderFamily, key: Option<String>) -> Result<(), TransportError> {
    let key = key.ok_or_else(|| missing_key(family))?;
    insert(headers, "authorization", &format!("Bearer {key}"))
}

fn missing_key(family: ProviderFamily) -> TransportError {
    TransportError::rejected(format!("no API key configured for {family}"))
}

fn insert(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), TransportError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| TransportError::rejected(format!("invalid header name `{name}`: {e}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| TransportError::rejected(format!("invalid value for header `{name}`: {e}")))?;
    headers.insert(name, value);
    Ok(())
}

/// Error envelope shared by OpenAI-style and Anthropic APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorBody {
    Detailed {
        message: String,
        #[serde(rename = "type", default)]
        type_: Option<String>,
    },
    Plain(String),
}

/// Maps a non-success status to a retry-taxonomy error.
fn status_error(status: StatusCode, body: &str) -> TransportError {
    let message = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(ApiErrorResponse {
            error: ApiErrorBody::Detailed { message, type_: Some(kind) },
        }) => format!("API returned {status} ({kind}): {message}"),
        Ok(ApiErrorResponse {
            error: ApiErrorBody::Detailed { message, .. } | ApiErrorBody::Plain(message),
        }) => format!("API returned {status}: {message}"),
        Err(_) => format!("API returned {status}: {body}"),
    };

    match status.as_u16() {
        429 => TransportError::RateLimited { message },
        code if is_transient_status(code) => TransportError::Transient { message },
        code => TransportError::NonRetryable {
            message,
            status: Some(code),
        },
    }
}

/// Status codes that are worth another attempt after the regular delay.
fn is_transient_status(code: u16) -> bool {
    matches!(code, 408 | 500 | 502 | 503 | 504 | 529)
}

/// Malformed provider JSON counts as transient.
pub(crate) fn decode_error(what: &str, e: serde_json::Error) -> TransportError {
    TransportError::transient(format!("failed to parse {what}: {e}"))
}

/// Mid-stream failures surface as stream items.
pub(crate) fn stream_error(message: impl Into<String>) -> SwitchboardError {
    SwitchboardError::Provider {
        message: message.into(),
        source: None,
    }
}
