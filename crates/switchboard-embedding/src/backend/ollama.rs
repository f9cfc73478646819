// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local inference server embeddings (`POST /api/embeddings`).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_core::{EmbeddingBackend, SwitchboardError};
use tracing::debug;

use super::{http_client, request_error};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Embeddings from an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, SwitchboardError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, SwitchboardError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| request_error("ollama", e))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "ollama embedding response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Embedding {
                message: format!("ollama returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| request_error("ollama", e))?;
        if parsed.embedding.is_empty() {
            return Err(SwitchboardError::Embedding {
                message: "ollama returned an empty embedding".into(),
                source: None,
            });
        }
        Ok(parsed.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embed_posts_model_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_json(serde_json::json!({
                "model": "mxbai-embed-large:latest",
                "prompt": "hello"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embedding": [0.5, -0.5, 1.0]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(
            &format!("{}/", server.uri()),
            "mxbai-embed-large:latest",
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(embedder.embed("hello").await.unwrap(), vec![0.5, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), "missing", Duration::from_secs(5)).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn empty_embedding_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), "m", Duration::from_secs(5)).unwrap();
        assert!(embedder.embed("hello").await.is_err());
    }
}
