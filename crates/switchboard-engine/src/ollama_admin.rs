// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model management on the local inference server: list and pull.

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use switchboard_core::SwitchboardError;
use tracing::{debug, info, warn};

use crate::http::ndjson;

/// A model installed on the local server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<LocalModel>,
}

/// One progress line of a model pull.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullProgress {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub completed: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PullProgress {
    /// Completion percentage when the server reported sizes.
    pub fn percent(&self) -> Option<f64> {
        match (self.completed, self.total) {
            (Some(done), Some(total)) if total > 0 => Some(done as f64 * 100.0 / total as f64),
            _ => None,
        }
    }
}

/// Stream of pull progress updates.
pub type PullStream = Pin<Box<dyn Stream<Item = Result<PullProgress, SwitchboardError>> + Send>>;

/// Client for the local server's model management endpoints.
#[derive(Debug, Clone)]
pub struct OllamaAdmin {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaAdmin {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SwitchboardError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| provider_error("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Models currently installed, as reported by `/api/tags`.
    pub async fn list_models(&self) -> Result<Vec<LocalModel>, SwitchboardError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| provider_error("failed to reach local server", e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Provider {
                message: format!("listing models returned {status}: {body}"),
                source: None,
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| provider_error("invalid model list", e))?;
        debug!(count = tags.models.len(), "listed local models");
        Ok(tags.models)
    }

    /// Whether `model` is installed. A bare name also matches its `:latest` tag.
    pub async fn has_model(&self, model: &str) -> Result<bool, SwitchboardError> {
        let latest = format!("{model}:latest");
        Ok(self
            .list_models()
            .await?
            .iter()
            .any(|m| m.name == model || m.name == latest))
    }

    /// Starts pulling `model` and streams progress lines.
    ///
    /// Lines that are not valid JSON are skipped. A line carrying an `error`
    /// ends the pull with that error.
    pub async fn pull_model(&self, model: &str) -> Result<PullStream, SwitchboardError> {
        let url = format!("{}/api/pull", self.base_url);
        info!(model, "pulling model on local server");
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({"name": model}))
            .send()
            .await
            .map_err(|e| provider_error("failed to reach local server", e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwitchboardError::Provider {
                message: format!("pulling {model} returned {status}: {body}"),
                source: None,
            });
        }

        let progress = ndjson::lines(response).filter_map(|line| async move {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(provider_error("pull stream failed", e))),
            };
            match serde_json::from_str::<PullProgress>(&line) {
                Ok(PullProgress { error: Some(error), .. }) => Some(Err(SwitchboardError::Provider {
                    message: format!("pull failed: {error}"),
                    source: None,
                })),
                Ok(progress) => Some(Ok(progress)),
                Err(e) => {
                    warn!(error = %e, line = %line, "skipping malformed pull progress line");
                    None
                }
            }
        });
        Ok(Box::pin(progress))
    }
}

fn provider_error(context: &str, e: reqwest::Error) -> SwitchboardError {
    SwitchboardError::Provider {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn admin(server: &MockServer) -> OllamaAdmin {
        OllamaAdmin::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn lists_installed_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "qwen3:32b", "size": 20000000000u64, "digest": "abc"},
                    {"name": "nomic-embed-text:latest", "size": 274000000}
                ]
            })))
            .mount(&server)
            .await;

        let admin = admin(&server);
        let models = admin.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "qwen3:32b");
        assert!(admin.has_model("nomic-embed-text").await.unwrap());
        assert!(!admin.has_model("llama3").await.unwrap());
    }

    #[tokio::test]
    async fn pull_streams_progress_and_skips_garbage() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"status\":\"pulling manifest\"}\n",
            "garbage\n",
            "{\"status\":\"downloading\",\"digest\":\"sha256:1\",\"total\":200,\"completed\":50}\n",
            "{\"status\":\"success\"}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .and(body_json(json!({"name": "qwen3:32b"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let updates: Vec<_> = admin(&server)
            .pull_model("qwen3:32b")
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(updates.len(), 3);
        let downloading = updates[1].as_ref().unwrap();
        assert_eq!(downloading.percent(), Some(25.0));
        assert_eq!(updates[2].as_ref().unwrap().status, "success");
    }

    #[tokio::test]
    async fn pull_error_line_is_an_error_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"error\":\"pull model manifest: file does not exist\"}\n"))
            .mount(&server)
            .await;

        let updates: Vec<_> = admin(&server).pull_model("nope").await.unwrap().collect().await;
        assert!(updates[0].is_err());
    }
}
