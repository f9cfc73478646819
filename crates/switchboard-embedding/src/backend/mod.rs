// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP embedding backends.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use std::time::Duration;

use switchboard_core::SwitchboardError;

/// Build a reqwest client with the given timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, SwitchboardError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SwitchboardError::Embedding {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Map a reqwest failure to an embedding error.
pub(crate) fn request_error(backend: &str, e: reqwest::Error) -> SwitchboardError {
    SwitchboardError::Embedding {
        message: format!("{backend} embedding request failed: {e}"),
        source: Some(Box::new(e)),
    }
}
