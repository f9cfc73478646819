// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Switchboard invocation layer.

use thiserror::Error;

/// The primary error type returned by Switchboard components.
///
/// Classification degradation never appears here: a failed embedding turns
/// into a zero vector and the default category instead of an error.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// Configuration errors (invalid TOML, missing credentials, bad header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding backend or embedding cache errors.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM provider errors outside the retry taxonomy (client construction, decoding).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The provider rejected the request in a way retrying cannot fix
    /// (validation, authentication, unsupported model).
    #[error("request rejected by provider: {message}")]
    NonRetryable { message: String },

    /// Every attempt of the retry budget failed.
    #[error("failed to make API call after {attempts} attempts. Last error: {last_error}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last_error: TransportError,
    },

    /// The caller cancelled the invocation.
    #[error("invocation cancelled by caller")]
    Cancelled,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Decision recorder errors. Only surfaced by recorder-side APIs, never by invocation.
    #[error("decision recorder error: {0}")]
    Recorder(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure of a single transport attempt, already sorted into the retry taxonomy.
///
/// Transports decide the kind at the point where they see the status code or
/// decode failure, so the engine never has to inspect error messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// HTTP 429 or an equivalent provider signal.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// Timeouts, connection resets, 5xx responses, malformed JSON.
    #[error("transient provider error: {message}")]
    Transient { message: String },

    /// The model identifier does not name a provider the transport can reach.
    #[error("LLM provider not provided for model `{model}`")]
    ProviderMissing { model: String },

    /// Validation or authentication failures.
    #[error("{message}")]
    NonRetryable {
        message: String,
        status: Option<u16>,
    },
}

impl TransportError {
    /// Shorthand for a non-retryable error without an HTTP status.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::NonRetryable {
            message: message.into(),
            status: None,
        }
    }

    /// Shorthand for a transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }
}

impl From<TransportError> for SwitchboardError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::NonRetryable { message, .. } => SwitchboardError::NonRetryable { message },
            TransportError::ProviderMissing { model } => SwitchboardError::NonRetryable {
                message: format!("LLM provider not provided for model `{model}`"),
            },
            other => SwitchboardError::Provider {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
