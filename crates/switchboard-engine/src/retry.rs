// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attempt outcomes and the backoff policy derived from them.

use std::time::Duration;

use switchboard_config::model::RetryConfig;
use switchboard_core::TransportError;

/// What a single attempt turned into, from the engine's point of view.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    /// Wait the rate-limit delay, then retry.
    RateLimited(TransportError),
    /// Wait the regular delay, then retry.
    Transient(TransportError),
    /// Correct the model prefix once, then retry immediately.
    ProviderMissing(String),
    /// Give up without retrying.
    Fatal(TransportError),
}

impl<T> From<Result<T, TransportError>> for Outcome<T> {
    fn from(result: Result<T, TransportError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e @ TransportError::RateLimited { .. }) => Outcome::RateLimited(e),
            Err(e @ TransportError::Transient { .. }) => Outcome::Transient(e),
            Err(TransportError::ProviderMissing { model }) => Outcome::ProviderMissing(model),
            Err(e @ TransportError::NonRetryable { .. }) => Outcome::Fatal(e),
        }
    }
}

/// Attempt budget and fixed backoff delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_delay: Duration,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            rate_limit_delay: Duration::from_secs(config.rate_limit_delay_secs),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt after `error`.
    pub fn delay_for(&self, error: &TransportError) -> Duration {
        match error {
            TransportError::RateLimited { .. } => self.rate_limit_delay,
            _ => self.retry_delay,
        }
    }
}
