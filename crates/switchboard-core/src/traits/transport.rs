// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider transport trait: one attempt against a provider.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{ChunkStream, ProviderParameters, ProviderResponse};

/// Executes exactly one attempt of an adapted request.
///
/// Retry, backoff, and cancellation live in the invocation engine. A
/// transport only reports what happened, already classified as a
/// [`TransportError`] kind.
#[async_trait]
pub trait ProviderTransport: Send + Sync + 'static {
    /// Human-readable transport name used in logs.
    fn name(&self) -> &str;

    /// Sends the request and waits for the full response.
    async fn complete(&self, params: &ProviderParameters) -> Result<ProviderResponse, TransportError>;

    /// Opens a streaming response. Errors before the first byte are reported
    /// here; errors mid-stream are yielded by the stream itself.
    async fn stream(&self, params: &ProviderParameters) -> Result<ChunkStream, TransportError>;
}
