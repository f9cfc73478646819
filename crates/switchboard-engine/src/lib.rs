// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider invocation for the Switchboard layer.
//!
//! [`InvocationEngine`] runs the retry loop over any
//! [`ProviderTransport`](switchboard_core::ProviderTransport).
//! [`HttpTransport`] is the production transport and [`OllamaAdmin`]
//! manages models on the local inference server.

pub mod engine;
pub mod http;
pub mod ollama_admin;
pub mod retry;

pub use engine::{Invocation, InvocationEngine, InvocationOutput};
pub use http::HttpTransport;
pub use ollama_admin::{LocalModel, OllamaAdmin, PullProgress, PullStream};
pub use retry::{Outcome, RetryPolicy};
