// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at the seams of the invocation layer.
//!
//! Both traits use `#[async_trait]` so implementations can be held as
//! `Arc<dyn ...>` and swapped for deterministic doubles in tests.

pub mod embedding;
pub mod transport;

pub use embedding::EmbeddingBackend;
pub use transport::ProviderTransport;
