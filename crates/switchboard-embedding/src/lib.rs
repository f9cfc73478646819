// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text embeddings for task classification.
//!
//! [`EmbeddingProvider`] chains HTTP backends (local inference server first,
//! then a hosted API) in front of a deterministic bag-of-words fallback, and
//! memoizes every result in a shared [`EmbeddingCache`].

pub mod backend;
pub mod cache;
pub mod fallback;
pub mod provider;
pub mod vector;

pub use backend::{OllamaEmbedder, OpenAiEmbedder};
pub use cache::EmbeddingCache;
pub use fallback::FallbackEmbedder;
pub use provider::EmbeddingProvider;
pub use vector::{cosine_similarity, is_zero, l2_normalize, mean_vector};
