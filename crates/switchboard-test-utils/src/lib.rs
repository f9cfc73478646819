// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Switchboard integration tests.
//!
//! Provides scripted doubles for the seam traits so pipeline and engine tests
//! run without network access.
//!
//! # Components
//!
//! - [`ScriptedTransport`] - Provider transport replaying a queue of per-attempt results
//! - [`StaticEmbeddingBackend`] - Embedding backend answering from a fixed text-to-vector table

pub mod scripted_transport;
pub mod static_embedding;

pub use scripted_transport::{ScriptedTransport, ScriptedTurn};
pub use static_embedding::StaticEmbeddingBackend;
