// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task classification and model selection for the Switchboard invocation layer.
//!
//! This crate provides:
//! - [`TaskClassifier`]: Embedding classification against lazily built category prototypes
//! - [`ModelSelector`]: Task-to-model mapping with keyword and length overrides
//! - [`infer_task_from_messages`]: Keyword heuristic used when the classifier is disabled
//!
//! The router runs before request adaptation. Its output decides which model
//! serves the request and which task tuning the adapter applies.

pub mod classifier;
pub mod heuristic;
pub mod prototypes;
pub mod selector;

pub use classifier::{CategoryPrototype, TaskClassifier};
pub use heuristic::infer_task_from_messages;
pub use selector::{ModelSelector, TaskModelInfo};
