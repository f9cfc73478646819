// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request adaptation for the Switchboard invocation layer.
//!
//! [`RequestAdapter`] turns a provider-neutral [`CanonicalRequest`] plus a
//! model selection into [`ProviderParameters`]: task tuning, provider
//! resolution, per-family quirks, prompt-cache hints, and thinking mode.
//!
//! [`CanonicalRequest`]: switchboard_core::CanonicalRequest
//! [`ProviderParameters`]: switchboard_core::ProviderParameters

pub mod adapter;
pub mod cache_hints;
pub mod family;
pub mod tuning;

pub use adapter::RequestAdapter;
pub use cache_hints::apply_cache_hints;
pub use family::{FamilyAdapter, ModelResolution, adapter_for, resolve_model};
pub use tuning::{augment_messages, optimize_temperature, task_instruction, task_temperature};
