// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end request handling for the Switchboard layer.
//!
//! [`Switchboard`] wires the embedding provider, task classifier, model
//! selector, request adapter, invocation engine, and decision recorder into
//! one call: [`Switchboard::handle`].

pub mod pipeline;

pub use pipeline::{Handled, RoutingDecision, Switchboard};
