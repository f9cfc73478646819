// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing decision recorder for the Switchboard layer.
//!
//! Records are handed to [`DecisionRecorder`] on the request path and written
//! to [`DecisionSink`]s by a background worker. [`SelectionStats`]
//! summarizes records read back from the JSON-lines log.

pub mod record;
pub mod recorder;
pub mod sink;
pub mod stats;
pub mod telemetry;

pub use record::{DecisionOutcome, DecisionRecord, snippet};
pub use recorder::DecisionRecorder;
pub use sink::{DecisionSink, JsonlSink, MemorySink, TracingSink};
pub use stats::SelectionStats;
pub use telemetry::register_metrics;
