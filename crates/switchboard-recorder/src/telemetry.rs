// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; nothing is collected until the host installs
//! a recorder.

use metrics::{describe_counter, describe_histogram};

use crate::record::DecisionRecord;

/// Register all Switchboard metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("switchboard_selections_total", "Model selections by model and task type");
    describe_counter!("switchboard_overrides_total", "Selections that deviated from the task mapping");
    describe_counter!("switchboard_invocations_total", "Invocations by outcome");
    describe_histogram!(
        "switchboard_invocation_attempts",
        "Provider attempts consumed per invocation"
    );
}

/// Record the counters for one decision.
pub fn record_decision(record: &DecisionRecord) {
    metrics::counter!(
        "switchboard_selections_total",
        "model" => record.selected_model.clone(),
        "task" => record.task_type.to_string()
    )
    .increment(1);

    if let Some(reason) = record.override_reason {
        metrics::counter!("switchboard_overrides_total", "reason" => reason.to_string()).increment(1);
    }

    metrics::counter!("switchboard_invocations_total", "outcome" => record.outcome.to_string()).increment(1);

    if let Some(attempts) = record.attempts {
        metrics::histogram!("switchboard_invocation_attempts").record(f64::from(attempts));
    }
}
