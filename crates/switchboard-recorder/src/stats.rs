// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate statistics over recorded decisions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::DecisionRecord;

/// Summary of model selection behaviour over a time window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionStats {
    pub total_selections: usize,
    pub models_used: BTreeMap<String, usize>,
    pub task_types: BTreeMap<String, usize>,
    pub confidence_avg: f64,
    /// Percentage of selections with an override, `0..=100`.
    pub override_rate: f64,
}

impl SelectionStats {
    /// Aggregates `records`, keeping only those at or after `since` when given.
    pub fn from_records(records: &[DecisionRecord], since: Option<DateTime<Utc>>) -> Self {
        let mut stats = SelectionStats::default();
        let mut confidence_sum = 0.0;
        let mut overrides = 0usize;

        for record in records.iter().filter(|r| since.is_none_or(|s| r.timestamp >= s)) {
            stats.total_selections += 1;
            *stats.models_used.entry(record.selected_model.clone()).or_default() += 1;
            *stats.task_types.entry(record.task_type.to_string()).or_default() += 1;
            confidence_sum += f64::from(record.confidence);
            if record.override_applied {
                overrides += 1;
            }
        }

        if stats.total_selections > 0 {
            let total = stats.total_selections as f64;
            stats.confidence_avg = confidence_sum / total;
            stats.override_rate = overrides as f64 * 100.0 / total;
        }
        stats
    }
}
