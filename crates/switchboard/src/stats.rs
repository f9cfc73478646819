// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard stats` command implementation.
//!
//! Reads the decision log written by the JSON-lines sink and summarizes
//! model selection over an optional time window.

use std::io::IsTerminal;
use std::path::Path;

use chrono::{Duration, Utc};
use switchboard_config::SwitchboardConfig;
use switchboard_core::SwitchboardError;
use switchboard_recorder::{JsonlSink, SelectionStats};

/// Run the `switchboard stats` command.
pub async fn run_stats(config: &SwitchboardConfig, days: Option<u32>, json: bool) -> Result<(), SwitchboardError> {
    let Some(log_path) = &config.recorder.log_path else {
        return Err(SwitchboardError::Config(
            "no decision log configured; set [recorder] log_path".to_string(),
        ));
    };

    let stats = load_stats(Path::new(log_path), days).await?;
    if json {
        println!("{}", crate::route::to_json(&stats));
    } else {
        let use_color = std::io::stdout().is_terminal();
        print_stats(&stats, days, use_color);
    }
    Ok(())
}

async fn load_stats(path: &Path, days: Option<u32>) -> Result<SelectionStats, SwitchboardError> {
    let records = JsonlSink::read_records(path).await?;
    let since = days.map(|d| Utc::now() - Duration::days(i64::from(d)));
    Ok(SelectionStats::from_records(&records, since))
}

fn print_stats(stats: &SelectionStats, days: Option<u32>, use_color: bool) {
    let window = match days {
        Some(d) => format!("last {d} days"),
        None => "all time".to_string(),
    };

    println!();
    println!("  switchboard stats ({window})");
    println!("  {}", "-".repeat(35));

    if stats.total_selections == 0 {
        println!("    No decisions recorded.");
        println!();
        return;
    }

    println!("    Selections:  {}", stats.total_selections);
    println!("    Confidence:  {:.2} avg", stats.confidence_avg);
    let override_rate = format!("{:.1}%", stats.override_rate);
    if use_color {
        use colored::Colorize;
        println!("    Overrides:   {}", override_rate.yellow());
    } else {
        println!("    Overrides:   {override_rate}");
    }

    println!();
    println!("    Models:");
    for (model, count) in &stats.models_used {
        println!("      {model:<40} {count}");
    }
    println!("    Tasks:");
    for (task, count) in &stats.task_types {
        println!("      {task:<40} {count}");
    }
    println!();
}
