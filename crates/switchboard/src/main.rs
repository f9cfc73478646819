// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Switchboard - adaptive LLM invocation layer.
//!
//! This is the binary entry point for classifying prompts, inspecting model
//! routing, invoking providers, and managing local models.

mod invoke;
mod models;
mod route;
mod show_config;
mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use switchboard_config::SwitchboardConfig;
use switchboard_core::{SwitchboardError, TaskHint};
use tokio_util::sync::CancellationToken;

/// Switchboard - adaptive LLM invocation layer.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a prompt into a task category.
    Classify {
        prompt: String,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show which model a prompt would be routed to.
    Select {
        prompt: String,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Send a prompt through the full pipeline.
    Invoke {
        prompt: String,
        /// Model identifier, or `auto` for automatic selection.
        #[arg(long, default_value = "auto")]
        model: String,
        /// Task hint: auto, coding, reasoning, creative, general or chat.
        #[arg(long, default_value = "auto")]
        task: TaskHint,
        /// Optional system message.
        #[arg(long)]
        system: Option<String>,
        /// Stream the response as it arrives.
        #[arg(long)]
        stream: bool,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long, default_value_t = 0.0)]
        temperature: f32,
        /// Give up after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// List task models, or models installed on the local server.
    Models {
        /// List models installed on the local inference server.
        #[arg(long)]
        local: bool,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Download a model to the local inference server.
    Pull { model: String },
    /// Summarize recorded routing decisions.
    Stats {
        /// Only include decisions from the last N days.
        #[arg(long)]
        days: Option<u32>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate and print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => switchboard_config::load_and_validate_path(path),
        None => switchboard_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            switchboard_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.general.log_level);
    switchboard_recorder::register_metrics();

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    if let Err(e) = run(cli.command, &config, &cancel).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(
    command: Option<Commands>,
    config: &SwitchboardConfig,
    cancel: &CancellationToken,
) -> Result<(), SwitchboardError> {
    match command {
        Some(Commands::Classify { prompt, json }) => route::run_classify(config, &prompt, json).await,
        Some(Commands::Select { prompt, json }) => route::run_select(config, &prompt, json).await,
        Some(Commands::Invoke {
            prompt,
            model,
            task,
            system,
            stream,
            max_tokens,
            temperature,
            timeout,
        }) => {
            let args = invoke::InvokeArgs {
                prompt,
                model,
                task,
                system,
                stream,
                max_tokens,
                temperature,
                timeout,
            };
            invoke::run_invoke(config, args, cancel).await
        }
        Some(Commands::Models { local: false, json }) => models::run_catalog(config, json),
        Some(Commands::Models { local: true, json }) => models::run_local(config, json).await,
        Some(Commands::Pull { model }) => models::run_pull(config, &model, cancel).await,
        Some(Commands::Stats { days, json }) => stats::run_stats(config, days, json).await,
        Some(Commands::Config) => show_config::run_show_config(config),
        None => {
            println!("switchboard: use --help for available commands");
            Ok(())
        }
    }
}

/// Cancels `cancel` on the first Ctrl+C.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

/// Initialize the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("switchboard={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
