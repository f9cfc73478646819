// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard models` and `switchboard pull` command implementations.

use std::time::Duration;

use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use switchboard_config::SwitchboardConfig;
use switchboard_core::SwitchboardError;
use switchboard_engine::{LocalModel, OllamaAdmin, PullProgress};
use switchboard_router::{ModelSelector, TaskModelInfo};
use tokio_util::sync::CancellationToken;

use crate::route::to_json;

/// Pulls can take a long time; only connection setup is bounded.
const PULL_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);

/// Run `switchboard models`: the task-to-model catalog.
pub fn run_catalog(config: &SwitchboardConfig, json: bool) -> Result<(), SwitchboardError> {
    let catalog = ModelSelector::new(config.routing.clone()).available_task_models();
    if json {
        println!("{}", to_json(&catalog));
    } else {
        for line in catalog_lines(&catalog) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Run `switchboard models --local`: models installed on the local server.
pub async fn run_local(config: &SwitchboardConfig, json: bool) -> Result<(), SwitchboardError> {
    let admin = OllamaAdmin::new(
        &config.providers.ollama_api_base,
        Duration::from_secs(config.providers.request_timeout_secs),
    )?;
    let models = admin.list_models().await?;
    if json {
        println!("{}", to_json(&models));
    } else if models.is_empty() {
        println!("no models installed on {}", config.providers.ollama_api_base);
    } else {
        for model in &models {
            println!("{}", local_model_line(model));
        }
    }
    Ok(())
}

/// Run `switchboard pull <model>` with a progress bar.
pub async fn run_pull(
    config: &SwitchboardConfig,
    model: &str,
    cancel: &CancellationToken,
) -> Result<(), SwitchboardError> {
    let admin = OllamaAdmin::new(&config.providers.ollama_api_base, PULL_TIMEOUT)?;
    if admin.has_model(model).await? {
        println!("{model} is already installed");
        return Ok(());
    }

    let mut progress = admin.pull_model(model).await?;
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{msg:20} [{bar:40}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    loop {
        let update = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                bar.abandon_with_message("cancelled");
                return Err(SwitchboardError::Cancelled);
            }
            update = progress.next() => update,
        };
        let Some(update) = update else { break };
        match update {
            Ok(update) => apply_progress(&bar, &update),
            Err(e) => {
                bar.abandon_with_message("failed");
                return Err(e);
            }
        }
    }

    bar.finish_with_message("done");
    println!("pulled {model}");
    Ok(())
}

fn apply_progress(bar: &ProgressBar, update: &PullProgress) {
    bar.set_message(update.status.clone());
    if let Some(total) = update.total {
        bar.set_length(total);
    }
    if let Some(completed) = update.completed {
        bar.set_position(completed);
    }
}

fn catalog_lines(catalog: &[TaskModelInfo]) -> Vec<String> {
    catalog
        .iter()
        .map(|info| format!("{:<10} {:<40} {}", info.task_type.to_string(), info.model_name, info.description))
        .collect()
}

fn local_model_line(model: &LocalModel) -> String {
    format!("{:<40} {:>10}", model.name, format_size(model.size))
}

/// Human-readable byte count.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use switchboard_config::model::RoutingConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(4_900_000_000), "4.6 GB");
    }

    #[test]
    fn catalog_lists_every_task() {
        let catalog = ModelSelector::new(RoutingConfig::default()).available_task_models();
        let lines = catalog_lines(&catalog);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("coding"));
        assert!(lines[0].contains("qwen2.5-coder:32b-instruct-q8_0"));
    }

    #[test]
    fn progress_updates_the_bar() {
        let bar = ProgressBar::hidden();
        apply_progress(
            &bar,
            &PullProgress {
                status: "downloading".into(),
                digest: None,
                total: Some(100),
                completed: Some(40),
                error: None,
            },
        );
        assert_eq!(bar.length(), Some(100));
        assert_eq!(bar.position(), 40);
    }

    #[tokio::test]
    async fn pull_skips_installed_model() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "qwen3:8b", "size": 5_200_000_000u64}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = SwitchboardConfig::default();
        config.providers.ollama_api_base = server.uri();
        run_pull(&config, "qwen3:8b", &CancellationToken::new()).await.unwrap();
    }

    #[tokio::test]
    async fn pull_reports_server_error_line() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"status\":\"pulling manifest\"}\n{\"error\":\"model not found\"}\n"),
            )
            .mount(&server)
            .await;

        let mut config = SwitchboardConfig::default();
        config.providers.ollama_api_base = server.uri();
        let err = run_pull(&config, "nope:1b", &CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }
}
