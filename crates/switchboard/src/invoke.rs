// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard invoke` command implementation.
//!
//! Sends one prompt through the full pipeline. The response goes to stdout;
//! routing details and token usage go to stderr so output can be piped.

use std::io::{IsTerminal, Write};
use std::time::Duration;

use futures::StreamExt;
use switchboard_config::SwitchboardConfig;
use switchboard_core::types::TokenUsage;
use switchboard_core::{CanonicalRequest, Message, SwitchboardError, TaskHint};
use switchboard_engine::InvocationOutput;
use switchboard_pipeline::{RoutingDecision, Switchboard};
use tokio_util::sync::CancellationToken;

/// Arguments of the `invoke` subcommand.
#[derive(Debug, Clone)]
pub struct InvokeArgs {
    pub prompt: String,
    pub model: String,
    pub task: TaskHint,
    pub system: Option<String>,
    pub stream: bool,
    pub max_tokens: Option<u32>,
    pub temperature: f32,
    pub timeout: Option<u64>,
}

impl InvokeArgs {
    fn to_request(&self) -> CanonicalRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(Message::system(system.clone()));
        }
        messages.push(Message::user(self.prompt.clone()));

        let mut request = CanonicalRequest::new(messages, self.model.clone());
        request.task = self.task;
        request.stream = self.stream;
        request.max_tokens = self.max_tokens;
        request.temperature = self.temperature;
        request
    }
}

/// Run the `switchboard invoke` command.
pub async fn run_invoke(
    config: &SwitchboardConfig,
    args: InvokeArgs,
    cancel: &CancellationToken,
) -> Result<(), SwitchboardError> {
    let switchboard = Switchboard::from_config(config)?;
    switchboard.load_cache_snapshot().await;

    let request = args.to_request();
    let result = match args.timeout {
        Some(secs) => {
            switchboard
                .handle_with_timeout(&request, cancel, Duration::from_secs(secs))
                .await
        }
        None => switchboard.handle(&request, cancel).await,
    };

    let outcome = match result {
        Ok(handled) => {
            let color = std::io::stderr().is_terminal();
            eprintln!("{}", routing_summary(&handled.decision, handled.invocation.attempts, color));
            print_output(handled.invocation.output, &handled.invocation.model).await
        }
        Err(e) => Err(e),
    };

    switchboard.shutdown().await;
    outcome
}

async fn print_output(output: InvocationOutput, model: &str) -> Result<(), SwitchboardError> {
    let mut stdout = std::io::stdout();
    let usage = match output {
        InvocationOutput::Complete(response) => {
            println!("{}", response.content);
            response.usage
        }
        InvocationOutput::Stream(mut stream) => {
            let mut usage = None;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                if let Some(text) = chunk.text {
                    print!("{text}");
                    let _ = stdout.flush();
                }
                usage = chunk.usage.or(usage);
            }
            println!();
            usage
        }
    };

    if let Some(usage) = usage {
        eprintln!("{}", usage_line(model, &usage));
    }
    Ok(())
}

fn routing_summary(decision: &RoutingDecision, attempts: u32, color: bool) -> String {
    let model = &decision.selection.model_id;
    let model = if color {
        use colored::Colorize;
        model.cyan().to_string()
    } else {
        model.clone()
    };

    let mut line = format!("model: {model}");
    if let Some(c) = &decision.classification {
        line.push_str(&format!(" (task: {}, confidence {:.2})", c.category, c.confidence));
    }
    if let Some(reason) = decision.selection.override_reason {
        line.push_str(&format!(" override: {reason}"));
    }
    if attempts > 1 {
        line.push_str(&format!(" after {attempts} attempts"));
    }
    line
}

fn usage_line(model: &str, usage: &TokenUsage) -> String {
    format!(
        "{model}: {} input tokens, {} output tokens",
        usage.input_tokens, usage.output_tokens
    )
}

#[cfg(test)]
mod tests {
    use switchboard_core::{ClassificationResult, ModelSelection, TaskCategory};

    use super::*;

    fn args() -> InvokeArgs {
        InvokeArgs {
            prompt: "hello".into(),
            model: "auto".into(),
            task: TaskHint::Auto,
            system: Some("Be brief.".into()),
            stream: true,
            max_tokens: Some(256),
            temperature: 0.0,
            timeout: None,
        }
    }

    #[test]
    fn request_places_system_before_prompt() {
        let request = args().to_request();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].text(), "Be brief.");
        assert_eq!(request.messages[1].text(), "hello");
        assert!(request.wants_auto_model());
        assert!(request.stream);
        assert_eq!(request.max_tokens, Some(256));
    }

    #[test]
    fn request_without_system_has_only_the_prompt() {
        let request = InvokeArgs { system: None, ..args() }.to_request();
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn summary_mentions_task_and_retries() {
        let decision = RoutingDecision {
            classification: Some(ClassificationResult {
                category: TaskCategory::Coding,
                confidence: 0.9,
            }),
            selection: ModelSelection {
                model_id: "qwen2.5-coder:32b-instruct-q8_0".into(),
                override_reason: None,
            },
            task: Some(TaskCategory::Coding),
        };
        assert_eq!(
            routing_summary(&decision, 2, false),
            "model: qwen2.5-coder:32b-instruct-q8_0 (task: coding, confidence 0.90) after 2 attempts"
        );
    }

    #[test]
    fn usage_line_format() {
        let usage = TokenUsage {
            input_tokens: 12,
            output_tokens: 34,
        };
        assert_eq!(usage_line("openai/gpt-4o", &usage), "openai/gpt-4o: 12 input tokens, 34 output tokens");
    }
}
