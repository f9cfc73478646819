// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Switchboard configuration system.

use switchboard_config::diagnostic::ConfigError;
use switchboard_config::model::SwitchboardConfig;
use switchboard_config::{load_and_validate_str, load_config_from_str};
use switchboard_core::TaskCategory;

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_switchboard_config() {
    let toml = r#"
[general]
log_level = "debug"

[providers]
openai_api_key = "sk-123"
anthropic_api_key = "sk-ant-123"
local_provider = "ollama"
ollama_api_base = "http://10.0.0.2:11434"
openrouter_site_url = "https://example.com"

[embedding]
enable_hosted = false
fallback_dimension = 64
cache_snapshot_path = "/tmp/embeddings.json"

[classifier]
coding_threshold = 0.7
confidence_floor = 0.5

[routing]
coding_model = "ollama/deepseek-coder"
long_prompt_words = 80
coding_keywords = ["code", "rust"]

[retry]
max_attempts = 4
rate_limit_delay_secs = 10
retry_delay_secs = 1

[recorder]
log_path = "/tmp/decisions.jsonl"
channel_capacity = 16
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.providers.openai_api_key.as_deref(), Some("sk-123"));
    assert!(config.providers.local_provider_forced());
    assert_eq!(config.providers.ollama_api_base, "http://10.0.0.2:11434");
    assert!(!config.embedding.enable_hosted);
    assert!(config.embedding.enable_local);
    assert_eq!(config.embedding.fallback_dimension, 64);
    assert_eq!(config.classifier.threshold(TaskCategory::Coding), 0.7);
    assert_eq!(config.classifier.threshold(TaskCategory::Reasoning), 0.60);
    assert_eq!(config.routing.model_for(TaskCategory::Coding), "ollama/deepseek-coder");
    assert_eq!(config.routing.model_for(TaskCategory::General), "qwen3:32b");
    assert_eq!(config.routing.coding_keywords, vec!["code", "rust"]);
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.recorder.log_path.as_deref(), Some("/tmp/decisions.jsonl"));
    assert_eq!(config.recorder.channel_capacity, 16);
}

/// Empty TOML yields the compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should deserialize");
    assert_eq!(config.routing.coding_model, "qwen2.5-coder:32b-instruct-q8_0");
    assert_eq!(config.routing.reasoning_model, "mixtral:8x22b-instruct-v0.1-q4_K_M");
    assert_eq!(config.routing.creative_model, "qwen3:8b");
    assert_eq!(config.routing.general_model, "qwen3:32b");
    assert_eq!(config.routing.long_prompt_words, 100);
    assert_eq!(config.classifier.ambiguity_gap, 0.10);
    assert_eq!(config.classifier.confidence_floor, 0.55);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.rate_limit_delay_secs, 30);
    assert_eq!(config.retry.retry_delay_secs, 5);
    assert_eq!(config.embedding.fallback_dimension, 100);
    assert_eq!(config.embedding.local_model, "mxbai-embed-large:latest");
    assert_eq!(config.providers.ollama_api_base, "http://localhost:11434");
    assert_eq!(config.recorder.snippet_chars, 50);
}

/// Unknown key in [routing] is rejected.
#[test]
fn unknown_field_in_routing_produces_error() {
    let toml = r#"
[routing]
coding_modle = "x"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("coding_modle"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown key surfaces as an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_diagnostic_has_suggestion() {
    let toml = r#"
[retry]
max_atempts = 2
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_atempts");
            assert_eq!(suggestion.as_deref(), Some("max_attempts"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Wrong value type surfaces as InvalidType.
#[test]
fn wrong_type_produces_invalid_type() {
    let toml = r#"
[retry]
max_attempts = "three"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("max_attempts"))),
        "expected InvalidType for max_attempts, got {errors:?}"
    );
}

/// Semantic validation runs after successful extraction.
#[test]
fn validation_errors_after_extraction() {
    let toml = r#"
[classifier]
general_threshold = 2.0

[recorder]
channel_capacity = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

/// Default config serializes with every section present.
#[test]
fn default_config_serializes_every_section() {
    let config = SwitchboardConfig::default();
    let json = serde_json::to_value(&config).expect("serialize");
    assert_eq!(json["routing"]["general_model"], "qwen3:32b");
    assert_eq!(json["retry"]["max_attempts"], 3);
}
