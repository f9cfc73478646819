// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express: threshold
//! ranges, non-empty model names, and non-zero sizes.

use switchboard_core::TaskCategory;

use crate::diagnostic::ConfigError;
use crate::model::SwitchboardConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &SwitchboardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let classifier = &config.classifier;
    for category in TaskCategory::ALL {
        let threshold = classifier.threshold(category);
        if !(0.0..=1.0).contains(&threshold) {
            errors.push(ConfigError::validation(format!(
                "classifier.{category}_threshold must be within [0, 1], got {threshold}"
            )));
        }
    }
    if !(0.0..=1.0).contains(&classifier.ambiguity_gap) {
        errors.push(ConfigError::validation(format!(
            "classifier.ambiguity_gap must be within [0, 1], got {}",
            classifier.ambiguity_gap
        )));
    }
    if !(0.0..=1.0).contains(&classifier.confidence_floor) {
        errors.push(ConfigError::validation(format!(
            "classifier.confidence_floor must be within [0, 1], got {}",
            classifier.confidence_floor
        )));
    }

    for category in TaskCategory::ALL {
        if config.routing.model_for(category).trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "routing.{category}_model must not be empty"
            )));
        }
    }

    if config.retry.max_attempts < 1 {
        errors.push(ConfigError::validation(
            "retry.max_attempts must be at least 1, got 0",
        ));
    }

    if config.embedding.fallback_dimension < 1 {
        errors.push(ConfigError::validation(
            "embedding.fallback_dimension must be at least 1, got 0",
        ));
    }

    if config.providers.local_provider.is_some()
        && config.providers.ollama_api_base.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "providers.ollama_api_base must not be empty when providers.local_provider is set",
        ));
    }

    if let Some(provider) = config.providers.local_provider.as_deref()
        && !config.providers.local_provider_forced()
    {
        errors.push(ConfigError::validation(format!(
            "providers.local_provider `{provider}` is not supported (expected \"ollama\")"
        )));
    }

    if config.recorder.channel_capacity < 1 {
        errors.push(ConfigError::validation(
            "recorder.channel_capacity must be at least 1, got 0",
        ));
    }

    if config.recorder.snippet_chars < 4 {
        errors.push(ConfigError::validation(format!(
            "recorder.snippet_chars must be at least 4, got {}",
            config.recorder.snippet_chars
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
