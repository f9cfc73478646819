// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./switchboard.toml` > `~/.config/switchboard/switchboard.toml`
//! > `/etc/switchboard/switchboard.toml`, with the conventional provider
//! credential variables and `SWITCHBOARD_` overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::SwitchboardConfig;

/// Well-known provider variables read without the `SWITCHBOARD_` prefix.
const CREDENTIAL_VARS: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GROQ_API_KEY",
    "OPENROUTER_API_KEY",
    "OPENROUTER_API_BASE",
    "OLLAMA_API_BASE",
    "OLLAMA_PROVIDER",
    "OR_SITE_URL",
    "OR_APP_NAME",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/switchboard/switchboard.toml` (system-wide)
/// 3. `~/.config/switchboard/switchboard.toml` (user XDG config)
/// 4. `./switchboard.toml` (local directory)
/// 5. Conventional provider variables (`OPENAI_API_KEY`, `OLLAMA_API_BASE`, ...)
/// 6. `SWITCHBOARD_*` environment variables
pub fn load_config() -> Result<SwitchboardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SwitchboardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file(path))
        .merge(credential_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SwitchboardConfig::default()))
        .merge(Toml::file("/etc/switchboard/switchboard.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("switchboard/switchboard.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("switchboard.toml"))
        .merge(credential_env_provider())
        .merge(env_provider())
}

/// Maps the conventional provider variables onto the `providers` section.
fn credential_env_provider() -> Env {
    Env::raw().only(CREDENTIAL_VARS).map(|key| {
        let mapped = match key.as_str() {
            "ollama_provider" => "providers.local_provider".to_string(),
            "or_site_url" => "providers.openrouter_site_url".to_string(),
            "or_app_name" => "providers.openrouter_app_name".to_string(),
            other => format!("providers.{other}"),
        };
        mapped.into()
    })
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: key names contain
/// underscores, so `SWITCHBOARD_PROVIDERS_OPENAI_API_KEY` must map to
/// `providers.openai_api_key`, not `providers.openai.api.key`.
fn env_provider() -> Env {
    Env::prefixed("SWITCHBOARD_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let key_str = key.as_str();
        let mapped = [
            "general",
            "providers",
            "embedding",
            "classifier",
            "routing",
            "retry",
            "recorder",
        ]
        .iter()
        .find_map(|section| {
            key_str
                .strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|rest| format!("{section}.{rest}"))
        })
        .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_env_maps_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SWITCHBOARD_PROVIDERS_OPENAI_API_KEY", "sk-test");
            jail.set_env("SWITCHBOARD_RETRY_MAX_ATTEMPTS", "5");
            jail.set_env("SWITCHBOARD_ROUTING_CODING_MODEL", "ollama/coder");

            let config: SwitchboardConfig = Figment::new()
                .merge(Serialized::defaults(SwitchboardConfig::default()))
                .merge(env_provider())
                .extract()?;

            assert_eq!(config.providers.openai_api_key.as_deref(), Some("sk-test"));
            assert_eq!(config.retry.max_attempts, 5);
            assert_eq!(config.routing.coding_model, "ollama/coder");
            Ok(())
        });
    }

    #[test]
    fn conventional_credential_vars_are_read() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("ANTHROPIC_API_KEY", "sk-ant");
            jail.set_env("OLLAMA_PROVIDER", "ollama");
            jail.set_env("OLLAMA_API_BASE", "http://gpu-box:11434");
            jail.set_env("OR_APP_NAME", "switchboard");

            let config: SwitchboardConfig = Figment::new()
                .merge(Serialized::defaults(SwitchboardConfig::default()))
                .merge(credential_env_provider())
                .extract()?;

            assert_eq!(config.providers.anthropic_api_key.as_deref(), Some("sk-ant"));
            assert!(config.providers.local_provider_forced());
            assert_eq!(config.providers.ollama_api_base, "http://gpu-box:11434");
            assert_eq!(config.providers.openrouter_app_name.as_deref(), Some("switchboard"));
            Ok(())
        });
    }

    #[test]
    fn prefixed_env_beats_conventional_var() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("OPENAI_API_KEY", "from-conventional");
            jail.set_env("SWITCHBOARD_PROVIDERS_OPENAI_API_KEY", "from-prefixed");

            let config: SwitchboardConfig = Figment::new()
                .merge(Serialized::defaults(SwitchboardConfig::default()))
                .merge(credential_env_provider())
                .merge(env_provider())
                .extract()?;

            assert_eq!(
                config.providers.openai_api_key.as_deref(),
                Some("from-prefixed")
            );
            Ok(())
        });
    }
}
