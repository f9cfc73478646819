// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `switchboard config` command implementation.

use switchboard_config::SwitchboardConfig;
use switchboard_core::SwitchboardError;

const REDACTED: &str = "********";

/// Print the effective configuration as TOML with API keys redacted.
///
/// Reaching this point means loading and validation already succeeded.
pub fn run_show_config(config: &SwitchboardConfig) -> Result<(), SwitchboardError> {
    print!("{}", render(config)?);
    Ok(())
}

fn render(config: &SwitchboardConfig) -> Result<String, SwitchboardError> {
    let mut config = config.clone();
    let providers = &mut config.providers;
    for key in [
        &mut providers.openai_api_key,
        &mut providers.anthropic_api_key,
        &mut providers.groq_api_key,
        &mut providers.openrouter_api_key,
    ] {
        if key.is_some() {
            *key = Some(REDACTED.to_string());
        }
    }

    toml::to_string_pretty(&config)
        .map_err(|e| SwitchboardError::Internal(format!("failed to render configuration: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_keys_are_redacted() {
        let mut config = SwitchboardConfig::default();
        config.providers.openai_api_key = Some("sk-live-secret".into());

        let rendered = render(&config).unwrap();
        assert!(!rendered.contains("sk-live-secret"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("[routing]"));
    }

    #[test]
    fn rendered_config_loads_back() {
        let rendered = render(&SwitchboardConfig::default()).unwrap();
        let reloaded = switchboard_config::load_and_validate_str(&rendered).unwrap();
        assert_eq!(reloaded.routing.coding_model, "qwen2.5-coder:32b-instruct-q8_0");
    }
}
