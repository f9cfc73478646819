// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical request to provider parameters.

use switchboard_config::model::ProvidersConfig;
use switchboard_core::{
    CanonicalRequest, ModelSelection, ProviderParameters, TaskCategory,
};
use tracing::{debug, info};

use crate::cache_hints::apply_cache_hints;
use crate::family::{adapter_for, mentions_claude, resolve_model};
use crate::tuning::{augment_messages, optimize_temperature};

/// Sampling temperature required while extended thinking is on.
const THINKING_TEMPERATURE: f32 = 1.0;

/// Reasoning effort used when thinking is enabled without an explicit level.
const DEFAULT_REASONING_EFFORT: &str = "low";

/// Builds provider-specific parameters from a canonical request.
///
/// The caller's request is never modified; all changes are made to a copy of
/// its messages.
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    providers: ProvidersConfig,
}

impl RequestAdapter {
    pub fn new(providers: ProvidersConfig) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &ProvidersConfig {
        &self.providers
    }

    /// Adapt `request` for the selected model.
    ///
    /// `task` enables task tuning (system instruction and temperature
    /// default); `None` leaves both untouched.
    pub fn adapt(
        &self,
        request: &CanonicalRequest,
        selection: &ModelSelection,
        task: Option<TaskCategory>,
    ) -> ProviderParameters {
        let mut messages = request.messages.clone();
        if let Some(category) = task {
            augment_messages(&mut messages, category);
        }

        let resolution = resolve_model(&selection.model_id, &self.providers);
        let family = adapter_for(resolution.family);

        let mut params = ProviderParameters::new(resolution.model, messages);
        params.provider = family.family();
        params.temperature = optimize_temperature(task, request.temperature);
        params.top_p = request.top_p;
        params.response_format = request.response_format.clone();
        params.stream = request.stream;
        params.api_key = request.api_key.clone();
        params.api_base = resolution.api_base.or_else(|| request.api_base.clone());
        params.model_id = request.model_id.clone();
        params.token_limit = request
            .max_tokens
            .and_then(|max| family.token_limit(&params.model, max));

        if !request.tools.is_empty() {
            params.tools = request.tools.clone();
            params.tool_choice = Some(request.tool_choice.clone());
            debug!(tools = params.tools.len(), "added tools to provider parameters");
        }

        params.headers = family.headers(&params.model, &self.providers);
        family.finish(&mut params, request, &self.providers);

        let claude = mentions_claude(&params.model);
        if claude {
            apply_cache_hints(&mut params.messages);
        }

        if claude && request.enable_thinking {
            let effort = request
                .reasoning_effort
                .clone()
                .unwrap_or_else(|| DEFAULT_REASONING_EFFORT.to_string());
            info!(reasoning_effort = %effort, "thinking enabled");
            params.reasoning_effort = Some(effort);
            params.temperature = THINKING_TEMPERATURE;
        }

        debug!(
            model = %params.model,
            provider = ?params.provider,
            temperature = params.temperature,
            "adapted request"
        );
        params
    }
}
