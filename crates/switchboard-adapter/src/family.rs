// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider family resolution and per-family request quirks.
//!
//! Resolution is a small decision table applied to the selected model id:
//!
//! | Condition                                              | Result                        |
//! |--------------------------------------------------------|-------------------------------|
//! | local pattern in name, or local provider forced        | `ollama/<bare>`, local base   |
//! | explicit `family/` prefix                              | that family                   |
//! | no `/` and a credential configured                     | first of openai, anthropic, groq, openrouter |
//! | otherwise                                              | unresolved (engine corrects)  |
//!
//! Each family then gets a [`FamilyAdapter`] that owns its token-limit,
//! header, and parameter quirks.

use std::collections::BTreeMap;

use switchboard_config::model::ProvidersConfig;
use switchboard_core::types::{TokenLimit, TokenLimitField};
use switchboard_core::{CanonicalRequest, ProviderFamily, ProviderParameters};
use tracing::debug;

/// Model-name fragments served by the local inference server.
const LOCAL_MODEL_PATTERNS: &[&str] = &["qwen", "mixtral", "llama"];

/// Beta header enabling extended output for Claude models.
const EXTENDED_OUTPUT_BETA: &str = "output-128k-2025-02-19";

/// Outcome of resolving a model id against the provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResolution {
    /// Model id as it will be sent, normally carrying a `family/` prefix.
    pub model: String,
    /// `None` when no family could be determined.
    pub family: Option<ProviderFamily>,
    /// Base URL forced by the resolution (local inference server).
    pub api_base: Option<String>,
}

/// Whether the model name refers to a Claude model on any platform.
pub fn mentions_claude(model: &str) -> bool {
    let lower = model.to_lowercase();
    lower.contains("claude") || lower.contains("anthropic")
}

fn configured(key: &Option<String>) -> bool {
    key.as_deref().is_some_and(|k| !k.trim().is_empty())
}

/// First family, in fixed precedence order, with a configured credential.
fn credential_family(providers: &ProvidersConfig) -> Option<ProviderFamily> {
    [
        (ProviderFamily::OpenAi, &providers.openai_api_key),
        (ProviderFamily::Anthropic, &providers.anthropic_api_key),
        (ProviderFamily::Groq, &providers.groq_api_key),
        (ProviderFamily::OpenRouter, &providers.openrouter_api_key),
    ]
    .into_iter()
    .find(|(_, key)| configured(key))
    .map(|(family, _)| family)
}

/// Resolve `model_id` to a prefixed model and provider family.
pub fn resolve_model(model_id: &str, providers: &ProvidersConfig) -> ModelResolution {
    let model_id = model_id.trim();
    let lower = model_id.to_lowercase();

    let local = LOCAL_MODEL_PATTERNS.iter().any(|p| lower.contains(p));
    if local || providers.local_provider_forced() {
        let bare = model_id.split_once('/').map_or(model_id, |(_, rest)| rest);
        debug!(model = %bare, local_pattern = local, "routing model to local inference server");
        return ModelResolution {
            model: format!("{}/{bare}", ProviderFamily::Ollama.prefix()),
            family: Some(ProviderFamily::Ollama),
            api_base: Some(providers.ollama_api_base.clone()),
        };
    }

    if model_id.contains('/') {
        return ModelResolution {
            model: model_id.to_string(),
            family: ProviderFamily::from_model(model_id),
            api_base: None,
        };
    }

    match credential_family(providers) {
        Some(family) => {
            debug!(provider = %family, "prefixing model with default provider");
            ModelResolution {
                model: format!("{}/{model_id}", family.prefix()),
                family: Some(family),
                api_base: None,
            }
        }
        None => ModelResolution {
            model: model_id.to_string(),
            family: None,
            api_base: None,
        },
    }
}

/// Provider-family quirks applied while building [`ProviderParameters`].
pub trait FamilyAdapter: Send + Sync {
    /// The family this adapter serves; `None` for unresolved models.
    fn family(&self) -> Option<ProviderFamily>;

    /// Output token limit for `model`, or `None` to omit it entirely.
    fn token_limit(&self, model: &str, max_tokens: u32) -> Option<TokenLimit> {
        let field = if model.contains("o1") {
            TokenLimitField::MaxCompletionTokens
        } else {
            TokenLimitField::MaxTokens
        };
        Some(TokenLimit {
            field,
            value: max_tokens,
        })
    }

    /// Extra HTTP headers for `model`.
    fn headers(&self, model: &str, _providers: &ProvidersConfig) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if mentions_claude(model) {
            headers.insert("anthropic-beta".to_string(), EXTENDED_OUTPUT_BETA.to_string());
        }
        headers
    }

    /// Last-step parameter adjustments.
    fn finish(
        &self,
        _params: &mut ProviderParameters,
        _request: &CanonicalRequest,
        _providers: &ProvidersConfig,
    ) {
    }
}

/// OpenAI, Groq, and unresolved models: the defaults.
struct OpenAiCompatible(Option<ProviderFamily>);

impl FamilyAdapter for OpenAiCompatible {
    fn family(&self) -> Option<ProviderFamily> {
        self.0
    }
}

struct Anthropic;

impl FamilyAdapter for Anthropic {
    fn family(&self) -> Option<ProviderFamily> {
        Some(ProviderFamily::Anthropic)
    }
}

struct OpenRouter;

impl FamilyAdapter for OpenRouter {
    fn family(&self) -> Option<ProviderFamily> {
        Some(ProviderFamily::OpenRouter)
    }

    fn headers(&self, model: &str, providers: &ProvidersConfig) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if mentions_claude(model) {
            headers.insert("anthropic-beta".to_string(), EXTENDED_OUTPUT_BETA.to_string());
        }
        if let Some(site_url) = providers.openrouter_site_url.as_deref() {
            headers.insert("HTTP-Referer".to_string(), site_url.to_string());
        }
        if let Some(app_name) = providers.openrouter_app_name.as_deref() {
            headers.insert("X-Title".to_string(), app_name.to_string());
        }
        headers
    }
}

/// Local inference server: no vendor headers.
struct Ollama;

impl FamilyAdapter for Ollama {
    fn family(&self) -> Option<ProviderFamily> {
        Some(ProviderFamily::Ollama)
    }

    fn headers(&self, _model: &str, _providers: &ProvidersConfig) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

struct Bedrock;

impl FamilyAdapter for Bedrock {
    fn family(&self) -> Option<ProviderFamily> {
        Some(ProviderFamily::Bedrock)
    }

    /// Claude 3.7 rejects any max-token field when used through an inference profile.
    fn token_limit(&self, model: &str, max_tokens: u32) -> Option<TokenLimit> {
        if model.contains("claude-3-7") {
            debug!(model, "skipping max_tokens for Claude 3.7 model");
            return None;
        }
        Some(TokenLimit {
            field: TokenLimitField::MaxTokens,
            value: max_tokens,
        })
    }

    fn finish(
        &self,
        params: &mut ProviderParameters,
        request: &CanonicalRequest,
        providers: &ProvidersConfig,
    ) {
        if request.model_id.is_none() && params.model.contains("anthropic.claude-3-7-sonnet") {
            params.model_id = Some(providers.bedrock_inference_profile.clone());
            debug!(model_id = %providers.bedrock_inference_profile, "attached Bedrock inference profile");
        }
    }
}

static OPENAI: OpenAiCompatible = OpenAiCompatible(Some(ProviderFamily::OpenAi));
static GROQ: OpenAiCompatible = OpenAiCompatible(Some(ProviderFamily::Groq));
static UNRESOLVED: OpenAiCompatible = OpenAiCompatible(None);

/// The adapter for a resolved family.
pub fn adapter_for(family: Option<ProviderFamily>) -> &'static dyn FamilyAdapter {
    match family {
        Some(ProviderFamily::OpenAi) => &OPENAI,
        Some(ProviderFamily::Groq) => &GROQ,
        Some(ProviderFamily::Anthropic) => &Anthropic,
        Some(ProviderFamily::OpenRouter) => &OpenRouter,
        Some(ProviderFamily::Ollama) => &Ollama,
        Some(ProviderFamily::Bedrock) => &Bedrock,
        None => &UNRESOLVED,
    }
}
