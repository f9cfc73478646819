// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Switchboard invocation layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use switchboard_core::TaskCategory;

/// Top-level Switchboard configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// Process-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Provider credentials and endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Embedding backend chain settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Task classifier thresholds.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Task-to-model mapping and override heuristics.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Retry and backoff policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Decision recorder settings.
    #[serde(default)]
    pub recorder: RecorderConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Provider credentials and endpoints.
///
/// Prefix inference for unprefixed model names checks credentials in the
/// fixed order openai, anthropic, groq, openrouter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_api_base")]
    pub openai_api_base: String,

    #[serde(default)]
    pub anthropic_api_key: Option<String>,

    #[serde(default = "default_anthropic_api_base")]
    pub anthropic_api_base: String,

    /// Value of the `anthropic-version` header.
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    #[serde(default)]
    pub groq_api_key: Option<String>,

    #[serde(default = "default_groq_api_base")]
    pub groq_api_base: String,

    #[serde(default)]
    pub openrouter_api_key: Option<String>,

    #[serde(default = "default_openrouter_api_base")]
    pub openrouter_api_base: String,

    /// Sent as `HTTP-Referer` on OpenRouter requests.
    #[serde(default)]
    pub openrouter_site_url: Option<String>,

    /// Sent as `X-Title` on OpenRouter requests.
    #[serde(default)]
    pub openrouter_app_name: Option<String>,

    /// Base URL of the local inference server.
    #[serde(default = "default_ollama_api_base")]
    pub ollama_api_base: String,

    /// Set to `"ollama"` to route every model through the local inference server.
    #[serde(default)]
    pub local_provider: Option<String>,

    /// Inference profile ARN attached to Claude 3.7 Sonnet Bedrock requests
    /// when the caller supplies no `model_id`.
    #[serde(default = "default_bedrock_inference_profile")]
    pub bedrock_inference_profile: String,

    /// Per-request HTTP timeout for provider calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_api_base: default_openai_api_base(),
            anthropic_api_key: None,
            anthropic_api_base: default_anthropic_api_base(),
            anthropic_version: default_anthropic_version(),
            groq_api_key: None,
            groq_api_base: default_groq_api_base(),
            openrouter_api_key: None,
            openrouter_api_base: default_openrouter_api_base(),
            openrouter_site_url: None,
            openrouter_app_name: None,
            ollama_api_base: default_ollama_api_base(),
            local_provider: None,
            bedrock_inference_profile: default_bedrock_inference_profile(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProvidersConfig {
    /// Whether every model should be forced onto the local inference server.
    pub fn local_provider_forced(&self) -> bool {
        self.local_provider
            .as_deref()
            .is_some_and(|p| p.trim().eq_ignore_ascii_case("ollama"))
    }
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_api_base() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

fn default_groq_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_openrouter_api_base() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_ollama_api_base() -> String {
    "http://localhost:11434".to_string()
}

fn default_bedrock_inference_profile() -> String {
    "arn:aws:bedrock:us-west-2:935064898258:inference-profile/us.anthropic.claude-3-7-sonnet-20250219-v1:0"
        .to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

/// Embedding backend chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Try the local inference server first.
    #[serde(default = "default_true")]
    pub enable_local: bool,

    /// Embedding model served by the local inference server.
    #[serde(default = "default_local_embedding_model")]
    pub local_model: String,

    /// Try the hosted embedding API when an OpenAI key is configured.
    #[serde(default = "default_true")]
    pub enable_hosted: bool,

    /// Hosted embedding model.
    #[serde(default = "default_hosted_embedding_model")]
    pub hosted_model: String,

    /// Dimension of the bag-of-words fallback vector.
    #[serde(default = "default_fallback_dimension")]
    pub fallback_dimension: usize,

    /// Tokens considered by the fallback.
    #[serde(default = "default_max_fallback_tokens")]
    pub max_fallback_tokens: usize,

    /// Snapshot file loaded at startup and written on demand.
    #[serde(default)]
    pub cache_snapshot_path: Option<String>,

    /// Per-request timeout for embedding backends.
    #[serde(default = "default_embedding_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enable_local: true,
            local_model: default_local_embedding_model(),
            enable_hosted: true,
            hosted_model: default_hosted_embedding_model(),
            fallback_dimension: default_fallback_dimension(),
            max_fallback_tokens: default_max_fallback_tokens(),
            cache_snapshot_path: None,
            request_timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_local_embedding_model() -> String {
    "mxbai-embed-large:latest".to_string()
}

fn default_hosted_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_fallback_dimension() -> usize {
    100
}

fn default_max_fallback_tokens() -> usize {
    100
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

/// Task classifier thresholds.
///
/// The defaults were tuned empirically against short prompts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Use the embedding classifier. When false, a keyword heuristic over the
    /// last user message is used instead.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_coding_threshold")]
    pub coding_threshold: f32,

    #[serde(default = "default_reasoning_threshold")]
    pub reasoning_threshold: f32,

    #[serde(default = "default_creative_threshold")]
    pub creative_threshold: f32,

    #[serde(default = "default_general_threshold")]
    pub general_threshold: f32,

    /// Below-threshold results fall back to a `general` runner-up when the
    /// confidence gap is smaller than this.
    #[serde(default = "default_ambiguity_gap")]
    pub ambiguity_gap: f32,

    /// Any result below this confidence is forced to `general`.
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            coding_threshold: default_coding_threshold(),
            reasoning_threshold: default_reasoning_threshold(),
            creative_threshold: default_creative_threshold(),
            general_threshold: default_general_threshold(),
            ambiguity_gap: default_ambiguity_gap(),
            confidence_floor: default_confidence_floor(),
        }
    }
}

impl ClassifierConfig {
    /// Confidence threshold for a category.
    pub fn threshold(&self, category: TaskCategory) -> f32 {
        match category {
            TaskCategory::Coding => self.coding_threshold,
            TaskCategory::Reasoning => self.reasoning_threshold,
            TaskCategory::Creative => self.creative_threshold,
            TaskCategory::General => self.general_threshold,
        }
    }
}

fn default_coding_threshold() -> f32 {
    0.65
}

fn default_reasoning_threshold() -> f32 {
    0.60
}

fn default_creative_threshold() -> f32 {
    0.65
}

fn default_general_threshold() -> f32 {
    0.50
}

fn default_ambiguity_gap() -> f32 {
    0.10
}

fn default_confidence_floor() -> f32 {
    0.55
}

/// Task-to-model mapping and override heuristics.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Model for coding tasks.
    #[serde(default = "default_coding_model")]
    pub coding_model: String,

    /// Model for reasoning tasks.
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,

    /// Model for creative tasks.
    #[serde(default = "default_creative_model")]
    pub creative_model: String,

    /// Model for general tasks, also the fallback for anything unmapped.
    #[serde(default = "default_general_model")]
    pub general_model: String,

    /// Prompts containing any of these (case-insensitive) are routed to the coding model.
    #[serde(default = "default_coding_keywords")]
    pub coding_keywords: Vec<String>,

    /// Prompts containing any of these (case-insensitive) are routed to the reasoning model.
    #[serde(default = "default_reasoning_terms")]
    pub reasoning_terms: Vec<String>,

    /// Prompts with more words than this are routed to the reasoning model.
    #[serde(default = "default_long_prompt_words")]
    pub long_prompt_words: usize,

    /// Apply task instructions and temperature defaults for classified
    /// categories even when the caller's task hint is `auto`.
    #[serde(default = "default_true")]
    pub tune_classified_tasks: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            coding_model: default_coding_model(),
            reasoning_model: default_reasoning_model(),
            creative_model: default_creative_model(),
            general_model: default_general_model(),
            coding_keywords: default_coding_keywords(),
            reasoning_terms: default_reasoning_terms(),
            long_prompt_words: default_long_prompt_words(),
            tune_classified_tasks: true,
        }
    }
}

impl RoutingConfig {
    /// Model configured for a category.
    pub fn model_for(&self, category: TaskCategory) -> &str {
        match category {
            TaskCategory::Coding => &self.coding_model,
            TaskCategory::Reasoning => &self.reasoning_model,
            TaskCategory::Creative => &self.creative_model,
            TaskCategory::General => &self.general_model,
        }
    }
}

fn default_coding_model() -> String {
    "qwen2.5-coder:32b-instruct-q8_0".to_string()
}

fn default_reasoning_model() -> String {
    "mixtral:8x22b-instruct-v0.1-q4_K_M".to_string()
}

fn default_creative_model() -> String {
    "qwen3:8b".to_string()
}

fn default_general_model() -> String {
    "qwen3:32b".to_string()
}

fn default_coding_keywords() -> Vec<String> {
    [
        "code",
        "function",
        "programming",
        "debug",
        "algorithm",
        "class",
        "method",
        "variable",
        "compile",
        "syntax",
        "api",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_reasoning_terms() -> Vec<String> {
    [
        "analyze",
        "evaluate",
        "compare",
        "contrast",
        "implications",
        "reasoning",
        "logic",
        "argument",
        "debate",
        "philosophy",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_long_prompt_words() -> usize {
    100
}

/// Retry and backoff policy for provider invocations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum attempts per invocation, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after a rate-limit error.
    #[serde(default = "default_rate_limit_delay_secs")]
    pub rate_limit_delay_secs: u64,

    /// Delay after any other transient error.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            rate_limit_delay_secs: default_rate_limit_delay_secs(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_rate_limit_delay_secs() -> u64 {
    30
}

fn default_retry_delay_secs() -> u64 {
    5
}

/// Decision recorder settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecorderConfig {
    /// Record classification and selection decisions.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bounded queue size between the request path and the recorder worker.
    /// Records are dropped (with a warning) when the queue is full.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// JSON-lines file that receives one record per decision.
    #[serde(default)]
    pub log_path: Option<String>,

    /// Maximum prompt snippet length in characters.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel_capacity: default_channel_capacity(),
            log_path: None,
            snippet_chars: default_snippet_chars(),
        }
    }
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_snippet_chars() -> usize {
    50
}
