// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the classifier, selector, adapter, and engine.

use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;

use futures_core::Stream;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::SwitchboardError;

/// Model name that asks the pipeline to pick a model from the classification.
pub const AUTO_MODEL: &str = "auto";

// --- Classification ---

/// Coarse task bucket used to pick a specialized backend model.
///
/// `chat` is accepted as an alias for [`TaskCategory::General`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Coding,
    Reasoning,
    Creative,
    #[strum(to_string = "general", serialize = "chat")]
    #[serde(alias = "chat")]
    General,
}

impl TaskCategory {
    /// All categories in declaration order.
    pub const ALL: [TaskCategory; 4] = [
        TaskCategory::Coding,
        TaskCategory::Reasoning,
        TaskCategory::Creative,
        TaskCategory::General,
    ];
}

/// Task type hint supplied by the orchestrator: either `auto` or an explicit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskHint {
    #[default]
    Auto,
    Task(TaskCategory),
}

impl TaskHint {
    /// The explicit category, if one was given.
    pub fn category(self) -> Option<TaskCategory> {
        match self {
            TaskHint::Auto => None,
            TaskHint::Task(category) => Some(category),
        }
    }
}

impl FromStr for TaskHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(TaskHint::Auto);
        }
        TaskCategory::from_str(s.trim())
            .map(TaskHint::Task)
            .map_err(|_| format!("unknown task type `{s}` (expected auto, coding, reasoning, creative, general or chat)"))
    }
}

impl TryFrom<String> for TaskHint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskHint> for String {
    fn from(hint: TaskHint) -> Self {
        hint.to_string()
    }
}

impl fmt::Display for TaskHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskHint::Auto => f.write_str("auto"),
            TaskHint::Task(category) => write!(f, "{category}"),
        }
    }
}

/// Result of classifying a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The assigned category. Always set; `General` is the fallback.
    pub category: TaskCategory,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

impl ClassificationResult {
    /// The "no signal" result used when embeddings are unavailable.
    pub fn no_signal() -> Self {
        Self {
            category: TaskCategory::General,
            confidence: 0.0,
        }
    }
}

/// Why the selector deviated from the base task-to-model mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OverrideReason {
    CodingKeywordsDetected,
    LongComplexPrompt,
    ReasoningTermsDetected,
}

/// The model picked for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    /// Never empty.
    pub model_id: String,
    pub override_reason: Option<OverrideReason>,
}

// --- Messages ---

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Provider prompt-cache marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheControl {
    /// Cache control type (e.g., "ephemeral").
    #[serde(rename = "type")]
    pub control_type: String,
}

impl CacheControl {
    /// Creates an ephemeral cache control marker.
    pub fn ephemeral() -> Self {
        Self {
            control_type: "ephemeral".to_string(),
        }
    }
}

/// A structured content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cache_control: Option<CacheControl>,
    },
    ImageUrl {
        image_url: serde_json::Value,
    },
}

impl ContentBlock {
    /// A plain text block without a cache hint.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
            cache_control: None,
        }
    }
}

/// Message content: a plain string or a list of structured blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Concatenated text of the content, blocks joined with newlines.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text, .. } => Some(text.as_str()),
                    ContentBlock::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
}

impl Message {
    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
            name: None,
            tool_call_id: None,
            tool_calls: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, text)
    }

    /// Text of the message content.
    pub fn text(&self) -> String {
        self.content.text()
    }
}

// --- Requests ---

fn default_tool_choice() -> String {
    "auto".to_string()
}

/// The provider-neutral request submitted by the orchestrator.
///
/// The pipeline reads this and transforms a copy; the caller's messages are
/// never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    pub messages: Vec<Message>,
    /// Explicit model identifier or [`AUTO_MODEL`].
    pub model: String,
    #[serde(default)]
    pub task: TaskHint,
    /// `0.0` means "unset".
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub tools: Vec<serde_json::Value>,
    #[serde(default = "default_tool_choice")]
    pub tool_choice: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub enable_thinking: bool,
    #[serde(default)]
    pub reasoning_effort: Option<String>,
    #[serde(default)]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub response_format: Option<serde_json::Value>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

impl CanonicalRequest {
    /// Creates a request with every tunable left at its default.
    pub fn new(messages: Vec<Message>, model: impl Into<String>) -> Self {
        Self {
            messages,
            model: model.into(),
            task: TaskHint::Auto,
            temperature: 0.0,
            max_tokens: None,
            tools: Vec::new(),
            tool_choice: default_tool_choice(),
            stream: false,
            enable_thinking: false,
            reasoning_effort: None,
            top_p: None,
            response_format: None,
            api_key: None,
            api_base: None,
            model_id: None,
        }
    }

    /// Whether the caller asked for automatic model selection.
    pub fn wants_auto_model(&self) -> bool {
        self.model.trim().eq_ignore_ascii_case(AUTO_MODEL)
    }

    /// Text of the most recent user message, if any.
    pub fn last_user_text(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(Message::text)
    }
}

// --- Provider parameters ---

/// A backend LLM service family with its own request and auth conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    OpenAi,
    Anthropic,
    Groq,
    OpenRouter,
    Ollama,
    Bedrock,
}

impl ProviderFamily {
    /// The model-name prefix for this family (e.g. `openai` in `openai/gpt-4o`).
    pub fn prefix(self) -> &'static str {
        match self {
            ProviderFamily::OpenAi => "openai",
            ProviderFamily::Anthropic => "anthropic",
            ProviderFamily::Groq => "groq",
            ProviderFamily::OpenRouter => "openrouter",
            ProviderFamily::Ollama => "ollama",
            ProviderFamily::Bedrock => "bedrock",
        }
    }

    /// Reads the family from an explicit `family/` prefix on a model identifier.
    pub fn from_model(model: &str) -> Option<Self> {
        let (prefix, _) = model.split_once('/')?;
        prefix.parse().ok()
    }
}

/// Which request field carries the output token limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenLimitField {
    MaxTokens,
    MaxCompletionTokens,
}

/// Output token limit and the field name it is sent under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLimit {
    pub field: TokenLimitField,
    pub value: u32,
}

/// Single-request parameters handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderParameters {
    /// Model identifier, normally carrying a `family/` prefix.
    pub model: String,
    /// Explicit family when the adapter pinned one.
    pub provider: Option<ProviderFamily>,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub token_limit: Option<TokenLimit>,
    pub tools: Vec<serde_json::Value>,
    pub tool_choice: Option<String>,
    pub response_format: Option<serde_json::Value>,
    pub stream: bool,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model_id: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub reasoning_effort: Option<String>,
}

impl ProviderParameters {
    /// Parameters for `model` with every optional field unset.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            provider: None,
            messages,
            temperature: 0.0,
            top_p: None,
            token_limit: None,
            tools: Vec::new(),
            tool_choice: None,
            response_format: None,
            stream: false,
            api_key: None,
            api_base: None,
            model_id: None,
            headers: BTreeMap::new(),
            reasoning_effort: None,
        }
    }

    /// Resolved provider family: the pinned one, else the model prefix.
    pub fn family(&self) -> Option<ProviderFamily> {
        self.provider.or_else(|| ProviderFamily::from_model(&self.model))
    }

    /// The model name without its first `family/` prefix.
    pub fn bare_model(&self) -> &str {
        match self.model.split_once('/') {
            Some((prefix, rest)) if prefix.parse::<ProviderFamily>().is_ok() => rest,
            _ => &self.model,
        }
    }
}

// --- Responses ---

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A complete, non-streamed provider response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: Option<String>,
    pub model: String,
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<serde_json::Value>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// An incremental piece of a streamed response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub text: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<serde_json::Value>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl StreamChunk {
    /// A chunk carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Stream of response chunks. Dropping it releases the upstream connection.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, SwitchboardError>> + Send>>;
