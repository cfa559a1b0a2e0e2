//! Shared data structures modeling chat prompts and normalized results.
//!
//! These types are the provider-agnostic surface of the crate: callers build
//! [`Message`]s and a [`RequestConfig`], and get [`ExtractedResult`]s back, no
//! matter which provider family served the request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AiError;

/// Chat role recognized by every provider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible and Anthropic payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation. Order within a message list is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Caller input for a query: a bare prompt string or an explicit conversation.
///
/// A string becomes a single user message; a message list is forwarded in
/// order. Both forms are validated before any network call.
#[derive(Debug, Clone)]
pub enum Prompt {
    Text(String),
    Conversation(Vec<Message>),
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Text(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Text(text)
    }
}

impl From<Vec<Message>> for Prompt {
    fn from(messages: Vec<Message>) -> Self {
        Prompt::Conversation(messages)
    }
}

impl Prompt {
    /// Rejects empty input, then expands into an ordered message list with the
    /// optional system prompt prepended.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidArgument`] for an empty/whitespace-only string
    /// or for a message list that is empty or entirely empty-content.
    pub fn into_messages(self, system_prompt: Option<&str>) -> Result<Vec<Message>, AiError> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt {
            messages.push(Message::system(system));
        }
        match self {
            Prompt::Text(text) => {
                if text.trim().is_empty() {
                    return Err(AiError::invalid_argument("prompt cannot be empty"));
                }
                messages.push(Message::user(text));
            }
            Prompt::Conversation(turns) => {
                if turns.iter().all(|m| m.content.trim().is_empty()) {
                    return Err(AiError::invalid_argument("message list cannot be empty"));
                }
                messages.extend(turns);
            }
        }
        Ok(messages)
    }
}

/// Recognized request option names, closed by construction.
///
/// [`RequestConfig::set`] resolves a caller-supplied name against this set and
/// fails fast on anything else, so option-name typos surface immediately
/// instead of being silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey {
    Model,
    Temperature,
    MaxTokens,
    Stop,
    Stream,
    JsonMode,
    Tools,
    TopP,
    TopK,
    Seed,
    User,
    SystemPrompt,
}

impl OptionKey {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "model" => Self::Model,
            "temperature" => Self::Temperature,
            "max_tokens" => Self::MaxTokens,
            "stop" => Self::Stop,
            "stream" => Self::Stream,
            "json_mode" => Self::JsonMode,
            "tools" => Self::Tools,
            "top_p" => Self::TopP,
            "top_k" => Self::TopK,
            "seed" => Self::Seed,
            "user" => Self::User,
            "system_prompt" => Self::SystemPrompt,
            _ => return None,
        })
    }
}

/// Tunable request options shared across providers.
///
/// Every field is optional; only non-null options are serialized into the
/// outbound provider body. Fields can be written directly or through the
/// dynamic [`RequestConfig::set`] accessor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Model identifier override.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Maximum number of output tokens.
    pub max_tokens: Option<u64>,
    /// Sequences where generation stops.
    pub stop: Option<Vec<String>>,
    /// Whether to stream the response over SSE.
    pub stream: Option<bool>,
    /// Whether the answer text should be treated as embedded JSON.
    pub json_mode: Option<bool>,
    /// Tool definitions forwarded verbatim to the provider.
    pub tools: Option<Vec<Value>>,
    /// Nucleus sampling parameter.
    pub top_p: Option<f64>,
    /// Top-k sampling parameter (Google and Anthropic).
    pub top_k: Option<u64>,
    /// Deterministic sampling seed where supported.
    pub seed: Option<u64>,
    /// End-user identifier forwarded for provider-side monitoring.
    pub user: Option<String>,
    /// System prompt prepended to the conversation.
    pub system_prompt: Option<String>,
}

impl RequestConfig {
    /// Sets a recognized option by name, type-checking the supplied value.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidArgument`] for an unknown option name or a
    /// value of the wrong JSON type.
    ///
    /// # Examples
    ///
    /// ```
    /// use musubi::types::RequestConfig;
    /// use serde_json::json;
    ///
    /// let mut config = RequestConfig::default();
    /// config.set("temperature", json!(0.2)).unwrap();
    /// assert_eq!(config.temperature, Some(0.2));
    /// assert!(config.set("temprature", json!(0.2)).is_err());
    /// ```
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), AiError> {
        let key = OptionKey::parse(name)
            .ok_or_else(|| AiError::invalid_argument(format!("unknown option: {name}")))?;
        match key {
            OptionKey::Model => self.model = Some(expect_string(name, value)?),
            OptionKey::Temperature => self.temperature = Some(expect_f64(name, value)?),
            OptionKey::MaxTokens => self.max_tokens = Some(expect_u64(name, value)?),
            OptionKey::Stop => {
                let items = expect_array(name, value)?;
                let mut stop = Vec::with_capacity(items.len());
                for item in items {
                    stop.push(expect_string(name, item)?);
                }
                self.stop = Some(stop);
            }
            OptionKey::Stream => self.stream = Some(expect_bool(name, value)?),
            OptionKey::JsonMode => self.json_mode = Some(expect_bool(name, value)?),
            OptionKey::Tools => self.tools = Some(expect_array(name, value)?),
            OptionKey::TopP => self.top_p = Some(expect_f64(name, value)?),
            OptionKey::TopK => self.top_k = Some(expect_u64(name, value)?),
            OptionKey::Seed => self.seed = Some(expect_u64(name, value)?),
            OptionKey::User => self.user = Some(expect_string(name, value)?),
            OptionKey::SystemPrompt => self.system_prompt = Some(expect_string(name, value)?),
        }
        Ok(())
    }

    /// Whether the caller asked for streaming delivery.
    pub fn wants_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    /// Whether the caller asked for JSON-mode extraction.
    pub fn wants_json(&self) -> bool {
        self.json_mode.unwrap_or(false)
    }
}

fn type_error(name: &str, expected: &str, value: &Value) -> AiError {
    AiError::invalid_argument(format!("option {name} expects {expected}, got {value}"))
}

fn expect_string(name: &str, value: Value) -> Result<String, AiError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(type_error(name, "a string", &other)),
    }
}

fn expect_bool(name: &str, value: Value) -> Result<bool, AiError> {
    value
        .as_bool()
        .ok_or_else(|| type_error(name, "a boolean", &value))
}

fn expect_f64(name: &str, value: Value) -> Result<f64, AiError> {
    value
        .as_f64()
        .ok_or_else(|| type_error(name, "a number", &value))
}

fn expect_u64(name: &str, value: Value) -> Result<u64, AiError> {
    value
        .as_u64()
        .ok_or_else(|| type_error(name, "a non-negative integer", &value))
}

fn expect_array(name: &str, value: Value) -> Result<Vec<Value>, AiError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(type_error(name, "an array", &other)),
    }
}

/// Tool invocation decoded from a provider response.
///
/// `arguments` is always a parsed JSON tree: providers that embed arguments as
/// a JSON-encoded string have it decoded during extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-supplied call identifier, absent for providers without one.
    pub id: Option<String>,
    /// Function name the model chose.
    pub name: String,
    /// Parsed argument object.
    pub arguments: Value,
}

/// Answer text bundled with the citation metadata a search-backed provider
/// attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitedAnswer {
    /// The answer text itself.
    pub content: String,
    /// Citation URLs in provider order.
    pub citations: Vec<String>,
    /// Number of distinct sources consulted, when reported.
    pub source_count: Option<usize>,
}

/// The uniform result contract produced by every provider extractor.
///
/// A result is always an owned value; the raw provider payload can be
/// discarded once extraction has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractedResult {
    /// Plain answer text (possibly empty for length-stopped candidates).
    Text(String),
    /// Canonically re-encoded JSON string produced by JSON-mode extraction.
    Json(String),
    /// Structured tool/function invocation.
    ToolCall(ToolInvocation),
    /// Answer text with attached citation metadata.
    Cited(CitedAnswer),
}

impl ExtractedResult {
    /// Returns the textual payload for [`Text`](Self::Text), [`Json`](Self::Json),
    /// and [`Cited`](Self::Cited) results.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtractedResult::Text(text) | ExtractedResult::Json(text) => Some(text),
            ExtractedResult::Cited(cited) => Some(&cited.content),
            ExtractedResult::ToolCall(_) => None,
        }
    }
}
