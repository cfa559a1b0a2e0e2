use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AiError;
use crate::json;
use crate::stream::DeltaFn;
use crate::types::{ExtractedResult, Message, RequestConfig};

pub mod anthropic_messages;
pub mod google_gemini;
pub mod openai_chat;

/// 统一的响应抽取契约 每个供应商家族实现一份
///
/// The adapter owns everything shape-specific: endpoint layout, auth headers,
/// outbound field mapping, the response tree paths, the streaming delta path,
/// and the error payload format. Everything else in the crate is family-blind.
pub trait ProviderAdapter: Send + Sync {
    /// Provider identifier such as `openai_chat`.
    fn name(&self) -> &'static str;

    /// Base URL used when the caller supplies none.
    fn default_base_url(&self) -> &'static str;

    /// Chat/completion endpoint for one query. Streaming may use a distinct
    /// endpoint (Google) or the same one with a body flag (everyone else).
    ///
    /// # Errors
    ///
    /// Returns [`AiError::InvalidArgument`] when the endpoint needs a model
    /// identifier and none is configured.
    fn chat_endpoint(
        &self,
        base_url: &str,
        config: &RequestConfig,
        api_key: &str,
        stream: bool,
    ) -> Result<String, AiError>;

    /// Model-listing endpoint.
    fn models_endpoint(&self, base_url: &str, api_key: &str) -> String;

    /// Authentication and protocol headers for this family.
    fn headers(&self, api_key: &str) -> HashMap<String, String>;

    /// Maps messages and recognized options into the provider's wire body.
    /// Only non-null options appear in the output.
    fn build_body(
        &self,
        messages: &[Message],
        config: &RequestConfig,
        stream: bool,
    ) -> Result<Value, AiError>;

    /// Extracts the first result from a raw decoded response.
    fn first_result(&self, raw: &Value, json_mode: bool) -> Result<ExtractedResult, AiError>;

    /// Extracts every candidate/choice. With JSON mode active, one failing
    /// item fails the whole batch.
    fn all_results(&self, raw: &Value, json_mode: bool) -> Result<Vec<ExtractedResult>, AiError>;

    /// Path into one streaming event that yields the delta text fragment.
    fn delta(&self) -> DeltaFn;

    /// Wraps reassembled stream text into the same raw-response shape a
    /// blocking call would have produced.
    fn wrap_stream_text(&self, text: &str) -> Value;

    /// Classifies a non-2xx response body into a provider-signaled error when
    /// it carries the family's error object, or an HTTP status error otherwise.
    fn parse_error(&self, status: u16, body: &str) -> AiError;

    /// Extracts model identifiers from a model-listing response.
    fn parse_models(&self, raw: &Value) -> Vec<String>;
}

/// 线程安全 Adapter
pub type DynAdapter = Arc<dyn ProviderAdapter>;

/// Closed set of supported provider families, resolved once at startup.
///
/// Adding a provider means adding a variant here plus its adapter module;
/// there is no runtime name-to-type lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    // snake_case 会产出 open_ai_chat 与对外名字不符
    #[serde(rename = "openai_chat")]
    OpenAiChat,
    AnthropicMessages,
    GoogleGemini,
}

impl ProviderKind {
    /// Resolves the adapter implementation for this family.
    pub fn adapter(&self) -> DynAdapter {
        match self {
            ProviderKind::OpenAiChat => Arc::new(openai_chat::OpenAiChatAdapter),
            ProviderKind::AnthropicMessages => {
                Arc::new(anthropic_messages::AnthropicMessagesAdapter)
            }
            ProviderKind::GoogleGemini => Arc::new(google_gemini::GoogleGeminiAdapter),
        }
    }
}

/// 取配置里的模型名 缺失即报参数错误
pub(crate) fn require_model(provider: &'static str, config: &RequestConfig) -> Result<String, AiError> {
    config
        .model
        .clone()
        .ok_or_else(|| AiError::invalid_argument(format!("model is required for {provider}")))
}

/// Applies JSON-mode extraction to answer text, shared by every family.
///
/// Two-step fallback: run the locator on the text itself, then once more on
/// the inner content of a ```` ```json ```` fenced block. The located value is
/// re-encoded canonically, discarding the model's own formatting.
///
/// # Errors
///
/// Returns [`AiError::Extraction`] when both attempts fail.
pub(crate) fn encode_json_text(provider: &'static str, text: &str) -> Result<String, AiError> {
    if let Some(value) = json::extract(text) {
        return Ok(json::canonical_string(&value));
    }
    if let Some(inner) = json::extract_fenced(text) {
        if let Some(value) = json::extract(inner) {
            return Ok(json::canonical_string(&value));
        }
        // A fenced body can be a bare JSON scalar the bracket scan ignores.
        if let Ok(value) = serde_json::from_str::<Value>(inner) {
            return Ok(json::canonical_string(&value));
        }
    }
    Err(AiError::extraction(format!(
        "{provider}: response does not contain valid JSON"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_json_text_prefers_direct_extraction() {
        let encoded = encode_json_text("openai_chat", r#"answer: {"a": 1} done"#)
            .expect("direct extraction should work");
        assert_eq!(encoded, r#"{"a":1}"#);
    }

    #[test]
    fn encode_json_text_falls_back_to_fenced_block() {
        // No bare JSON outside the fence; the fence body must be used.
        let text = "The result is:\n```json\n\"just a string\"\n```\n";
        let encoded = encode_json_text("openai_chat", text).expect("fenced fallback should work");
        assert_eq!(encoded, r#""just a string""#);
    }

    #[test]
    fn encode_json_text_reports_extraction_error() {
        let err = encode_json_text("google_gemini", "no json here").unwrap_err();
        match err {
            AiError::Extraction { message } => {
                assert!(
                    message.contains("google_gemini"),
                    "unexpected message: {message}"
                );
            }
            other => panic!("unexpected error type: {other:?}"),
        }
    }

    #[test]
    fn encode_json_text_is_canonical() {
        let text = "```json\n{\n    \"b\" :  [1,\n 2]\n}\n```";
        let encoded = encode_json_text("anthropic_messages", text).expect("should extract");
        assert_eq!(encoded, r#"{"b":[1,2]}"#);
    }

    #[test]
    fn provider_kind_wire_names_match_adapter_names() {
        for kind in [
            ProviderKind::OpenAiChat,
            ProviderKind::AnthropicMessages,
            ProviderKind::GoogleGemini,
        ] {
            let wire = serde_json::to_value(kind).unwrap();
            assert_eq!(wire, serde_json::json!(kind.adapter().name()));
            let back: ProviderKind = serde_json::from_value(wire).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn provider_kind_resolves_every_adapter() {
        for kind in [
            ProviderKind::OpenAiChat,
            ProviderKind::AnthropicMessages,
            ProviderKind::GoogleGemini,
        ] {
            let adapter = kind.adapter();
            assert!(!adapter.name().is_empty());
            assert!(adapter.default_base_url().starts_with("https://"));
        }
    }
}
