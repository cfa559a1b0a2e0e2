//! Anthropic Messages 家族

use std::collections::HashMap;

use serde_json::Value;

use crate::error::AiError;
use crate::stream::DeltaFn;
use crate::types::{ExtractedResult, Message, RequestConfig};

use super::{ProviderAdapter, require_model};

mod error;
mod request;
mod response;
mod stream;

pub(crate) const PROVIDER_NAME: &str = "anthropic_messages";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Adapter for the Anthropic Messages API.
pub struct AnthropicMessagesAdapter;

impl ProviderAdapter for AnthropicMessagesAdapter {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn default_base_url(&self) -> &'static str {
        DEFAULT_BASE_URL
    }

    fn chat_endpoint(
        &self,
        base_url: &str,
        config: &RequestConfig,
        _api_key: &str,
        _stream: bool,
    ) -> Result<String, AiError> {
        require_model(PROVIDER_NAME, config)?;
        Ok(format!("{}/v1/messages", base_url.trim_end_matches('/')))
    }

    fn models_endpoint(&self, base_url: &str, _api_key: &str) -> String {
        format!("{}/v1/models", base_url.trim_end_matches('/'))
    }

    fn headers(&self, api_key: &str) -> HashMap<String, String> {
        HashMap::from([
            ("x-api-key".to_string(), api_key.to_string()),
            ("anthropic-version".to_string(), API_VERSION.to_string()),
        ])
    }

    fn build_body(
        &self,
        messages: &[Message],
        config: &RequestConfig,
        stream: bool,
    ) -> Result<Value, AiError> {
        request::build_body(messages, config, stream)
    }

    fn first_result(&self, raw: &Value, json_mode: bool) -> Result<ExtractedResult, AiError> {
        response::first_result(raw, json_mode)
    }

    fn all_results(&self, raw: &Value, json_mode: bool) -> Result<Vec<ExtractedResult>, AiError> {
        response::all_results(raw, json_mode)
    }

    fn delta(&self) -> DeltaFn {
        stream::delta_text
    }

    fn wrap_stream_text(&self, text: &str) -> Value {
        stream::wrap_stream_text(text)
    }

    fn parse_error(&self, status: u16, body: &str) -> AiError {
        error::parse_error(status, body)
    }

    fn parse_models(&self, raw: &Value) -> Vec<String> {
        raw["data"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| model["id"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_carry_key_and_protocol_version() {
        let headers = AnthropicMessagesAdapter.headers("sk-ant-test");
        assert_eq!(headers.get("x-api-key").map(String::as_str), Some("sk-ant-test"));
        assert_eq!(
            headers.get("anthropic-version").map(String::as_str),
            Some("2023-06-01")
        );
    }

    #[test]
    fn endpoint_is_versioned_messages() {
        let config = RequestConfig {
            model: Some("claude-sonnet-4-5".to_string()),
            ..Default::default()
        };
        let url = AnthropicMessagesAdapter
            .chat_endpoint("https://api.anthropic.com/", &config, "k", true)
            .unwrap();
        assert_eq!(url, "https://api.anthropic.com/v1/messages");
    }
}
