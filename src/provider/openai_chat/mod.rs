//! Chat Completions 家族 OpenAI / Mistral / Groq / xAI / DeepSeek 共用

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

pub(crate) const PROVIDER_NAME: &str = "openai_chat";

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Adapter for every endpoint speaking the Chat Completions dialect.
///
/// Mistral, Groq, xAI and DeepSeek differ from OpenAI only in base URL, so one
/// adapter covers all of them.
pub struct OpenAiChatAdapter;

fn versioned(base_url: &str, suffix: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/{suffix}")
    } else {
        format!("{base}/v1/{suffix}")
    }
}

impl ProviderAdapter for OpenAiChatAdapter {
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
        Ok(versioned(base_url, "chat/completions"))
    }

    fn models_endpoint(&self, base_url: &str, _api_key: &str) -> String {
        versioned(base_url, "models")
    }

    fn headers(&self, api_key: &str) -> HashMap<String, String> {
        HashMap::from([("Authorization".to_string(), format!("Bearer {api_key}"))])
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
