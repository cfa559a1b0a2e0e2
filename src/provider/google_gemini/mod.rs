//! Google Gemini generateContent 家族 密钥放查询参数

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

pub(crate) const PROVIDER_NAME: &str = "google_gemini";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Adapter for the Gemini generateContent API.
pub struct GoogleGeminiAdapter;

impl ProviderAdapter for GoogleGeminiAdapter {
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
        api_key: &str,
        stream: bool,
    ) -> Result<String, AiError> {
        let model = require_model(PROVIDER_NAME, config)?;
        let base = base_url.trim_end_matches('/');
        // 流式走独立端点并要求 SSE 编码
        Ok(if stream {
            format!("{base}/v1beta/models/{model}:streamGenerateContent?alt=sse&key={api_key}")
        } else {
            format!("{base}/v1beta/models/{model}:generateContent?key={api_key}")
        })
    }

    fn models_endpoint(&self, base_url: &str, api_key: &str) -> String {
        format!(
            "{}/v1beta/models?key={api_key}",
            base_url.trim_end_matches('/')
        )
    }

    fn headers(&self, _api_key: &str) -> HashMap<String, String> {
        HashMap::new()
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
        raw["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| model["name"].as_str())
                    .map(|name| name.strip_prefix("models/").unwrap_or(name).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}
