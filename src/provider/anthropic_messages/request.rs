use serde_json::{Map, Value, json};

use crate::error::AiError;
use crate::provider::require_model;
use crate::types::{Message, RequestConfig, Role};

use super::PROVIDER_NAME;

// Messages API 要求显式 max_tokens
const DEFAULT_MAX_TOKENS: u64 = 1024;

/// Messages 请求体 system 消息提升为顶层字段
pub(crate) fn build_body(
    messages: &[Message],
    config: &RequestConfig,
    stream: bool,
) -> Result<Value, AiError> {
    let model = require_model(PROVIDER_NAME, config)?;

    let mut system_parts = Vec::new();
    let mut turns = Vec::new();
    for message in messages {
        match message.role {
            Role::System => system_parts.push(message.content.as_str()),
            Role::User | Role::Assistant => turns.push(json!({
                "role": message.role.as_str(),
                "content": message.content,
            })),
        }
    }

    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(model));
    body.insert(
        "max_tokens".to_string(),
        Value::from(config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
    );
    if !system_parts.is_empty() {
        body.insert(
            "system".to_string(),
            Value::String(system_parts.join("\n\n")),
        );
    }
    body.insert("messages".to_string(), Value::Array(turns));
    if let Some(temperature) = config.temperature {
        body.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(top_p) = config.top_p {
        body.insert("top_p".to_string(), Value::from(top_p));
    }
    if let Some(top_k) = config.top_k {
        body.insert("top_k".to_string(), Value::from(top_k));
    }
    if let Some(stop) = &config.stop {
        body.insert("stop_sequences".to_string(), json!(stop));
    }
    if let Some(user) = &config.user {
        body.insert("metadata".to_string(), json!({"user_id": user}));
    }
    if let Some(tools) = &config.tools {
        body.insert("tools".to_string(), Value::Array(tools.clone()));
    }
    if stream {
        body.insert("stream".to_string(), Value::Bool(true));
    }
    Ok(Value::Object(body))
}
