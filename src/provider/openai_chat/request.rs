use serde_json::{Map, Value, json};

use crate::error::AiError;
use crate::provider::require_model;
use crate::types::{Message, RequestConfig};

use super::PROVIDER_NAME;

/// Chat Completions 请求体 只写入显式设置的选项
pub(crate) fn build_body(
    messages: &[Message],
    config: &RequestConfig,
    stream: bool,
) -> Result<Value, AiError> {
    let model = require_model(PROVIDER_NAME, config)?;

    let mut body = Map::new();
    body.insert("model".to_string(), Value::String(model));
    body.insert(
        "messages".to_string(),
        Value::Array(messages.iter().map(convert_message).collect()),
    );
    if let Some(temperature) = config.temperature {
        body.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(top_p) = config.top_p {
        body.insert("top_p".to_string(), Value::from(top_p));
    }
    if let Some(max_tokens) = config.max_tokens {
        body.insert("max_tokens".to_string(), Value::from(max_tokens));
    }
    if let Some(stop) = &config.stop {
        body.insert("stop".to_string(), json!(stop));
    }
    if let Some(seed) = config.seed {
        body.insert("seed".to_string(), Value::from(seed));
    }
    if let Some(user) = &config.user {
        body.insert("user".to_string(), Value::String(user.clone()));
    }
    if let Some(tools) = &config.tools {
        body.insert("tools".to_string(), Value::Array(tools.clone()));
    }
    if stream {
        body.insert("stream".to_string(), Value::Bool(true));
    }
    Ok(Value::Object(body))
}

fn convert_message(message: &Message) -> Value {
    json!({
        "role": message.role.as_str(),
        "content": message.content,
    })
}
