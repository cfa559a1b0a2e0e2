use serde_json::{Map, Value, json};

use crate::error::AiError;
use crate::types::{Message, RequestConfig, Role};

/// generateContent 请求体 system 文本并入首个 user 轮次
pub(crate) fn build_body(
    messages: &[Message],
    config: &RequestConfig,
    _stream: bool,
) -> Result<Value, AiError> {
    let mut system_parts = Vec::new();
    let mut contents: Vec<Value> = Vec::new();
    for message in messages {
        match message.role {
            Role::System => system_parts.push(message.content.as_str()),
            Role::User | Role::Assistant => {
                let role = match message.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                contents.push(json!({
                    "role": role,
                    "parts": [{"text": message.content}],
                }));
            }
        }
    }

    if !system_parts.is_empty() {
        let system = system_parts.join("\n\n");
        if let Some(first_user) = contents
            .iter_mut()
            .find(|turn| turn["role"] == "user")
        {
            let existing = first_user["parts"][0]["text"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            first_user["parts"][0]["text"] = Value::String(format!("{system}\n\n{existing}"));
        } else {
            contents.insert(0, json!({"role": "user", "parts": [{"text": system}]}));
        }
    }

    let mut body = Map::new();
    body.insert("contents".to_string(), Value::Array(contents));

    let mut generation = Map::new();
    if let Some(temperature) = config.temperature {
        generation.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(top_p) = config.top_p {
        generation.insert("topP".to_string(), Value::from(top_p));
    }
    if let Some(top_k) = config.top_k {
        generation.insert("topK".to_string(), Value::from(top_k));
    }
    if let Some(max_tokens) = config.max_tokens {
        generation.insert("maxOutputTokens".to_string(), Value::from(max_tokens));
    }
    if let Some(stop) = &config.stop {
        generation.insert("stopSequences".to_string(), json!(stop));
    }
    if config.wants_json() {
        // 让模型直接产出 JSON 提取器仍按统一流程扫描
        generation.insert(
            "responseMimeType".to_string(),
            Value::String("application/json".to_string()),
        );
    }
    if !generation.is_empty() {
        body.insert("generationConfig".to_string(), Value::Object(generation));
    }

    if let Some(tools) = &config.tools {
        body.insert("tools".to_string(), Value::Array(tools.clone()));
    }

    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_turns_map_to_model_role() {
        let messages = vec![
            Message::user("first"),
            Message::assistant("second"),
            Message::user("third"),
        ];
        let body = build_body(&messages, &RequestConfig::default(), false).unwrap();
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["role"], "user");
    }

    #[test]
    fn system_text_prefixes_the_first_user_turn() {
        let messages = vec![Message::system("Be terse."), Message::user("capital of SA?")];
        let body = build_body(&messages, &RequestConfig::default(), false).unwrap();
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(
            contents[0]["parts"][0]["text"],
            "Be terse.\n\ncapital of SA?"
        );
    }

    #[test]
    fn json_mode_requests_a_json_mime_type() {
        let config = RequestConfig {
            json_mode: Some(true),
            ..Default::default()
        };
        let body = build_body(&[Message::user("hi")], &config, false).unwrap();
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn generation_config_is_omitted_when_empty() {
        let body = build_body(&[Message::user("hi")], &RequestConfig::default(), false).unwrap();
        assert!(body.get("generationConfig").is_none());
    }
}
