use serde_json::Value;

use crate::error::AiError;
use crate::provider::encode_json_text;
use crate::types::{ExtractedResult, ToolInvocation};

use super::PROVIDER_NAME;

// stop_reason 值属于该集合才算正常完成
const OK_STOP_REASONS: [&str; 4] = ["end_turn", "stop_sequence", "max_tokens", "tool_use"];

/// Extracts the first result from a Messages response: the first `tool_use`
/// block when one exists, the concatenated `text` blocks otherwise.
pub(crate) fn first_result(raw: &Value, json_mode: bool) -> Result<ExtractedResult, AiError> {
    let mut results = all_results(raw, json_mode)?;
    if results.is_empty() {
        return Err(AiError::signaled(
            PROVIDER_NAME,
            "response contained no content blocks",
        ));
    }
    Ok(results.remove(0))
}

/// Extracts every result the message carries: one entry per `tool_use` block,
/// plus one entry for the joined `text` blocks when any text is present.
pub(crate) fn all_results(raw: &Value, json_mode: bool) -> Result<Vec<ExtractedResult>, AiError> {
    check_embedded_error(raw)?;
    check_stop_reason(raw)?;

    let blocks = raw["content"].as_array().ok_or_else(|| {
        AiError::signaled(PROVIDER_NAME, "response is missing the content array")
    })?;

    let mut results = Vec::new();
    let mut text = String::new();
    for block in blocks {
        match block["type"].as_str() {
            Some("tool_use") => results.push(ExtractedResult::ToolCall(convert_tool_use(block)?)),
            Some("text") => {
                if let Some(fragment) = block["text"].as_str() {
                    text.push_str(fragment);
                }
            }
            _ => {}
        }
    }

    if !text.is_empty() || results.is_empty() {
        let textual = if json_mode {
            ExtractedResult::Json(encode_json_text(PROVIDER_NAME, &text)?)
        } else {
            ExtractedResult::Text(text)
        };
        // 工具调用排在文本之前
        results.push(textual);
    }

    Ok(results)
}

fn check_embedded_error(raw: &Value) -> Result<(), AiError> {
    if raw["type"].as_str() == Some("error") {
        let message = raw["error"]["message"]
            .as_str()
            .unwrap_or("unknown error")
            .to_string();
        return Err(AiError::ProviderSignaled {
            provider: PROVIDER_NAME,
            message,
        });
    }
    Ok(())
}

fn check_stop_reason(raw: &Value) -> Result<(), AiError> {
    if let Some(reason) = raw["stop_reason"].as_str() {
        if !OK_STOP_REASONS.contains(&reason) {
            return Err(AiError::signaled(
                PROVIDER_NAME,
                format!("generation stopped abnormally: {reason}"),
            ));
        }
    }
    Ok(())
}

fn convert_tool_use(block: &Value) -> Result<ToolInvocation, AiError> {
    let name = block["name"]
        .as_str()
        .ok_or_else(|| AiError::signaled(PROVIDER_NAME, "tool_use block is missing a name"))?;
    Ok(ToolInvocation {
        id: block["id"].as_str().map(str::to_string),
        name: name.to_string(),
        // input 已经是结构化 JSON
        arguments: block["input"].clone(),
    })
}
