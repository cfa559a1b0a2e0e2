use serde_json::Value;

use crate::error::AiError;
use crate::provider::encode_json_text;
use crate::types::{ExtractedResult, ToolInvocation};

use super::PROVIDER_NAME;

// finishReason 值属于该集合才算正常完成 SAFETY/RECITATION 等视为异常
const OK_FINISH_REASONS: [&str; 6] = [
    "STOP",
    "MAX_TOKENS",
    "TOOL_CODE",
    "OTHER",
    "UNSPECIFIED",
    "FINISH_REASON_UNSPECIFIED",
];

/// Extracts the first candidate of a generateContent response.
pub(crate) fn first_result(raw: &Value, json_mode: bool) -> Result<ExtractedResult, AiError> {
    check_embedded_error(raw)?;
    let candidates = raw["candidates"].as_array().filter(|c| !c.is_empty());
    let Some(candidates) = candidates else {
        return Err(AiError::signaled(
            PROVIDER_NAME,
            "response contained no candidates",
        ));
    };
    extract_candidate(&candidates[0], json_mode)
}

/// Extracts every candidate. A response with no candidates and no error object
/// yields an empty list rather than failing.
pub(crate) fn all_results(raw: &Value, json_mode: bool) -> Result<Vec<ExtractedResult>, AiError> {
    check_embedded_error(raw)?;
    let Some(candidates) = raw["candidates"].as_array() else {
        return Ok(Vec::new());
    };
    candidates
        .iter()
        .map(|candidate| extract_candidate(candidate, json_mode))
        .collect()
}

fn check_embedded_error(raw: &Value) -> Result<(), AiError> {
    if let Some(message) = raw["error"]["message"].as_str() {
        return Err(AiError::signaled(PROVIDER_NAME, message));
    }
    // 整条 prompt 被拦截时不产生 candidates
    if let Some(reason) = raw["promptFeedback"]["blockReason"].as_str() {
        return Err(AiError::signaled(
            PROVIDER_NAME,
            format!("prompt was blocked: {reason}"),
        ));
    }
    Ok(())
}

fn extract_candidate(candidate: &Value, json_mode: bool) -> Result<ExtractedResult, AiError> {
    if let Some(reason) = candidate["finishReason"].as_str() {
        if !OK_FINISH_REASONS.contains(&reason) {
            return Err(AiError::signaled(
                PROVIDER_NAME,
                format!("generation stopped abnormally: {reason}"),
            ));
        }
    }

    let mut text = String::new();
    if let Some(parts) = candidate["content"]["parts"].as_array() {
        for part in parts {
            if let Some(call) = part.get("functionCall") {
                return Ok(ExtractedResult::ToolCall(convert_function_call(call)?));
            }
            if let Some(fragment) = part["text"].as_str() {
                text.push_str(fragment);
            }
        }
    }
    // 正常结束但 parts 为空 返回空文本

    if json_mode {
        return Ok(ExtractedResult::Json(encode_json_text(
            PROVIDER_NAME,
            &text,
        )?));
    }
    Ok(ExtractedResult::Text(text))
}

fn convert_function_call(call: &Value) -> Result<ToolInvocation, AiError> {
    let name = call["name"]
        .as_str()
        .ok_or_else(|| AiError::signaled(PROVIDER_NAME, "functionCall is missing a name"))?;
    Ok(ToolInvocation {
        // Gemini 不返回调用 ID
        id: None,
        name: name.to_string(),
        arguments: call["args"].clone(),
    })
}
