use serde_json::Value;

use crate::error::AiError;
use crate::provider::encode_json_text;
use crate::types::{CitedAnswer, ExtractedResult, ToolInvocation};

use super::PROVIDER_NAME;

/// Extracts the first choice from a Chat Completions response tree.
pub(crate) fn first_result(raw: &Value, json_mode: bool) -> Result<ExtractedResult, AiError> {
    check_embedded_error(raw)?;
    let choices = choices(raw)?;
    let citations = top_level_citations(raw);
    extract_choice(&choices[0], json_mode, citations.as_ref())
}

/// Extracts every choice. One JSON-mode failure fails the whole batch.
pub(crate) fn all_results(raw: &Value, json_mode: bool) -> Result<Vec<ExtractedResult>, AiError> {
    check_embedded_error(raw)?;
    let choices = choices(raw)?;
    let citations = top_level_citations(raw);
    choices
        .iter()
        .map(|choice| extract_choice(choice, json_mode, citations.as_ref()))
        .collect()
}

/// 2xx 响应里也可能内嵌 error 对象
fn check_embedded_error(raw: &Value) -> Result<(), AiError> {
    if let Some(message) = raw["error"]["message"].as_str() {
        return Err(AiError::signaled(PROVIDER_NAME, message));
    }
    Ok(())
}

fn choices(raw: &Value) -> Result<&Vec<Value>, AiError> {
    match raw["choices"].as_array() {
        Some(choices) if !choices.is_empty() => Ok(choices),
        _ => Err(AiError::signaled(
            PROVIDER_NAME,
            "response contained no choices",
        )),
    }
}

/// Perplexity-style search metadata attached at the top level of the response.
fn top_level_citations(raw: &Value) -> Option<(Vec<String>, Option<usize>)> {
    let citations: Vec<String> = raw["citations"]
        .as_array()?
        .iter()
        .filter_map(|url| url.as_str().map(str::to_string))
        .collect();
    if citations.is_empty() {
        return None;
    }
    let source_count = raw["search_results"].as_array().map(Vec::len);
    Some((citations, source_count))
}

fn extract_choice(
    choice: &Value,
    json_mode: bool,
    citations: Option<&(Vec<String>, Option<usize>)>,
) -> Result<ExtractedResult, AiError> {
    let message = &choice["message"];

    if let Some(calls) = message["tool_calls"].as_array() {
        if let Some(call) = calls.first() {
            return Ok(ExtractedResult::ToolCall(convert_tool_call(call)?));
        }
    }

    // content 缺失按空文本处理
    let content = message["content"].as_str().unwrap_or_default();

    if json_mode {
        return Ok(ExtractedResult::Json(encode_json_text(
            PROVIDER_NAME,
            content,
        )?));
    }

    if let Some((citations, source_count)) = citations {
        return Ok(ExtractedResult::Cited(CitedAnswer {
            content: content.to_string(),
            citations: citations.clone(),
            source_count: *source_count,
        }));
    }

    Ok(ExtractedResult::Text(content.to_string()))
}

fn convert_tool_call(call: &Value) -> Result<ToolInvocation, AiError> {
    let function = &call["function"];
    let name = function["name"]
        .as_str()
        .ok_or_else(|| AiError::signaled(PROVIDER_NAME, "tool call is missing a function name"))?;

    // arguments 是 JSON 字符串 必须能解析
    let arguments = match &function["arguments"] {
        Value::String(encoded) => serde_json::from_str(encoded).map_err(|err| {
            AiError::signaled(
                PROVIDER_NAME,
                format!("tool call arguments are not valid JSON: {err}"),
            )
        })?,
        Value::Object(map) => Value::Object(map.clone()),
        other => {
            return Err(AiError::signaled(
                PROVIDER_NAME,
                format!("unexpected tool call arguments: {other}"),
            ));
        }
    };

    Ok(ToolInvocation {
        id: call["id"].as_str().map(str::to_string),
        name: name.to_string(),
        arguments,
    })
}
