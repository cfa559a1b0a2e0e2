use serde_json::{Value, json};

/// 流式事件与完整响应同构 文本在首个候选的 parts 里
pub(crate) fn delta_text(event: &Value) -> Option<String> {
    event["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
}

/// Rebuilds the blocking candidate shape around reassembled stream text.
pub(crate) fn wrap_stream_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP",
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::google_gemini::response::first_result;
    use crate::types::ExtractedResult;

    #[test]
    fn delta_reads_first_candidate_text() {
        let event = json!({
            "candidates": [{"content": {"parts": [{"text": "Pre"}]}}],
        });
        assert_eq!(delta_text(&event), Some("Pre".to_string()));

        let usage_only = json!({"usageMetadata": {"totalTokenCount": 5}});
        assert_eq!(delta_text(&usage_only), None);
    }

    #[test]
    fn wrapped_text_extracts_like_a_blocking_response() {
        let raw = wrap_stream_text("Pretoria");
        let result = first_result(&raw, false).unwrap();
        assert_eq!(result, ExtractedResult::Text("Pretoria".to_string()));
    }
}
