use serde_json::{Value, json};

/// 流式事件里的增量文本路径
pub(crate) fn delta_text(event: &Value) -> Option<String> {
    event["choices"][0]["delta"]["content"]
        .as_str()
        .map(str::to_string)
}

/// Rebuilds the blocking response shape around reassembled stream text, so the
/// extractors never need to know the answer arrived over SSE.
pub(crate) fn wrap_stream_text(text: &str) -> Value {
    json!({
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop",
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::openai_chat::response::first_result;
    use crate::types::ExtractedResult;

    #[test]
    fn delta_path_reads_content_fragments() {
        let event = json!({"choices": [{"delta": {"content": "Hel"}}]});
        assert_eq!(delta_text(&event), Some("Hel".to_string()));

        let role_frame = json!({"choices": [{"delta": {"role": "assistant"}}]});
        assert_eq!(delta_text(&role_frame), None);
    }

    #[test]
    fn wrapped_text_extracts_like_a_blocking_response() {
        let raw = wrap_stream_text("The capital is Pretoria.");
        let result = first_result(&raw, false).unwrap();
        assert_eq!(
            result,
            ExtractedResult::Text("The capital is Pretoria.".to_string())
        );
    }
}
