use serde_json::{Value, json};

/// content_block_delta 事件里的文本增量
pub(crate) fn delta_text(event: &Value) -> Option<String> {
    if event["type"].as_str() != Some("content_block_delta") {
        return None;
    }
    event["delta"]["text"].as_str().map(str::to_string)
}

/// Rebuilds the blocking message shape around reassembled stream text.
pub(crate) fn wrap_stream_text(text: &str) -> Value {
    json!({
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "stop_reason": "end_turn",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::anthropic_messages::response::first_result;
    use crate::types::ExtractedResult;

    #[test]
    fn only_content_block_deltas_contribute() {
        let delta = json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": "Bonjour"},
        });
        assert_eq!(delta_text(&delta), Some("Bonjour".to_string()));

        // message_delta 帧携带 stop_reason 不携带文本
        let stop = json!({
            "type": "message_delta",
            "delta": {"stop_reason": "end_turn"},
        });
        assert_eq!(delta_text(&stop), None);

        let ping = json!({"type": "ping"});
        assert_eq!(delta_text(&ping), None);
    }

    #[test]
    fn wrapped_text_extracts_like_a_blocking_response() {
        let raw = wrap_stream_text("Bonjour!");
        let result = first_result(&raw, false).unwrap();
        assert_eq!(result, ExtractedResult::Text("Bonjour!".to_string()));
    }
}
