use serde::Deserialize;
use serde_json::Value;

use crate::error::AiError;

use super::PROVIDER_NAME;

/// Classifies a non-2xx body: a recognizable `error` object becomes a
/// provider-signaled error, anything else stays a bare HTTP status.
pub(crate) fn parse_error(status: u16, body: &str) -> AiError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        message: Option<String>,
        code: Option<Value>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(error) = parsed.error {
            let mut message = error.message.unwrap_or_else(|| "unknown error".to_string());
            if let Some(code) = error.code {
                message = format!("{message} ({code})");
            }
            return AiError::signaled(PROVIDER_NAME, message);
        }
    }
    AiError::HttpStatus {
        status,
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_object_becomes_provider_signaled() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        match parse_error(401, body) {
            AiError::ProviderSignaled { provider, message } => {
                assert_eq!(provider, "openai_chat");
                assert_eq!(message, "Invalid API key (\"invalid_api_key\")");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn opaque_body_stays_http_status() {
        match parse_error(502, "<html>Bad Gateway</html>") {
            AiError::HttpStatus { status, body } => {
                assert_eq!(status, 502);
                assert!(body.contains("Bad Gateway"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
