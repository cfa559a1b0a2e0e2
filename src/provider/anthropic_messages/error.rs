use serde::Deserialize;

use crate::error::AiError;

use super::PROVIDER_NAME;

/// Non-2xx bodies carry `{"type": "error", "error": {"type", "message"}}`.
pub(crate) fn parse_error(status: u16, body: &str) -> AiError {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<InnerError>,
    }
    #[derive(Deserialize)]
    struct InnerError {
        r#type: Option<String>,
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(error) = parsed.error {
            let mut message = error.message.unwrap_or_else(|| "unknown error".to_string());
            if let Some(kind) = error.r#type {
                message = format!("{message} ({kind})");
            }
            return AiError::signaled(PROVIDER_NAME, message);
        }
    }
    AiError::HttpStatus {
        status,
        body: body.to_string(),
    }
}
