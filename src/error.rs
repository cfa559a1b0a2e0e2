use thiserror::Error;

/// Aggregates every failure mode exposed by the unified client.
///
/// The variants are deliberately disjoint so callers can pattern-match instead of
/// string-sniffing a single generic failure: a caller mistake ([`AiError::InvalidArgument`])
/// is never retried, a network fault ([`AiError::Transport`]) may be, and a model that
/// ignored a JSON instruction ([`AiError::Extraction`]) can be re-prompted.
#[derive(Debug, Error)]
pub enum AiError {
    /// Caller-side mistakes detected before any network activity: empty prompts,
    /// empty API keys, unknown configuration option names.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    /// Socket-level failures such as DNS resolution, refused connections, or timeouts.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// A non-2xx HTTP status whose body carried no recognizable provider error object.
    #[error("http status {status}: {body}")]
    HttpStatus {
        /// Status code returned by the upstream endpoint.
        status: u16,
        /// Raw response body, kept verbatim for debugging.
        body: String,
    },
    /// JSON mode was requested but neither the direct scan nor the fenced-block
    /// fallback located a decodable JSON value in the model text.
    #[error("json extraction failed: {message}")]
    Extraction { message: String },
    /// The provider payload itself declared an error or block condition.
    #[error("provider {provider} signaled: {message}")]
    ProviderSignaled {
        /// Provider identifier such as `openai_chat`.
        provider: &'static str,
        /// The provider's own message text, unmodified.
        message: String,
    },
}

impl AiError {
    /// Creates an [`AiError::InvalidArgument`] from a textual description.
    ///
    /// # Examples
    ///
    /// ```
    /// use musubi::error::AiError;
    ///
    /// let err = AiError::invalid_argument("prompt cannot be empty");
    /// assert!(matches!(err, AiError::InvalidArgument { .. }));
    /// ```
    pub fn invalid_argument<T: Into<String>>(message: T) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates an [`AiError::Transport`] from a textual description.
    ///
    /// The helper keeps call sites concise and guarantees consistent formatting of
    /// transport failures across the crate.
    ///
    /// # Examples
    ///
    /// ```
    /// use musubi::error::AiError;
    ///
    /// let err = AiError::transport("dns lookup failed");
    /// assert!(matches!(err, AiError::Transport { .. }));
    /// ```
    pub fn transport<T: Into<String>>(message: T) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an [`AiError::Extraction`] from a textual description.
    pub fn extraction<T: Into<String>>(message: T) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Creates an [`AiError::ProviderSignaled`] with the given provider name and message.
    ///
    /// # Examples
    ///
    /// ```
    /// use musubi::error::AiError;
    ///
    /// let err = AiError::signaled("google_gemini", "Prompt was blocked: SAFETY");
    /// assert!(matches!(err, AiError::ProviderSignaled { provider: "google_gemini", .. }));
    /// ```
    pub fn signaled<T: Into<String>>(provider: &'static str, message: T) -> Self {
        Self::ProviderSignaled {
            provider,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_status_and_body() {
        let err = AiError::HttpStatus {
            status: 503,
            body: "upstream overloaded".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("503"), "unexpected display: {rendered}");
        assert!(
            rendered.contains("upstream overloaded"),
            "unexpected display: {rendered}"
        );
    }

    #[test]
    fn helpers_build_matching_variants() {
        assert!(matches!(
            AiError::invalid_argument("x"),
            AiError::InvalidArgument { .. }
        ));
        assert!(matches!(AiError::transport("x"), AiError::Transport { .. }));
        assert!(matches!(AiError::extraction("x"), AiError::Extraction { .. }));
        match AiError::signaled("openai_chat", "bad") {
            AiError::ProviderSignaled { provider, message } => {
                assert_eq!(provider, "openai_chat");
                assert_eq!(message, "bad");
            }
            other => panic!("unexpected error type: {other:?}"),
        }
    }
}
