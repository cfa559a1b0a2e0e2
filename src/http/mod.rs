use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_core::Stream;
use serde::Serialize;
use serde_json::Value;

use crate::error::AiError;

/// HTTP methods used against provider endpoints: POST for chat, GET for model
/// listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Minimal HTTP request representation shared across providers.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Builds a GET request with the given headers.
    pub fn get(url: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers,
            body: None,
            timeout: None,
        }
    }

    /// Builds a POST request carrying a serialized JSON body.
    ///
    /// Caller headers pass through verbatim; a default
    /// `Content-Type: application/json` is injected only when no supplied
    /// header already matches `Content-Type` case-insensitively.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use musubi::http::{HttpMethod, HttpRequest};
    ///
    /// let request = HttpRequest::post_json("https://example.com", HashMap::new(), b"{}".to_vec());
    /// assert_eq!(request.method, HttpMethod::Post);
    /// assert_eq!(request.headers.get("Content-Type").map(String::as_str), Some("application/json"));
    ///
    /// let custom = HashMap::from([("content-type".to_string(), "application/json; charset=utf-8".to_string())]);
    /// let request = HttpRequest::post_json("https://example.com", custom, b"{}".to_vec());
    /// assert!(!request.headers.contains_key("Content-Type"));
    /// ```
    pub fn post_json(
        url: impl Into<String>,
        mut headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        let has_content_type = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("Content-Type"));
        if !has_content_type {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers,
            body: Some(body),
            timeout: None,
        }
    }
}

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Converts the body into a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Transport`] when the body is not valid UTF-8.
    pub fn into_string(self) -> Result<String, AiError> {
        String::from_utf8(self.body).map_err(|err| AiError::transport(err.to_string()))
    }

    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP response that carries a streaming body.
pub struct HttpStreamResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: HttpBodyStream,
}

/// Alias for the body stream returned by [`HttpTransport::send_stream`].
///
/// Chunk boundaries carry no alignment guarantees: a logical SSE line may be
/// split across two chunks, and one chunk may hold several lines.
pub type HttpBodyStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, AiError>> + Send>>;

/// Transport abstraction decoupling providers from the concrete HTTP client.
///
/// Implementations map socket-level failures (DNS, refused connections,
/// timeouts) to [`AiError::Transport`]; status-code classification happens in
/// the layers above, which can consult the response body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves once the full response body is available.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AiError>;

    /// Sends a request and returns the body as a chunk stream.
    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, AiError>;
}

/// Thread-safe handle to a transport implementation.
pub type DynHttpTransport = Arc<dyn HttpTransport>;

/// Serializes `body` to JSON and issues a POST through the transport.
///
/// Centralizing serialization keeps header policy and error mapping identical
/// across providers.
///
/// # Errors
///
/// Returns [`AiError::InvalidArgument`] when serialization fails, otherwise
/// forwards the transport's own error.
pub async fn post_json<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpResponse, AiError> {
    let payload = serde_json::to_vec(body).map_err(|err| {
        AiError::invalid_argument(format!("failed to serialize request: {err}"))
    })?;
    transport
        .send(HttpRequest::post_json(url, headers, payload))
        .await
}

/// Like [`post_json`] but returns the streaming response, for SSE exchanges.
pub async fn post_json_stream<T: Serialize>(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
    body: &T,
) -> Result<HttpStreamResponse, AiError> {
    let payload = serde_json::to_vec(body).map_err(|err| {
        AiError::invalid_argument(format!("failed to serialize request: {err}"))
    })?;
    transport
        .send_stream(HttpRequest::post_json(url, headers, payload))
        .await
}

/// Issues a GET and decodes the body as JSON, classifying non-2xx statuses.
///
/// Used by the model-listing endpoints.
///
/// # Errors
///
/// Returns [`AiError::HttpStatus`] for non-2xx responses and
/// [`AiError::Transport`] for undecodable bodies.
pub async fn get_json(
    transport: &dyn HttpTransport,
    url: impl Into<String>,
    headers: HashMap<String, String>,
) -> Result<Value, AiError> {
    let response = transport.send(HttpRequest::get(url, headers)).await?;
    let status = response.status;
    let text = response.into_string()?;
    if !(200..300).contains(&status) {
        return Err(AiError::HttpStatus { status, body: text });
    }
    serde_json::from_str(&text)
        .map_err(|err| AiError::transport(format!("response body is not valid JSON: {err}")))
}

pub mod reqwest;
