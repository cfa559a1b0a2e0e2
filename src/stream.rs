//! Server-sent-event decoding and message reassembly.
//!
//! Network chunk boundaries are arbitrary: one chunk may carry several
//! `data:` lines, or a single line split in the middle. [`SseDecoder`] buffers
//! partial lines until a newline arrives, and [`Reassembler`] rebuilds one
//! logical message from the decoded event payloads.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::Value;

use crate::error::AiError;
use crate::http::HttpBodyStream;

/// Standardized SSE event yielded by [`SseDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Raw `data:` payload emitted by the provider.
    Data(String),
    /// Terminal marker reported via `[DONE]`.
    Done,
}

/// Normalizes a raw chunked body into [`StreamEvent`] values.
///
/// Lines without the `data:` marker and blank lines are framing noise and are
/// dropped; consecutive `data:` lines before a blank line are joined with a
/// newline, per the SSE framing rules.
pub struct SseDecoder {
    body: HttpBodyStream,
    buffer: Vec<u8>,
    data_lines: Vec<Vec<u8>>,
    pending: VecDeque<Result<StreamEvent, AiError>>,
    stream_closed: bool,
    done_received: bool,
}

impl SseDecoder {
    /// Wraps a raw HTTP body stream and prepares it for SSE decoding.
    pub fn new(body: HttpBodyStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            data_lines: Vec::new(),
            pending: VecDeque::new(),
            stream_closed: false,
            done_received: false,
        }
    }

    fn handle_line(&mut self, line: Vec<u8>) {
        if line.starts_with(b"data:") {
            let mut data = line[5..].to_vec();
            if let Some(first) = data.first() {
                if *first == b' ' {
                    data.remove(0);
                }
            }
            self.data_lines.push(data);
        }
    }

    fn flush_event(&mut self) {
        if self.data_lines.is_empty() {
            return;
        }

        let mut joined = Vec::new();
        for (idx, mut segment) in self.data_lines.drain(..).enumerate() {
            if idx > 0 {
                joined.push(b'\n');
            }
            joined.append(&mut segment);
        }

        if joined.is_empty() {
            return;
        }

        // 非 UTF-8 事件按畸形片段跳过 不中断整条流
        let Ok(data) = String::from_utf8(joined) else {
            return;
        };

        if data.trim() == "[DONE]" {
            if !self.done_received {
                self.done_received = true;
                self.pending.push_back(Ok(StreamEvent::Done));
            }
        } else {
            self.pending.push_back(Ok(StreamEvent::Data(data)));
        }
    }

    fn drain_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
        buffer.iter().position(|b| *b == b'\n').map(|pos| {
            let mut line: Vec<u8> = buffer.drain(..=pos).collect();
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    }
}

impl Stream for SseDecoder {
    type Item = Result<StreamEvent, AiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(event) = this.pending.pop_front() {
            return Poll::Ready(Some(event));
        }

        if this.done_received && this.pending.is_empty() {
            return Poll::Ready(None);
        }

        loop {
            if this.stream_closed {
                if !this.buffer.is_empty() {
                    let line = this.buffer.drain(..).collect::<Vec<u8>>();
                    this.handle_line(line);
                }
                this.flush_event();
                return this
                    .pending
                    .pop_front()
                    .map_or(Poll::Ready(None), |event| Poll::Ready(Some(event)));
            }

            match this.body.as_mut().poll_next(cx) {
                Poll::Ready(Some(chunk_result)) => match chunk_result {
                    Ok(bytes) => {
                        this.buffer.extend_from_slice(&bytes);
                        while let Some(line) = Self::drain_line(&mut this.buffer) {
                            if line.is_empty() {
                                this.flush_event();
                                if let Some(event) = this.pending.pop_front() {
                                    return Poll::Ready(Some(event));
                                }
                            } else {
                                this.handle_line(line);
                            }
                        }
                        if let Some(event) = this.pending.pop_front() {
                            return Poll::Ready(Some(event));
                        }
                    }
                    Err(err) => return Poll::Ready(Some(Err(err))),
                },
                Poll::Ready(None) => {
                    this.stream_closed = true;
                    continue;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Extracts the delta text fragment from one decoded stream event.
///
/// Each provider family supplies its own path into the event tree.
pub type DeltaFn = fn(&Value) -> Option<String>;

/// Accumulates delta fragments from decoded event lines, in arrival order.
///
/// Event payloads that fail to decode as JSON are skipped silently: a
/// malformed or truncated fragment never fails the stream by itself.
pub struct Reassembler {
    delta: DeltaFn,
    buffer: String,
}

impl Reassembler {
    pub fn new(delta: DeltaFn) -> Self {
        Self {
            delta,
            buffer: String::new(),
        }
    }

    /// Feeds one `data:` payload; appends its delta fragment if one decodes.
    pub fn push(&mut self, data: &str) {
        if data.trim().is_empty() {
            return;
        }
        let Ok(event) = serde_json::from_str::<Value>(data) else {
            return; // malformed fragment, best-effort reconstruction continues
        };
        if let Some(fragment) = (self.delta)(&event) {
            self.buffer.push_str(&fragment);
        }
    }

    /// Consumes the reassembler and returns the concatenated message text.
    pub fn into_text(self) -> String {
        self.buffer
    }
}

/// Drives [`SseDecoder`] to completion and returns the reassembled text.
///
/// Stops at the `[DONE]` marker or at end of stream, whichever comes first.
///
/// # Errors
///
/// Propagates transport errors from the underlying body stream; individual
/// malformed fragments (undecodable JSON, invalid UTF-8) are swallowed per
/// the reassembly contract.
pub async fn reassemble(body: HttpBodyStream, delta: DeltaFn) -> Result<String, AiError> {
    let mut decoder = SseDecoder::new(body);
    let mut reassembler = Reassembler::new(delta);
    while let Some(event) = decoder.next().await {
        match event? {
            StreamEvent::Data(data) => reassembler.push(&data),
            StreamEvent::Done => break,
        }
    }
    Ok(reassembler.into_text())
}

/// Buffers an entire streaming body into a string, used to surface error
/// payloads from failed streaming requests.
pub(crate) async fn collect_body_text(
    mut body: HttpBodyStream,
    provider: &'static str,
) -> Result<String, AiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    String::from_utf8(bytes).map_err(|err| AiError::ProviderSignaled {
        provider,
        message: format!("failed to decode stream error body: {err}"),
    })
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn build_body(chunks: Vec<Result<Vec<u8>, AiError>>) -> HttpBodyStream {
        Box::pin(stream::iter(chunks))
    }

    fn openai_style_delta(event: &Value) -> Option<String> {
        event["choices"][0]["delta"]["content"]
            .as_str()
            .map(str::to_string)
    }

    #[tokio::test]
    async fn decoder_emits_data_and_done_events() {
        let chunks = vec![
            Ok(b"data: {\"text\":\"hi\"}\n\n".to_vec()),
            Ok(b"data: [DONE]\n\n".to_vec()),
        ];
        let mut decoder = SseDecoder::new(build_body(chunks));

        let first = decoder.next().await.expect("event").expect("ok");
        assert_eq!(first, StreamEvent::Data("{\"text\":\"hi\"}".to_string()));

        let second = decoder.next().await.expect("event").expect("ok");
        assert_eq!(second, StreamEvent::Done);

        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn decoder_handles_line_split_across_chunks() {
        // One logical event line arrives in two physical chunks.
        let chunks = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"co".to_vec()),
            Ok(b"ntent\":\"Hello\"}}]}\n\n".to_vec()),
        ];
        let mut decoder = SseDecoder::new(build_body(chunks));
        let event = decoder.next().await.expect("event").expect("ok");
        assert_eq!(
            event,
            StreamEvent::Data(r#"{"choices":[{"delta":{"content":"Hello"}}]}"#.to_string())
        );
    }

    #[tokio::test]
    async fn decoder_skips_invalid_utf8_events() {
        // 非 UTF-8 事件被丢弃 后续事件照常解码
        let chunks = vec![
            Ok(b"data: \xff\n\n".to_vec()),
            Ok(b"data: {\"text\":\"hi\"}\n\n".to_vec()),
        ];
        let mut decoder = SseDecoder::new(build_body(chunks));
        let event = decoder.next().await.expect("event").expect("ok");
        assert_eq!(event, StreamEvent::Data("{\"text\":\"hi\"}".to_string()));
        assert!(decoder.next().await.is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_event_does_not_abort_reassembly() {
        let chunks = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n".to_vec()),
            Ok(b"data: \xff\xfe\n\n".to_vec()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"!\"}}]}\n\ndata: [DONE]\n\n".to_vec()),
        ];
        let text = reassemble(build_body(chunks), openai_style_delta)
            .await
            .expect("stream should survive an undecodable event");
        assert_eq!(text, "ok!");
    }

    #[tokio::test]
    async fn reassembly_preserves_arrival_order() {
        let chunks = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"The \"}}]}\n\n".to_vec()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"capital \"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"is \"}}]}\n\n".to_vec()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"Pretoria.\"}}]}\n\n".to_vec()),
            Ok(b"data: [DONE]\n\n".to_vec()),
        ];
        let text = reassemble(build_body(chunks), openai_style_delta)
            .await
            .expect("reassembly should succeed");
        assert_eq!(text, "The capital is Pretoria.");
    }

    #[tokio::test]
    async fn reassembly_recovers_from_arbitrary_chunk_boundaries() {
        // The second logical line is split mid-JSON across two chunks.
        let chunks = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choi".to_vec()),
            Ok(b"ces\":[{\"delta\":{\"content\":\"lo\"}}]}\n\ndata: [DONE]\n\n".to_vec()),
        ];
        let text = reassemble(build_body(chunks), openai_style_delta)
            .await
            .expect("reassembly should succeed");
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn malformed_fragments_are_skipped_not_fatal() {
        let chunks = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n".to_vec()),
            Ok(b"data: {not valid json\n\n".to_vec()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"!\"}}]}\n\n".to_vec()),
        ];
        let text = reassemble(build_body(chunks), openai_style_delta)
            .await
            .expect("stream should survive a bad fragment");
        assert_eq!(text, "ok!");
    }

    #[tokio::test]
    async fn events_without_delta_contribute_nothing() {
        // Role-announcement and usage frames carry no content delta.
        let chunks = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n".to_vec()),
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"text\"}}]}\n\n".to_vec()),
            Ok(b"data: {\"usage\":{\"total_tokens\":3}}\n\n".to_vec()),
            Ok(b"data: [DONE]\n\n".to_vec()),
        ];
        let text = reassemble(build_body(chunks), openai_style_delta)
            .await
            .expect("reassembly should succeed");
        assert_eq!(text, "text");
    }
}
