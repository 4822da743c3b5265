//! SSE parsing for OpenAI-compatible chat completion streams.
//!
//! Wire chunks look like `data: {"choices":[{"delta":{"content":"..."}}]}`
//! with a final `data: [DONE]` sentinel. Token usage arrives in a chunk of
//! its own (empty `choices`) when `stream_options.include_usage` is set.

use std::collections::VecDeque;
use std::pin::Pin;

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use serde_json::Value;

use crate::providers::{ProviderError, ProviderResult, StreamEvent, TokenUsage};

/// Appends a final `\n\n` when the inner byte stream ends.
///
/// Some gateways close the connection without terminating the last SSE
/// event; the parser would silently drop it. The extra blank line is a
/// no-op for well-behaved servers.
struct SseTerminatedStream<S> {
    inner: S,
    emitted_terminator: bool,
}

impl<S> SseTerminatedStream<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            emitted_terminator: false,
        }
    }
}

impl<S, E> Stream for SseTerminatedStream<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
{
    type Item = std::result::Result<bytes::Bytes, E>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        if self.emitted_terminator {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(item)) => Poll::Ready(Some(item)),
            Poll::Ready(None) => {
                self.emitted_terminator = true;
                Poll::Ready(Some(Ok(bytes::Bytes::from_static(b"\n\n"))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// SSE parser for OpenAI-compatible chat completions.
pub struct ChatCompletionsSseParser<S> {
    inner: EventStream<SseTerminatedStream<S>>,
    pending: VecDeque<StreamEvent>,
    emitted_completed: bool,
}

impl<S> ChatCompletionsSseParser<S> {
    pub fn new<E>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    {
        Self {
            inner: SseTerminatedStream::new(stream).eventsource(),
            pending: VecDeque::new(),
            emitted_completed: false,
        }
    }

    fn complete(&mut self) {
        if !self.emitted_completed {
            self.emitted_completed = true;
            self.pending.push_back(StreamEvent::Completed);
        }
    }

    fn handle_event_data(&mut self, data: &str) -> ProviderResult<()> {
        let trimmed = data.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        if trimmed == "[DONE]" {
            self.complete();
            return Ok(());
        }

        let value = serde_json::from_str::<Value>(trimmed).map_err(|err| {
            // Suppress the end-of-stream Completed so the error stays terminal
            self.emitted_completed = true;
            ProviderError::parse(format!("Failed to parse SSE JSON: {err}"))
        })?;
        self.handle_chunk(&value)
    }

    fn handle_chunk(&mut self, value: &Value) -> ProviderResult<()> {
        // Mid-stream errors are terminal, no completion should follow
        if let Some(error) = value.get("error") {
            let error_type = error
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("error");
            let message = error
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("Unknown error");
            self.emitted_completed = true;
            return Err(ProviderError::api_error(error_type, message));
        }

        if let Some(text) = value
            .get("choices")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("delta"))
            .and_then(|delta| delta.get("content"))
            .and_then(|v| v.as_str())
            && !text.is_empty()
        {
            self.pending.push_back(StreamEvent::TextDelta(text.to_string()));
        }

        // Usage rides the final chunk; delta chunks carry "usage": null
        if let Some(usage) = value.get("usage").filter(|u| !u.is_null()) {
            self.pending.push_back(StreamEvent::Usage(parse_usage(usage)));
        }

        Ok(())
    }
}

impl<S, E> Stream for ChatCompletionsSseParser<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ProviderResult<StreamEvent>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        loop {
            if let Some(event) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.emitted_completed {
                return Poll::Ready(None);
            }

            let inner = Pin::new(&mut self.inner);
            match inner.poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if let Err(err) = self.handle_event_data(&event.data) {
                        return Poll::Ready(Some(Err(err)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.emitted_completed = true;
                    return Poll::Ready(Some(Err(ProviderError::network(format!(
                        "SSE stream error: {e}"
                    )))));
                }
                Poll::Ready(None) => {
                    // Stream ended without [DONE]
                    self.complete();
                    if let Some(event) = self.pending.pop_front() {
                        return Poll::Ready(Some(Ok(event)));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

fn parse_usage(usage: &Value) -> TokenUsage {
    let prompt_tokens = usage
        .get("prompt_tokens")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    let completion_tokens = usage
        .get("completion_tokens")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);

    TokenUsage {
        input_tokens: prompt_tokens,
        output_tokens: completion_tokens,
    }
}
