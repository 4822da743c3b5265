//! Turn runner: drives one assistant reply through the event channel.

use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use tokio::time::timeout;

use crate::core::events::{ChatEvent, ChatEventTx, ErrorKind, EventSender};
use crate::core::interrupt::{self, InterruptedError};
use crate::prompts::{CANVAS_CODE_PROMPT, CANVAS_EXPLAIN_PROMPT};
use crate::providers::{ChatClient, ChatMessage, ProviderError, ProviderStream, StreamEvent};

/// How long to wait on the stream before re-checking the interrupt flag.
const STREAM_POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Final result of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Final accumulated text from the assistant.
    pub final_text: String,
    /// Updated conversation (includes the new assistant message).
    pub messages: Vec<ChatMessage>,
}

/// Where a phase's text deltas are routed in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeltaTarget {
    Transcript,
    Canvas,
}

/// Runs a single chat turn.
///
/// `messages` is the conversation so far, ending with the new user
/// message. Emits `TurnStarted`, streams `AssistantDelta`s, then
/// finishes with `AssistantCompleted` and `TurnCompleted`.
///
/// # Errors
/// Returns an error if the stream fails or the turn is interrupted;
/// the matching `Error`/`Interrupted` event has already been emitted.
pub async fn run_turn(
    client: &ChatClient,
    messages: Vec<ChatMessage>,
    tx: ChatEventTx,
) -> Result<TurnOutcome> {
    let sender = EventSender::new(tx);
    tracing::info!(model = client.model(), count = messages.len(), "turn started");
    sender.send_important(ChatEvent::TurnStarted).await;

    let final_text = stream_reply(client, &messages, None, &sender, DeltaTarget::Transcript).await?;

    let mut messages = messages;
    messages.push(ChatMessage::assistant(final_text.clone()));

    if !final_text.is_empty() {
        sender
            .send_important(ChatEvent::AssistantCompleted {
                text: final_text.clone(),
            })
            .await;
    }
    sender
        .send_important(ChatEvent::TurnCompleted {
            final_text: final_text.clone(),
            messages: messages.clone(),
        })
        .await;

    tracing::debug!(chars = final_text.len(), "turn completed");
    Ok(TurnOutcome {
        final_text,
        messages,
    })
}

/// Runs a canvas-mode turn: code generation, then explanation.
///
/// Phase 1 sends the trailing user message with the code-only system
/// prompt and streams into the canvas (`CanvasDelta`/`CanvasCompleted`).
/// Phase 2 sends the user message plus the generated code (as assistant
/// context) with the explanation prompt and streams into the transcript.
/// Earlier history is not sent in either phase.
///
/// # Errors
/// Returns an error if either stream fails or the turn is interrupted;
/// the matching `Error`/`Interrupted` event has already been emitted.
pub async fn run_canvas_turn(
    client: &ChatClient,
    messages: Vec<ChatMessage>,
    tx: ChatEventTx,
) -> Result<TurnOutcome> {
    let sender = EventSender::new(tx);
    let user_message = match last_user_message(&messages) {
        Ok(message) => message,
        Err(err) => return Err(emit_error_async(err, &sender).await),
    };
    tracing::info!(model = client.model(), "canvas turn started");
    sender.send_important(ChatEvent::TurnStarted).await;

    // Phase 1: code only, streamed straight into the canvas
    let phase_one = vec![user_message.clone()];
    let code = stream_reply(
        client,
        &phase_one,
        Some(CANVAS_CODE_PROMPT),
        &sender,
        DeltaTarget::Canvas,
    )
    .await?;
    sender
        .send_important(ChatEvent::CanvasCompleted { text: code.clone() })
        .await;

    ensure_not_interrupted(&sender, None).await?;

    // Phase 2: explanation, with the generated code as assistant context
    let phase_two = vec![user_message, ChatMessage::assistant(code)];
    let explanation = stream_reply(
        client,
        &phase_two,
        Some(CANVAS_EXPLAIN_PROMPT),
        &sender,
        DeltaTarget::Transcript,
    )
    .await?;

    let mut messages = messages;
    messages.push(ChatMessage::assistant(explanation.clone()));

    if !explanation.is_empty() {
        sender
            .send_important(ChatEvent::AssistantCompleted {
                text: explanation.clone(),
            })
            .await;
    }
    sender
        .send_important(ChatEvent::TurnCompleted {
            final_text: explanation.clone(),
            messages: messages.clone(),
        })
        .await;

    Ok(TurnOutcome {
        final_text: explanation,
        messages,
    })
}

/// Returns the trailing user message of the conversation.
fn last_user_message(messages: &[ChatMessage]) -> Result<ChatMessage> {
    messages
        .last()
        .filter(|m| m.role == "user")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Canvas turn requires a trailing user message"))
}

async fn ensure_not_interrupted(
    sender: &EventSender,
    partial_content: Option<String>,
) -> Result<()> {
    if interrupt::is_interrupted() {
        sender
            .send_important(ChatEvent::Interrupted { partial_content })
            .await;
        return Err(InterruptedError.into());
    }
    Ok(())
}

/// Emits an `Error` event for `err` and passes it back for propagation.
async fn emit_error_async(err: anyhow::Error, sender: &EventSender) -> anyhow::Error {
    let event = if let Some(provider_err) = err.downcast_ref::<ProviderError>() {
        ChatEvent::Error {
            kind: provider_err.kind.into(),
            message: provider_err.message.clone(),
            details: provider_err.details.clone(),
        }
    } else {
        ChatEvent::Error {
            kind: ErrorKind::Internal,
            message: err.to_string(),
            details: None,
        }
    };
    sender.send_important(event).await;
    err
}

async fn request_stream(
    client: &ChatClient,
    messages: &[ChatMessage],
    system: Option<&str>,
    sender: &EventSender,
) -> Result<ProviderStream> {
    let stream_result = tokio::select! {
        biased;
        () = interrupt::wait_for_interrupt() => {
            sender.send_important(ChatEvent::Interrupted { partial_content: None }).await;
            return Err(InterruptedError.into());
        }
        result = client.send_messages_stream(messages, system) => result,
    };
    match stream_result {
        Ok(stream) => Ok(stream),
        Err(err) => Err(emit_error_async(err, sender).await),
    }
}

/// Streams one reply to completion, routing deltas to the given target.
///
/// Returns the accumulated text. Interrupt is re-checked between polls
/// so a Ctrl+C lands within `STREAM_POLL_TIMEOUT` even on a quiet stream.
async fn stream_reply(
    client: &ChatClient,
    messages: &[ChatMessage],
    system: Option<&str>,
    sender: &EventSender,
    target: DeltaTarget,
) -> Result<String> {
    ensure_not_interrupted(sender, None).await?;
    let mut stream = request_stream(client, messages, system, sender).await?;
    let mut text = String::new();

    loop {
        let partial = (!text.is_empty()).then(|| text.clone());
        ensure_not_interrupted(sender, partial).await?;

        let event = match timeout(STREAM_POLL_TIMEOUT, stream.next()).await {
            Ok(Some(result)) => match result {
                Ok(event) => event,
                Err(err) => return Err(emit_error_async(err.into(), sender).await),
            },
            Ok(None) => return Ok(text),
            Err(_) => continue,
        };

        match event {
            StreamEvent::TextDelta(delta) if !delta.is_empty() => {
                text.push_str(&delta);
                let ev = match target {
                    DeltaTarget::Transcript => ChatEvent::AssistantDelta { text: delta },
                    DeltaTarget::Canvas => ChatEvent::CanvasDelta { text: delta },
                };
                sender.send_delta(ev);
            }
            StreamEvent::Usage(usage) => {
                sender
                    .send_important(ChatEvent::UsageUpdate {
                        input_tokens: usage.input_tokens,
                        output_tokens: usage.output_tokens,
                    })
                    .await;
            }
            StreamEvent::Completed => return Ok(text),
            StreamEvent::TextDelta(_) => {}
        }
    }
}
