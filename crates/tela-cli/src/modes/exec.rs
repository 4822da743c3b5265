//! Non-interactive exec mode.
//!
//! One prompt in, one streamed reply out. Deltas go to stdout as they
//! arrive; errors and interrupts go to stderr so piped output stays
//! clean.

use std::io::{Stderr, Stdout, Write, stderr, stdout};

use anyhow::Result;
use tokio::task::JoinHandle;

use tela_core::config::Config;
use tela_core::core::events::{ChatEvent, ChatEventRx, create_event_channel};
use tela_core::core::turn;
use tela_core::providers::{ChatClient, ChatMessage};

/// Sends a prompt to the model and streams the reply to stdout.
///
/// Returns the complete response text. The printer task is awaited
/// before the turn result is propagated, so every buffered event lands
/// on screen before an error does.
pub async fn run_exec(prompt: &str, config: &Config) -> Result<String> {
    let client = ChatClient::from_config(config)?;
    let messages = vec![ChatMessage::user(prompt)];

    let (tx, rx) = create_event_channel();
    let printer = spawn_printer(rx);

    let result = turn::run_turn(&client, messages, tx).await;
    let _ = printer.await;

    Ok(result?.final_text)
}

/// Consumes events off the channel until the turn side drops its
/// sender, then flushes the trailing newline.
fn spawn_printer(mut rx: ChatEventRx) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut printer = Printer::new();
        while let Some(event) = rx.recv().await {
            printer.handle((*event).clone());
        }
        printer.finish();
    })
}

/// Writes deltas to stdout and error or interrupt notices to stderr.
/// Stdout ends with exactly one newline once any text was printed.
struct Printer {
    stdout: Stdout,
    stderr: Stderr,
    newline_pending: bool,
}

impl Printer {
    fn new() -> Self {
        Self {
            stdout: stdout(),
            stderr: stderr(),
            newline_pending: false,
        }
    }

    fn handle(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::AssistantDelta { text } if !text.is_empty() => {
                let _ = write!(self.stdout, "{text}");
                let _ = self.stdout.flush();
                self.newline_pending = true;
            }
            ChatEvent::AssistantCompleted { text } if !text.is_empty() => {
                // Deltas already carried the text; only the newline is owed.
                self.newline_pending = true;
            }
            ChatEvent::Error {
                kind,
                message,
                details,
            } => {
                let _ = writeln!(self.stderr, "Error [{kind}]: {message}");
                if let Some(ref detail_text) = details {
                    let _ = writeln!(self.stderr, "  Details: {detail_text}");
                }
            }
            ChatEvent::Interrupted { .. } => {
                let _ = writeln!(self.stderr, "\n^C Interrupted.");
            }
            // Lifecycle and canvas events have no text to print here;
            // exec never starts a canvas turn in the first place.
            ChatEvent::AssistantDelta { .. }
            | ChatEvent::AssistantCompleted { .. }
            | ChatEvent::CanvasDelta { .. }
            | ChatEvent::CanvasCompleted { .. }
            | ChatEvent::TurnStarted
            | ChatEvent::TurnCompleted { .. }
            | ChatEvent::UsageUpdate { .. } => {}
        }
    }

    fn finish(&mut self) {
        if self.newline_pending {
            let _ = writeln!(self.stdout);
            self.newline_pending = false;
        }
    }
}
