//! Process-wide Ctrl+C handling.
//!
//! The first Ctrl+C only raises a flag so a running turn can stop at
//! its next checkpoint. A second Ctrl+C exits the process outright,
//! after running the registered restore hook.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static NOTIFY: OnceLock<Notify> = OnceLock::new();
static RESTORE_HOOK: OnceLock<Box<dyn Fn() + Send + Sync>> = OnceLock::new();

/// Marker error for a turn cut short by Ctrl+C. The binary maps it to
/// exit code 130 instead of printing an error chain.
#[derive(Debug)]
pub struct InterruptedError;

impl std::fmt::Display for InterruptedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupted")
    }
}

impl std::error::Error for InterruptedError {}

fn notify() -> &'static Notify {
    NOTIFY.get_or_init(Notify::new)
}

/// Installs the Ctrl+C handler. Call once at startup.
///
/// The handler never prints; whoever owns the screen decides how an
/// interrupt is shown.
///
/// # Panics
/// Panics if the handler cannot be registered.
pub fn init() {
    ctrlc::set_handler(trigger_ctrl_c).expect("register Ctrl+C handler");
}

/// Raises the interrupt flag, or exits if it was already raised.
pub fn trigger_ctrl_c() {
    let already = INTERRUPTED.swap(true, Ordering::SeqCst);
    if !already {
        notify().notify_waiters();
        return;
    }

    // process::exit skips Drop, so unwind the terminal by hand first.
    if let Some(hook) = RESTORE_HOOK.get() {
        hook();
    }
    std::process::exit(130);
}

/// Returns true once Ctrl+C has been pressed during the current turn.
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Resolves when the interrupt flag is raised.
pub async fn wait_for_interrupt() {
    while !is_interrupted() {
        notify().notified().await;
    }
}

/// Clears the flag so the next turn starts fresh.
pub fn reset() {
    INTERRUPTED.store(false, Ordering::SeqCst);
}

/// Registers the hook run before the second-Ctrl+C exit. The TUI uses
/// this to leave raw mode so the shell prompt comes back usable.
pub fn set_restore_hook<F>(hook: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let _ = RESTORE_HOOK.set(Box::new(hook));
}
