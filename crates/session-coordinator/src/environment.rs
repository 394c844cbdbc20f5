//! Environment signals from the embedding shell.
//!
//! The coordinator does not observe the host environment itself; the shell
//! that embeds it forwards visibility and focus transitions through an
//! [`EnvironmentHandle`].

use tokio::sync::mpsc;
use tracing::debug;

/// A visibility or focus transition reported by the embedding shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentSignal {
    /// The application surface became visible again.
    BecameVisible,
    /// The application surface was hidden or backgrounded.
    BecameHidden,
    /// The window gained input focus.
    FocusGained,
    /// The window lost input focus.
    FocusLost,
}

/// Sender half for environment signals. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EnvironmentHandle {
    tx: mpsc::Sender<EnvironmentSignal>,
}

impl EnvironmentHandle {
    /// Report a transition. Never blocks; if the queue is full the signal is
    /// dropped, which is acceptable because a later tick re-verifies anyway.
    pub fn signal(&self, signal: EnvironmentSignal) {
        if let Err(err) = self.tx.try_send(signal) {
            debug!(?signal, %err, "Dropping environment signal");
        }
    }
}

/// Create the environment signal channel.
pub fn environment_channel(
    capacity: usize,
) -> (EnvironmentHandle, mpsc::Receiver<EnvironmentSignal>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EnvironmentHandle { tx }, rx)
}

/// Decides whether a user-facing confirmation prompt is accepted.
///
/// Injected so the shell can show a real dialog while tests answer
/// deterministically.
pub trait ConfirmPolicy: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt. The default policy for headless embeddings.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmPolicy for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
