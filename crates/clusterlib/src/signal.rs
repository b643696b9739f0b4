use std::fmt;
use tokio::signal::unix::{signal, SignalKind};

/// A termination signal which cancels an invocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
    Quit,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Terminate => write!(f, "SIGTERM"),
            Self::Quit => write!(f, "SIGQUIT"),
        }
    }
}

/// Handlers for the termination signals.
///
/// Once registered the default disposition (kill the process) is replaced, and
/// any signal delivered is buffered until `recv` is polled.  So register these
/// before creating anything which must be cleaned up.
#[derive(Debug)]
pub struct Signals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

impl Signals {
    pub fn register() -> std::io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    /// Wait for the next termination signal.
    pub async fn recv(&mut self) -> Signal {
        let signal = tokio::select! {
            _ = self.sigint.recv() => Signal::Interrupt,
            _ = self.sigterm.recv() => Signal::Terminate,
            _ = self.sigquit.recv() => Signal::Quit,
        };

        tracing::info!(%signal, "received shutdown signal, cleaning up...");
        signal
    }
}
