use std::fmt;
use tokio::signal::unix::{SignalKind, signal};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Terminate,
    Interrupt,
}

impl ShutdownSignal {
    /// Conventional `128 + signo` exit status.
    pub fn exit_code(self) -> u8 {
        match self {
            ShutdownSignal::Terminate => 143,
            ShutdownSignal::Interrupt => 130,
        }
    }
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
        }
    }
}

/// Resolves on the first SIGTERM or SIGINT.
///
/// As PID 1 the process has no default SIGTERM action. If a handler cannot be installed the future never resolves for that signal.
pub async fn shutdown_signal() -> ShutdownSignal {
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = terminate => ShutdownSignal::Terminate,
        _ = interrupt => ShutdownSignal::Interrupt,
    }
}
