use crate::service::signals::ShutdownSignal;
use crate::types::outcome::Stage;
use std::io::ErrorKind;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error as ThisError;

/// Exit code for configuration problems detected before any stage ran.
pub const EXIT_CONFIG: u8 = 1;
/// Exit code when the data store (or another dependency) never became reachable.
pub const EXIT_UNREACHABLE: u8 = 3;
/// Exit code when schema migration failed.
pub const EXIT_MIGRATION: u8 = 4;
/// Exit code when seeding failed under a strict seed profile.
pub const EXIT_SEED: u8 = 5;
/// Exit code when the hand-off command exists but could not be executed.
pub const EXIT_NOT_EXECUTABLE: u8 = 126;
/// Exit code when the hand-off command could not be found.
pub const EXIT_NOT_FOUND: u8 = 127;

#[derive(Debug, ThisError)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: {0}")]
    Figment(Box<figment::Error>),

    #[error("{what} not reachable after {waited:?}")]
    Unreachable { what: String, waited: Duration },

    #[error("Probe attempt timed out after {0:?}")]
    ProbeTimeout(Duration),

    #[error("Migration failed: {0}")]
    Migration(Box<BootstrapError>),

    #[error("Seeding failed: {0}")]
    Seed(Box<BootstrapError>),

    #[error("`{command}` failed with {status}")]
    Command { command: String, status: ExitStatus },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to exec `{command}`: {source}")]
    Exec {
        command: String,
        source: std::io::Error,
    },

    #[error("Interrupted by {signal} during {stage}")]
    Interrupted {
        signal: ShutdownSignal,
        stage: Stage,
    },
}

impl From<figment::Error> for BootstrapError {
    fn from(e: figment::Error) -> Self {
        BootstrapError::Figment(Box::new(e))
    }
}

impl BootstrapError {
    /// Process exit code reported when this error ends the bootstrap.
    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::Unreachable { .. } => EXIT_UNREACHABLE,
            BootstrapError::Migration(_) => EXIT_MIGRATION,
            BootstrapError::Seed(_) => EXIT_SEED,
            BootstrapError::Exec { source, .. } => match source.kind() {
                ErrorKind::NotFound => EXIT_NOT_FOUND,
                _ => EXIT_NOT_EXECUTABLE,
            },
            BootstrapError::Interrupted { signal, .. } => signal.exit_code(),
            BootstrapError::Config(_)
            | BootstrapError::Figment(_)
            | BootstrapError::ProbeTimeout(_)
            | BootstrapError::Command { .. }
            | BootstrapError::Database(_)
            | BootstrapError::Io(_) => EXIT_CONFIG,
        }
    }
}
