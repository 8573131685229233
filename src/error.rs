// Error types for stackwatch

use thiserror::Error;

/// Result type alias using anyhow::Error
pub type Result<T> = anyhow::Result<T>;

/// Stackwatch-specific error types.
///
/// Backend poll failures never show up here: a failed poll degrades into
/// a SubsystemReport with its `error` field set, and mutation failures
/// are typed MutateOutcome values. These variants cover the monitor's
/// own faults only.
#[derive(Error, Debug)]
pub enum StackwatchError {
    #[error("Unknown subsystem '{0}'")]
    UnknownSubsystem(String),

    #[error("Failed to query process supervisor: {0}")]
    Supervisor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
