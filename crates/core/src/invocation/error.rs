//! Error types for tool invocation.

use qs_protocol::process_models::RunOutcome;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between a filled-in form and a finished run.
///
/// None of these are retried automatically; each one needs the user to act
/// (fix the form, install the tool, start again).
#[derive(Error, Debug)]
pub enum InvocationError {
    /// The external executable could not be located.
    #[error("External tool '{program}' not found: {reason}")]
    ToolNotFound { program: String, reason: String },

    /// A required field is missing or a value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A run is already in progress; the current run is unaffected.
    #[error("A run is already in progress")]
    AlreadyRunning,

    /// The OS refused to launch the tool.
    #[error("Failed to spawn {program:?}: {source}")]
    ProcessSpawnFailed {
        program: PathBuf,
        source: std::io::Error,
    },

    /// The tool ran and reported failure.
    #[error("External tool exited with code {exit_code}")]
    NonZeroExit { exit_code: i32 },

    /// Cancel was requested with nothing to cancel.
    #[error("No run is in progress")]
    NotRunning,
}

impl InvocationError {
    /// The error a finished run surfaces, if any.
    ///
    /// Cancellation is not a failure and maps to `None`.
    pub fn from_outcome(outcome: RunOutcome) -> Option<Self> {
        match outcome {
            RunOutcome::Failed { exit_code } => Some(Self::NonZeroExit { exit_code }),
            RunOutcome::Succeeded | RunOutcome::Cancelled => None,
        }
    }
}

/// Errors returned by `InvocationController::start`.
pub type StartError = InvocationError;

/// Errors returned by `InvocationController::cancel`.
pub type CancelError = InvocationError;

/// Type alias for Result with InvocationError.
pub type InvocationResult<T> = Result<T, InvocationError>;
