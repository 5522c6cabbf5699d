//! Runtime run-state models.
//!
//! This module defines the structures for reporting the state of the
//! external tool while it runs and after it finishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of the invocation controller.
///
/// The status progresses through these states during normal execution:
/// Idle -> InProgress -> Succeeded | Failed | Cancelled -> Idle
///
/// Terminal states stay visible until the front end acknowledges them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Nothing is running and no result is pending.
    #[default]
    Idle,

    /// The external tool has been launched and has not exited yet.
    InProgress,

    /// The tool exited with code 0.
    Succeeded,

    /// The tool exited with a nonzero code.
    Failed { exit_code: i32 },

    /// The run was terminated on request.
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed { .. } | Self::Cancelled
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::InProgress => f.write_str("Running..."),
            Self::Succeeded => f.write_str("Finished successfully"),
            Self::Failed { exit_code } => write!(f, "Failed with exit code {exit_code}"),
            Self::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// How a run ended.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Succeeded,
    Failed { exit_code: i32 },
    Cancelled,
}

impl From<RunOutcome> for RunStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Succeeded => Self::Succeeded,
            RunOutcome::Failed { exit_code } => Self::Failed { exit_code },
            RunOutcome::Cancelled => Self::Cancelled,
        }
    }
}

/// Which output stream of the child a log line came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// Point-in-time view of the controller's run state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunSnapshot {
    /// Id of the active run, or of the last finished one.
    pub run_id: Option<Uuid>,

    pub is_running: bool,

    pub status: RunStatus,

    /// Human-readable rendering of `status`.
    pub status_message: String,

    /// OS process id of the child while it runs.
    pub pid: Option<u32>,

    pub started_at: Option<DateTime<Utc>>,
}
