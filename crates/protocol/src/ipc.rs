//! Inter-process communication protocol.
//!
//! This module defines the message types exchanged between a front end
//! (a GUI form, the `qsrunner serve` bridge, the bundled CLI) and the
//! invocation core.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the front end to the core
//! - `Event`: Status updates and replies sent from the core to the front end
//!
//! Events are fire-and-forget; the core never waits for a front end to
//! consume them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::config_models::Configuration;
use crate::process_models::{LogStream, RunOutcome, RunSnapshot, RunStatus};

/// Operations sent from the front end to the core.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "type": "setConfiguration",
///   "payload": {
///     "configuration": { "input_path": "/tmp/in.cue", "tool_kind": "pdf" }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Replace the form configuration used by the next run.
    ///
    /// Rejected while a run is in progress.
    SetConfiguration { configuration: Configuration },

    /// Ask for the command line the current configuration would produce.
    PreviewArguments,

    /// Launch the external tool with the current configuration.
    Start,

    /// Request termination of the running tool.
    Cancel,

    /// Clear a terminal status back to idle.
    Acknowledge,

    /// Request a snapshot of the run state.
    GetState,

    /// Shut down the bridge, cancelling any active run.
    Shutdown,
}

/// Events sent from the core to the front end.
///
/// ```json
/// {
///   "type": "runFinished",
///   "payload": {
///     "run_id": "uuid-here",
///     "outcome": { "outcome": "FAILED", "exit_code": 2 }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// The external tool was launched.
    RunStarted {
        run_id: Uuid,
        pid: Option<u32>,
        /// Tool path followed by its arguments, converted lossily for display.
        command: Vec<String>,
        started_at: DateTime<Utc>,
    },

    /// The status message changed.
    StatusChanged { status: RunStatus, message: String },

    /// A line of output from the tool. Informational only.
    RunLog {
        run_id: Uuid,
        stream: LogStream,
        line: String,
    },

    /// The front end should open this file.
    ///
    /// Sent at most once per run, only after a successful exit with
    /// `open_when_finished` set and an output path present.
    OpenFile { path: PathBuf },

    /// The run reached a terminal state.
    RunFinished { run_id: Uuid, outcome: RunOutcome },

    /// Reply to `Op::PreviewArguments`.
    ArgumentsPreview { command: Vec<String> },

    /// Reply to `Op::GetState`.
    StateSnapshot { snapshot: RunSnapshot },

    /// An operation could not be carried out.
    CommandRejected { error: String },
}
