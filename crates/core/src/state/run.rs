//! Run state machine implementation.
//!
//! This module holds the single `RunState` owned by the controller and the
//! functions that move it between states, emitting an event for every
//! transition:
//!
//! `Idle -> InProgress -> {Succeeded, Failed, Cancelled} -> Idle`

use crate::invocation::error::{InvocationError, InvocationResult};
use chrono::{DateTime, Utc};
use qs_protocol::ipc::Event;
use qs_protocol::process_models::{RunOutcome, RunSnapshot, RunStatus};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use uuid::Uuid;

/// The subprocess of the active run.
#[derive(Debug)]
pub struct ActiveProcess {
    pub run_id: Uuid,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,

    /// Output file to open after a successful exit, captured at launch.
    pub open_target: Option<PathBuf>,

    cancel_tx: Option<oneshot::Sender<()>>,
    cancel_requested: bool,
}

impl ActiveProcess {
    pub fn new(
        run_id: Uuid,
        pid: Option<u32>,
        open_target: Option<PathBuf>,
        cancel_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            run_id,
            pid,
            started_at: Utc::now(),
            open_target,
            cancel_tx: Some(cancel_tx),
            cancel_requested: false,
        }
    }
}

/// Run state of the controller. Exactly one instance exists per controller.
///
/// `is_running()` holds exactly when a process handle is present.
#[derive(Debug, Default)]
pub struct RunState {
    status: RunStatus,
    process: Option<ActiveProcess>,
    last_run_id: Option<Uuid>,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn status_message(&self) -> String {
        self.status.to_string()
    }

    /// Id of the active run, if any.
    pub fn active_run_id(&self) -> Option<Uuid> {
        self.process.as_ref().map(|p| p.run_id)
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            run_id: self.active_run_id().or(self.last_run_id),
            is_running: self.is_running(),
            status: self.status,
            status_message: self.status_message(),
            pid: self.process.as_ref().and_then(|p| p.pid),
            started_at: self.process.as_ref().map(|p| p.started_at),
        }
    }
}

fn emit_status(state: &RunState, events_tx: &UnboundedSender<Event>) {
    let _ = events_tx.send(Event::StatusChanged {
        status: state.status,
        message: state.status_message(),
    });
}

/// Record a freshly spawned process and move to `InProgress`.
///
/// # Arguments
///
/// * `state` - The controller's run state; must be idle or terminal
/// * `process` - Handle of the spawned child
/// * `command` - Tool path followed by its arguments, for the start event
/// * `events_tx` - Channel to send `RunStarted` and `StatusChanged`
pub fn begin_run(
    state: &mut RunState,
    process: ActiveProcess,
    command: Vec<String>,
    events_tx: &UnboundedSender<Event>,
) {
    debug_assert!(!state.is_running(), "begin_run while a run is active");

    let _ = events_tx.send(Event::RunStarted {
        run_id: process.run_id,
        pid: process.pid,
        command,
        started_at: process.started_at,
    });

    state.last_run_id = Some(process.run_id);
    state.process = Some(process);
    state.status = RunStatus::InProgress;
    emit_status(state, events_tx);
}

/// Mark the active run as cancelled-on-exit and signal its watcher.
///
/// The state stays `InProgress` until the process exit is observed.
///
/// # Errors
///
/// `InvocationError::NotRunning` when no run is active.
pub fn request_cancel(state: &mut RunState) -> InvocationResult<Uuid> {
    let process = state.process.as_mut().ok_or(InvocationError::NotRunning)?;

    process.cancel_requested = true;
    if let Some(cancel_tx) = process.cancel_tx.take() {
        let _ = cancel_tx.send(());
    }
    Ok(process.run_id)
}

/// Apply the exit of run `run_id` and move to a terminal state.
///
/// - A run whose cancellation was requested ends `Cancelled`, whatever the
///   exit code.
/// - Exit code 0 ends `Succeeded` and emits `OpenFile` when an open target
///   was captured at launch.
/// - Any other code ends `Failed`.
///
/// Returns `None` (and changes nothing) when `run_id` is not the active run.
pub fn finish_run(
    state: &mut RunState,
    run_id: Uuid,
    exit_code: i32,
    events_tx: &UnboundedSender<Event>,
) -> Option<RunOutcome> {
    if state.active_run_id() != Some(run_id) {
        return None;
    }
    let process = state.process.take()?;

    let outcome = if process.cancel_requested {
        RunOutcome::Cancelled
    } else if exit_code == 0 {
        RunOutcome::Succeeded
    } else {
        RunOutcome::Failed { exit_code }
    };

    state.status = outcome.into();
    emit_status(state, events_tx);

    if outcome == RunOutcome::Succeeded {
        if let Some(path) = process.open_target {
            let _ = events_tx.send(Event::OpenFile { path });
        }
    }

    let _ = events_tx.send(Event::RunFinished { run_id, outcome });
    Some(outcome)
}

/// Return a terminal state to `Idle`.
///
/// Returns `false` if a run is active or the state is already idle.
pub fn acknowledge(state: &mut RunState, events_tx: &UnboundedSender<Event>) -> bool {
    if !state.status.is_terminal() || state.is_running() {
        return false;
    }
    state.status = RunStatus::Idle;
    emit_status(state, events_tx);
    true
}
