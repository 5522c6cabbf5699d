//! Invocation controller.
//!
//! The controller is the single owner of the run state. It validates a
//! configuration, launches the external tool, and hands the child to a
//! watcher task. The watcher drains the tool's output and then reports the
//! exit; that report is the only way a run is completed.

use crate::invocation::arguments::build_arguments;
use crate::invocation::error::{
    CancelError, InvocationError, InvocationResult, StartError,
};
use crate::invocation::executor::ProcessExecutor;
use crate::invocation::tool::ToolLocator;
use crate::state::run::{self, ActiveProcess, RunState};
use qs_protocol::config_models::Configuration;
use qs_protocol::ipc::Event;
use qs_protocol::process_models::{RunOutcome, RunSnapshot};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Exit code reported when the OS gives none (the child died from a signal).
pub const SIGNALLED_EXIT_CODE: i32 = -1;

/// How long to keep reading output after the tool exits. Bounds the wait
/// when a grandchild still holds the pipes open.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Identifies a launched run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunHandle {
    pub run_id: Uuid,
    pub pid: Option<u32>,
}

/// Drives one external tool run at a time.
///
/// Cloning is cheap; clones share the same run state and event channel.
#[derive(Clone)]
pub struct InvocationController {
    locator: ToolLocator,

    /// The one run state. Checking `is_running` under this lock is the
    /// gate that keeps runs from overlapping.
    state: Arc<Mutex<RunState>>,

    /// Channel for sending events to the front end.
    events_tx: mpsc::UnboundedSender<Event>,
}

impl InvocationController {
    /// Create a controller.
    ///
    /// # Arguments
    ///
    /// * `locator` - How to find the external tool
    /// * `events_tx` - Channel for status, log and completion events
    pub fn new(locator: ToolLocator, events_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            locator,
            state: Arc::new(Mutex::new(RunState::default())),
            events_tx,
        }
    }

    /// Path of the external executable. See [`ToolLocator::resolve`].
    pub fn resolve_tool_path(&self) -> InvocationResult<PathBuf> {
        self.locator.resolve()
    }

    /// Argument list for `config`. See [`build_arguments`].
    pub fn build_arguments(&self, config: &Configuration) -> InvocationResult<Vec<OsString>> {
        build_arguments(config)
    }

    /// The full command line (tool path first) a run would use, for display.
    ///
    /// Does not check that the input file exists. Arguments that are not
    /// valid UTF-8 are shown lossily; the tool itself receives them intact.
    pub fn preview(&self, config: &Configuration) -> InvocationResult<Vec<String>> {
        let tool = self.resolve_tool_path()?;
        let args = build_arguments(config)?;
        Ok(display_command(&tool, &args))
    }

    /// Launch the external tool for `config`.
    ///
    /// Returns as soon as the child is spawned; the outcome arrives later as
    /// an `Event::RunFinished`.
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if a run is active (the active run is untouched)
    /// - `InvalidConfiguration` if the input file is missing, unreadable or
    ///   a parameter is out of range
    /// - `ToolNotFound` if the executable cannot be located
    /// - `ProcessSpawnFailed` if the OS refuses to launch it
    ///
    /// No process is spawned and the state is unchanged on any error.
    pub async fn start(&self, config: &Configuration) -> Result<RunHandle, StartError> {
        let mut state = self.state.lock().await;

        if state.is_running() {
            tracing::warn!("Start rejected: a run is already in progress");
            return Err(InvocationError::AlreadyRunning);
        }

        check_input_file(config)?;
        let tool = self.resolve_tool_path()?;
        let args = build_arguments(config)?;
        tracing::debug!(tool = %tool.display(), ?args, "Launching external tool");

        let mut child = ProcessExecutor::spawn(&tool, &args)?;
        let run_id = Uuid::new_v4();
        let pid = child.id();

        let open_target = config
            .open_when_finished
            .then(|| config.output().map(|p| p.to_path_buf()))
            .flatten();

        let (cancel_tx, cancel_rx) = oneshot::channel();

        run::begin_run(
            &mut state,
            ActiveProcess::new(run_id, pid, open_target, cancel_tx),
            display_command(&tool, &args),
            &self.events_tx,
        );
        drop(state);

        let forwarder =
            ProcessExecutor::forward_output(&mut child, run_id, self.events_tx.clone());
        tracing::info!(%run_id, ?pid, "Run started");
        tokio::spawn(self.clone().watch(run_id, child, cancel_rx, forwarder));

        Ok(RunHandle { run_id, pid })
    }

    /// Wait for the child to exit, killing it first if cancellation is
    /// requested, then report the exit once its output has been forwarded.
    async fn watch(
        self,
        run_id: Uuid,
        mut child: Child,
        cancel_rx: oneshot::Receiver<()>,
        forwarder: Option<JoinHandle<()>>,
    ) {
        let status = tokio::select! {
            status = child.wait() => status,
            Ok(()) = cancel_rx => {
                tracing::info!(%run_id, "Terminating external tool");
                if let Err(e) = child.start_kill() {
                    tracing::warn!(%run_id, "Failed to signal external tool: {e}");
                }
                child.wait().await
            }
        };

        let exit_code = match status {
            Ok(status) => status.code().unwrap_or(SIGNALLED_EXIT_CODE),
            Err(e) => {
                tracing::warn!(%run_id, "Failed to wait for external tool: {e}");
                SIGNALLED_EXIT_CODE
            }
        };

        if let Some(mut forwarder) = forwarder {
            if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut forwarder)
                .await
                .is_err()
            {
                tracing::debug!(%run_id, "Output still open after exit, dropping the rest");
                forwarder.abort();
            }
        }

        self.on_process_exit(run_id, exit_code).await;
    }

    /// Completion notification for run `run_id`.
    ///
    /// Only the watcher of that run calls this. An id that is not the
    /// active run changes nothing and returns `None`.
    pub(crate) async fn on_process_exit(
        &self,
        run_id: Uuid,
        exit_code: i32,
    ) -> Option<RunOutcome> {
        let mut state = self.state.lock().await;
        let outcome = run::finish_run(&mut state, run_id, exit_code, &self.events_tx)?;

        match outcome {
            RunOutcome::Failed { exit_code } => {
                tracing::warn!(%run_id, exit_code, "External tool failed")
            }
            _ => tracing::info!(%run_id, ?outcome, "Run finished"),
        }
        Some(outcome)
    }

    /// Request termination of the active run.
    ///
    /// Returns once the request is delivered. The move to `Cancelled`
    /// happens when the process exit is observed.
    ///
    /// # Errors
    ///
    /// `NotRunning` if nothing is running.
    pub async fn cancel(&self) -> Result<(), CancelError> {
        let mut state = self.state.lock().await;
        let run_id = run::request_cancel(&mut state)?;
        tracing::info!(%run_id, "Cancellation requested");
        Ok(())
    }

    /// Clear a terminal status back to idle.
    pub async fn acknowledge(&self) -> bool {
        let mut state = self.state.lock().await;
        run::acknowledge(&mut state, &self.events_tx)
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_running()
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        self.state.lock().await.snapshot()
    }
}

/// Tool path and arguments as display strings.
fn display_command(tool: &Path, args: &[OsString]) -> Vec<String> {
    std::iter::once(tool.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// The input path must be set and name a readable regular file.
fn check_input_file(config: &Configuration) -> InvocationResult<()> {
    let input = config.input().ok_or_else(|| {
        InvocationError::InvalidConfiguration("an input file must be selected".to_string())
    })?;

    if !input.is_file() {
        return Err(InvocationError::InvalidConfiguration(format!(
            "input file {} does not exist",
            input.display()
        )));
    }

    std::fs::File::open(input).map_err(|e| {
        InvocationError::InvalidConfiguration(format!(
            "input file {} is not readable: {e}",
            input.display()
        ))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (InvocationController, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let locator = ToolLocator::new("qsrunner-missing-tool-xyz123").without_env();
        (InvocationController::new(locator, tx), rx)
    }

    #[tokio::test]
    async fn test_start_with_empty_input() {
        let (controller, mut rx) = controller();
        let mut config = Configuration::default();
        config.set_input_path("");

        let result = controller.start(&config).await;

        assert!(matches!(
            result,
            Err(InvocationError::InvalidConfiguration(_))
        ));
        assert!(!controller.is_running().await);
        assert!(rx.try_recv().is_err(), "No events on rejected start");
    }

    #[tokio::test]
    async fn test_start_with_missing_input_file() {
        let (controller, _rx) = controller();
        let mut config = Configuration::default();
        config.set_input_path("/nonexistent/qsrunner/in.cue");

        let result = controller.start(&config).await;

        if let Err(InvocationError::InvalidConfiguration(msg)) = result {
            assert!(msg.contains("does not exist"));
        } else {
            panic!("Expected InvalidConfiguration");
        }
    }

    #[tokio::test]
    async fn test_start_without_tool() {
        let (controller, _rx) = controller();
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.cue");
        std::fs::write(&input, "SESSION NAME:\ttest\n").unwrap();

        let mut config = Configuration::default();
        config.set_input_path(&input);

        let result = controller.start(&config).await;

        assert!(matches!(result, Err(InvocationError::ToolNotFound { .. })));
        assert!(!controller.is_running().await);
    }

    #[tokio::test]
    async fn test_cancel_when_idle() {
        let (controller, _rx) = controller();
        assert!(matches!(
            controller.cancel().await,
            Err(InvocationError::NotRunning)
        ));
    }

    #[tokio::test]
    async fn test_on_process_exit_without_run() {
        let (controller, mut rx) = controller();
        assert_eq!(controller.on_process_exit(Uuid::new_v4(), 0).await, None);
        assert!(rx.try_recv().is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_foreign_exit_does_not_end_active_run() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("agent-orange");
        std::fs::write(&tool, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        let input = dir.path().join("in.cue");
        std::fs::write(&input, "SESSION NAME:\ttest\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let locator = ToolLocator::new("agent-orange").with_path(&tool).without_env();
        let controller = InvocationController::new(locator, tx);
        let mut config = Configuration::default();
        config.set_input_path(&input);

        let handle = controller.start(&config).await.expect("Should start");

        assert_eq!(controller.on_process_exit(Uuid::new_v4(), 0).await, None);
        assert!(controller.is_running().await);
        assert_eq!(controller.snapshot().await.run_id, Some(handle.run_id));
        assert!(matches!(
            controller.start(&config).await,
            Err(InvocationError::AlreadyRunning)
        ));

        controller.cancel().await.expect("Should cancel");
        let finished = tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(event) = rx.recv().await {
                if let Event::RunFinished { run_id, outcome } = event {
                    return Some((run_id, outcome));
                }
            }
            None
        })
        .await
        .expect("Run should finish");
        assert_eq!(finished, Some((handle.run_id, RunOutcome::Cancelled)));
    }

    #[tokio::test]
    async fn test_preview_needs_tool() {
        let (controller, _rx) = controller();
        let mut config = Configuration::default();
        config.set_input_path("/tmp/in.cue");

        assert!(matches!(
            controller.preview(&config),
            Err(InvocationError::ToolNotFound { .. })
        ));
        assert!(controller.build_arguments(&config).is_ok());
    }
}
