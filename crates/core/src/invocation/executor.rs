//! Subprocess executor for the external tool.
//!
//! Spawns the tool with piped output and forwards every non-empty output
//! line as an `Event::RunLog`. The lines are informational; nothing here
//! parses them.

use crate::invocation::error::{InvocationError, InvocationResult};
use qs_protocol::ipc::Event;
use qs_protocol::process_models::LogStream;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::{Child, Command};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Launches the external tool and relays its output.
pub struct ProcessExecutor;

impl ProcessExecutor {
    /// Spawn `program` with `args` in the current working directory.
    ///
    /// Stdin is closed; stdout and stderr are piped so they can be passed to
    /// [`ProcessExecutor::forward_output`]. The child is killed if its handle
    /// is dropped.
    ///
    /// # Errors
    ///
    /// `InvocationError::ProcessSpawnFailed` when the OS cannot launch it.
    pub fn spawn<I, S>(program: &Path, args: I) -> InvocationResult<Child>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        cmd.spawn()
            .map_err(|source| InvocationError::ProcessSpawnFailed {
                program: program.to_path_buf(),
                source,
            })
    }

    /// Take the child's output pipes and forward their lines as events.
    ///
    /// Returns `None` if the pipes were already taken.
    pub fn forward_output(
        child: &mut Child,
        run_id: Uuid,
        events_tx: UnboundedSender<Event>,
    ) -> Option<JoinHandle<()>> {
        let stdout = child.stdout.take()?;
        let stderr = child.stderr.take()?;

        let stdout = LinesStream::new(BufReader::new(stdout).lines())
            .map(|line| (LogStream::Stdout, line));
        let stderr = LinesStream::new(BufReader::new(stderr).lines())
            .map(|line| (LogStream::Stderr, line));
        let mut lines = stdout.merge(stderr);

        Some(tokio::spawn(async move {
            while let Some((stream, line)) = lines.next().await {
                match line {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => {
                        let _ = events_tx.send(Event::RunLog {
                            run_id,
                            stream,
                            line,
                        });
                    }
                    Err(e) => {
                        tracing::debug!(%run_id, ?stream, "Stopped reading tool output: {e}");
                    }
                }
            }
        }))
    }
}
