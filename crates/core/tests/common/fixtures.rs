//! Test fixtures: stand-in tools, input files and controllers.

use qs_core::invocation::tool::ToolLocator;
use qs_core::invocation::InvocationController;
use qs_protocol::config_models::Configuration;
use qs_protocol::ipc::Event;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// A scratch directory holding a stand-in tool and an input file.
pub struct Workspace {
    pub dir: TempDir,
    pub tool: PathBuf,
    pub input: PathBuf,
}

impl Workspace {
    /// Create a workspace whose tool is a shell script with `body`.
    pub fn with_tool_script(body: &str) -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let tool = dir.path().join("agent-orange");
        write_script(&tool, body)?;

        let input = dir.path().join("in.cue");
        std::fs::write(&input, "SESSION NAME:\tReel 1\n")?;

        Ok(Self { dir, tool, input })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A controller pointed at this workspace's tool.
    pub fn controller(&self) -> (InvocationController, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let locator = ToolLocator::new("agent-orange")
            .with_path(&self.tool)
            .without_env();
        (InvocationController::new(locator, tx), rx)
    }

    /// A configuration whose input is this workspace's input file.
    pub fn config(&self) -> Configuration {
        let mut config = Configuration::default();
        config.set_input_path(&self.input);
        config
    }
}

/// Write an executable `/bin/sh` script.
pub fn write_script(path: &Path, body: &str) -> std::io::Result<()> {
    std::fs::write(path, format!("#!/bin/sh\n{body}\n"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Collect events until `RunFinished` arrives or `timeout` passes.
pub async fn collect_until_finished(
    rx: &mut mpsc::UnboundedReceiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let mut events = Vec::new();
    let deadline = tokio::time::Instant::now() + timeout;

    while let Ok(Some(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        let finished = matches!(event, Event::RunFinished { .. });
        events.push(event);
        if finished {
            break;
        }
    }

    events
}
