//! JSON-lines bridge for front ends.
//!
//! Each stdin line is one `Op`; every `Event` goes to stdout as one line.
//! Replies and run events share a single writer task, so lines never
//! interleave.

use anyhow::{Context, Result};
use qs_core::invocation::tool::ToolLocator;
use qs_core::invocation::InvocationController;
use qs_protocol::config_models::Configuration;
use qs_protocol::ipc::{Event, Op};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// How long shutdown waits for a cancelled run to report its exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Whether the bridge keeps reading after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub async fn serve(locator: ToolLocator, defaults: Configuration) -> Result<()> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(events_rx));

    let controller = InvocationController::new(locator, events_tx.clone());
    let mut config = defaults;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let op = match serde_json::from_str::<Op>(&line) {
            Ok(op) => op,
            Err(e) => {
                reject(&events_tx, format!("malformed operation: {e}"));
                continue;
            }
        };

        if handle_op(&controller, &mut config, op, &events_tx).await == Flow::Stop {
            break;
        }
    }

    shutdown(&controller).await;
    drop(controller);
    drop(events_tx);

    match tokio::time::timeout(SHUTDOWN_GRACE, writer).await {
        Ok(joined) => joined.context("Event writer panicked")?,
        Err(_) => {
            tracing::warn!("Timed out flushing events");
            Ok(())
        }
    }
}

/// Apply one operation, replying on `events_tx` where the op asks for it.
pub async fn handle_op(
    controller: &InvocationController,
    config: &mut Configuration,
    op: Op,
    events_tx: &UnboundedSender<Event>,
) -> Flow {
    match op {
        Op::SetConfiguration { configuration } => {
            if controller.is_running().await {
                reject(events_tx, "cannot change the configuration while a run is in progress");
            } else {
                *config = configuration;
            }
        }
        Op::PreviewArguments => match controller.preview(config) {
            Ok(command) => {
                let _ = events_tx.send(Event::ArgumentsPreview { command });
            }
            Err(e) => reject(events_tx, e.to_string()),
        },
        Op::Start => {
            if let Err(e) = controller.start(config).await {
                reject(events_tx, e.to_string());
            }
        }
        Op::Cancel => {
            if let Err(e) = controller.cancel().await {
                reject(events_tx, e.to_string());
            }
        }
        Op::Acknowledge => {
            if !controller.acknowledge().await {
                reject(events_tx, "nothing to acknowledge");
            }
        }
        Op::GetState => {
            let snapshot = controller.snapshot().await;
            let _ = events_tx.send(Event::StateSnapshot { snapshot });
        }
        Op::Shutdown => return Flow::Stop,
    }
    Flow::Continue
}

fn reject(events_tx: &UnboundedSender<Event>, error: impl Into<String>) {
    let error = error.into();
    tracing::warn!("Rejected operation: {error}");
    let _ = events_tx.send(Event::CommandRejected { error });
}

/// Cancel an active run and give it a moment to exit.
async fn shutdown(controller: &InvocationController) {
    if controller.cancel().await.is_err() {
        return;
    }

    let waited = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while controller.is_running().await {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    if waited.is_err() {
        tracing::warn!("External tool still running at shutdown");
    }
}

async fn write_events(mut events_rx: UnboundedReceiver<Event>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(event) = events_rx.recv().await {
        let mut line = serde_json::to_string(&event).context("Failed to encode event")?;
        line.push('\n');
        stdout
            .write_all(line.as_bytes())
            .await
            .context("Failed to write event")?;
        stdout.flush().await.context("Failed to flush stdout")?;
    }
    Ok(())
}
