//! Assertion helpers over event sequences.

use qs_protocol::ipc::Event;
use qs_protocol::process_models::RunOutcome;
use std::path::PathBuf;

/// The outcome carried by the `RunFinished` event, if present.
pub fn finished_outcome(events: &[Event]) -> Option<RunOutcome> {
    events.iter().find_map(|e| match e {
        Event::RunFinished { outcome, .. } => Some(*outcome),
        _ => None,
    })
}

/// Every path the core asked the front end to open.
pub fn opened_paths(events: &[Event]) -> Vec<PathBuf> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::OpenFile { path } => Some(path.clone()),
            _ => None,
        })
        .collect()
}

/// Log lines forwarded from the tool.
pub fn log_lines(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::RunLog { line, .. } => Some(line.clone()),
            _ => None,
        })
        .collect()
}

/// Check the start/finish framing of a run's events.
///
/// `RunStarted` must come first and `RunFinished` last.
pub fn assert_event_sequence(events: &[Event]) {
    assert!(!events.is_empty(), "Event sequence is empty");

    assert!(
        matches!(events[0], Event::RunStarted { .. }),
        "First event should be RunStarted, got: {:?}",
        events[0]
    );

    let last = events.last();
    assert!(
        matches!(last, Some(Event::RunFinished { .. })),
        "Last event should be RunFinished, got: {last:?}"
    );
}
