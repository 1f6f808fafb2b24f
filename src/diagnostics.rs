//! Diagnostic channel for per-node processing failures.
//!
//! Stages never raise errors across node boundaries: a stage that cannot run
//! reports the condition here and emits the empty sentinel instead. The sink
//! is a trait so tests can record events without capturing process output.

use std::sync::Mutex;
use tracing::warn;

/// A condition reported by a node during `process()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// The node's primary input is not connected
    MissingInput,
    /// An upstream payload arrived as the empty sentinel
    EmptyInput { index: usize },
    /// The upstream payload cannot be handled by this stage
    UnsupportedInput { detail: String },
}

impl std::fmt::Display for ProcessEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessEvent::MissingInput => write!(f, "no input connected"),
            ProcessEvent::EmptyInput { index } => write!(f, "input {} is empty", index),
            ProcessEvent::UnsupportedInput { detail } => {
                write!(f, "unsupported input: {}", detail)
            }
        }
    }
}

/// Receiver for node diagnostics.
pub trait DiagnosticSink {
    /// Reports a processing condition for the named node.
    fn report(&self, node: &str, event: ProcessEvent);
}

/// Default sink that forwards every event to `tracing` at warn level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, node: &str, event: ProcessEvent) {
        warn!(node, "{}", event);
    }
}

/// Sink that buffers events in memory so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, ProcessEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every recorded (node, event) pair.
    pub fn events(&self) -> Vec<(String, ProcessEvent)> {
        self.events.lock().expect("diagnostic sink poisoned").clone()
    }

    /// Returns the events reported by one node.
    pub fn events_for(&self, node: &str) -> Vec<ProcessEvent> {
        self.events
            .lock()
            .expect("diagnostic sink poisoned")
            .iter()
            .filter(|(name, _)| name == node)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().expect("diagnostic sink poisoned").clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, node: &str, event: ProcessEvent) {
        self.events
            .lock()
            .expect("diagnostic sink poisoned")
            .push((node.to_string(), event));
    }
}
