//! Warning accumulation for a single pipeline run
//!
//! Recoverable conditions (unmatched entries, malformed timestamps, unknown
//! locations) are collected here and embedded in the output document, so
//! operators can audit data quality without inspecting logs.

use tracing::warn;

/// Ordered list of warnings produced during one run.
///
/// Created once per run and threaded through the pipeline by mutable
/// reference; never shared between runs.
#[derive(Debug, Default)]
pub struct Warnings {
    entries: Vec<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it on the log at the same time.
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.entries.push(message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    /// Consume the accumulator, yielding the warnings in emission order.
    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}
