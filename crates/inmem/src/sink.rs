//! Notification sinks
//!
//! - `RecordingSink` keeps everything for later inspection
//! - `LogSink` forwards to `tracing`
//! - `JsonLinesSink` writes one JSON object per message

use keyhunt_core::{AlertLevel, ArtifactId, IndexSummary, IngestMessage, MessageKind, NotificationSink};
use parking_lot::Mutex;
use std::io::Write;
use tracing::{error, info, warn};

// ============================================================================
// RecordingSink
// ============================================================================

#[derive(Debug, Default)]
struct Recorded {
    messages: Vec<IngestMessage>,
    summaries: Vec<IndexSummary>,
    alerts: Vec<(AlertLevel, String, String)>,
    index_changes: Vec<u64>,
    artifact_batches: Vec<Vec<ArtifactId>>,
}

/// Sink that records every call
#[derive(Debug, Default)]
pub struct RecordingSink {
    recorded: Mutex<Recorded>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Posted messages in posting order
    pub fn messages(&self) -> Vec<IngestMessage> {
        self.recorded.lock().messages.clone()
    }

    /// Posted messages of one kind
    pub fn messages_of(&self, kind: MessageKind) -> Vec<IngestMessage> {
        self.recorded
            .lock()
            .messages
            .iter()
            .filter(|m| m.kind == kind)
            .cloned()
            .collect()
    }

    /// Summaries received
    pub fn summaries(&self) -> Vec<IndexSummary> {
        self.recorded.lock().summaries.clone()
    }

    /// Alerts received
    pub fn alerts(&self) -> Vec<(AlertLevel, String, String)> {
        self.recorded.lock().alerts.clone()
    }

    /// Indexed file counts announced after commits
    pub fn index_changes(&self) -> Vec<u64> {
        self.recorded.lock().index_changes.clone()
    }

    /// Size of every artifact batch announced
    pub fn artifact_batches(&self) -> Vec<usize> {
        self.recorded
            .lock()
            .artifact_batches
            .iter()
            .map(Vec::len)
            .collect()
    }
}

impl NotificationSink for RecordingSink {
    fn post(&self, message: IngestMessage) {
        self.recorded.lock().messages.push(message);
    }

    fn on_summary(&self, summary: &IndexSummary) {
        self.recorded.lock().summaries.push(*summary);
    }

    fn on_alert(&self, level: AlertLevel, title: &str, body: &str) {
        self.recorded
            .lock()
            .alerts
            .push((level, title.to_string(), body.to_string()));
    }

    fn on_index_changed(&self, indexed_files: u64) {
        self.recorded.lock().index_changes.push(indexed_files);
    }

    fn on_artifacts(&self, artifacts: &[ArtifactId]) {
        self.recorded.lock().artifact_batches.push(artifacts.to_vec());
    }
}

// ============================================================================
// LogSink
// ============================================================================

/// Sink that logs messages and alerts
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn post(&self, message: IngestMessage) {
        match message.kind {
            MessageKind::Error => error!(
                target: "keyhunt::ingest",
                id = message.id,
                module = %message.module,
                "{}", message.subject
            ),
            MessageKind::Warning => warn!(
                target: "keyhunt::ingest",
                id = message.id,
                module = %message.module,
                "{}", message.subject
            ),
            MessageKind::Info | MessageKind::Data => info!(
                target: "keyhunt::ingest",
                id = message.id,
                module = %message.module,
                key = message.unique_key.as_deref().unwrap_or(""),
                "{}", message.subject
            ),
        }
    }

    fn on_alert(&self, level: AlertLevel, title: &str, body: &str) {
        match level {
            AlertLevel::Error => error!(target: "keyhunt::ingest", title, "{}", body),
            AlertLevel::Warning => warn!(target: "keyhunt::ingest", title, "{}", body),
        }
    }
}

// ============================================================================
// JsonLinesSink
// ============================================================================

/// Sink writing each posted message as a JSON line
pub struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_line(&self, value: &impl serde::Serialize) {
        let mut out = self.out.lock();
        let written = serde_json::to_writer(&mut *out, value)
            .map_err(std::io::Error::from)
            .and_then(|_| out.write_all(b"\n"));
        if let Err(e) = written {
            warn!(target: "keyhunt::ingest", error = %e, "Could not write message");
        }
    }
}

impl<W: Write + Send> NotificationSink for JsonLinesSink<W> {
    fn post(&self, message: IngestMessage) {
        self.write_line(&message);
    }

    fn on_summary(&self, summary: &IndexSummary) {
        self.write_line(summary);
    }
}
