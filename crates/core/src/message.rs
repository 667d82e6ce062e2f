//! Ingest messages posted to the host's notification inbox

use crate::types::ArtifactId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Message category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Informational (summaries)
    Info,
    /// Something degraded but the job continues
    Warning,
    /// Something failed
    Error,
    /// A result the user should look at (keyword hits)
    Data,
}

/// Severity of a pop-up alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    /// Warning alert
    Warning,
    /// Error alert
    Error,
}

/// A message for the ingest inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestMessage {
    /// Unique, increasing per generator
    pub id: u64,
    /// Category
    pub kind: MessageKind,
    /// Name of the module posting the message
    pub module: String,
    /// One-line subject
    pub subject: String,
    /// Longer details, plain text
    pub details: String,
    /// Messages with the same key may be grouped by the inbox
    pub unique_key: Option<String>,
    /// Artifact the message refers to
    pub artifact: Option<ArtifactId>,
    /// Posting time
    pub posted_at: DateTime<Utc>,
}

impl IngestMessage {
    /// Create a message without key or artifact
    pub fn new(
        id: u64,
        kind: MessageKind,
        module: impl Into<String>,
        subject: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            module: module.into(),
            subject: subject.into(),
            details: details.into(),
            unique_key: None,
            artifact: None,
            posted_at: Utc::now(),
        }
    }

    /// Attach a grouping key
    pub fn with_unique_key(mut self, key: impl Into<String>) -> Self {
        self.unique_key = Some(key.into());
        self
    }

    /// Attach an artifact reference
    pub fn with_artifact(mut self, artifact: ArtifactId) -> Self {
        self.artifact = Some(artifact);
        self
    }
}

/// Thread-safe message id source
///
/// Messages are posted from the ingest thread and from search runs
/// concurrently, so ids come from an atomic counter.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    last: AtomicU64,
}

impl MessageIdGenerator {
    /// Create a generator whose first id is 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id
    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }
}
