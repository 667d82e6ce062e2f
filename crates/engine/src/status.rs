//! Per-file indexing outcome ledger
//!
//! Written by the indexer on the ingest thread, read when the end-of-job
//! summary is built. Each file id gets exactly one status; a second record
//! for the same id is refused and logged.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use keyhunt_core::{FileId, IndexSummary, IngestStatus};

/// File id -> ingest status
#[derive(Debug, Default)]
pub struct IngestStatusTable {
    statuses: DashMap<FileId, IngestStatus>,
}

impl IngestStatusTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status of a file.
    ///
    /// Returns false, leaving the first status in place, if the file
    /// already has one.
    pub fn record(&self, file_id: FileId, status: IngestStatus) -> bool {
        match self.statuses.entry(file_id) {
            Entry::Vacant(slot) => {
                slot.insert(status);
                true
            }
            Entry::Occupied(existing) => {
                tracing::warn!(
                    target: "keyhunt::index",
                    file_id = %file_id,
                    existing = %existing.get(),
                    rejected = %status,
                    "File already has an ingest status"
                );
                false
            }
        }
    }

    /// Status of a file, if it was processed
    pub fn get(&self, file_id: FileId) -> Option<IngestStatus> {
        self.statuses.get(&file_id).map(|s| *s)
    }

    /// Number of files with a status
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// True if no file has been processed
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Per-status counts
    pub fn summary(&self) -> IndexSummary {
        let mut summary = IndexSummary::default();
        for entry in self.statuses.iter() {
            summary.record(*entry.value());
        }
        summary
    }

    /// Drop every entry (job teardown)
    pub fn clear(&self) {
        self.statuses.clear();
    }
}
