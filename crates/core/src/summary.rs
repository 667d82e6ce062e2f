//! End-of-job indexing summary

use crate::message::AlertLevel;
use crate::types::IngestStatus;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Per-status file counts for one job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Files indexed with a format-specific extractor
    pub text_indexed: usize,
    /// Files indexed with heuristic strings
    pub strings_indexed: usize,
    /// Files indexed by metadata only
    pub metadata_indexed: usize,
    /// Files skipped on index write errors
    pub index_errors: usize,
    /// Files skipped on extraction errors
    pub extract_errors: usize,
    /// Files skipped on I/O errors
    pub io_errors: usize,
}

impl IndexSummary {
    /// Count one file with the given status
    pub fn record(&mut self, status: IngestStatus) {
        match status {
            IngestStatus::TextIndexed => self.text_indexed += 1,
            IngestStatus::StringsIndexed => self.strings_indexed += 1,
            IngestStatus::MetadataIndexed => self.metadata_indexed += 1,
            IngestStatus::SkippedIndexError => self.index_errors += 1,
            IngestStatus::SkippedExtractError => self.extract_errors += 1,
            IngestStatus::SkippedIoError => self.io_errors += 1,
        }
    }

    /// Count for one status kind
    pub fn count(&self, status: IngestStatus) -> usize {
        match status {
            IngestStatus::TextIndexed => self.text_indexed,
            IngestStatus::StringsIndexed => self.strings_indexed,
            IngestStatus::MetadataIndexed => self.metadata_indexed,
            IngestStatus::SkippedIndexError => self.index_errors,
            IngestStatus::SkippedExtractError => self.extract_errors,
            IngestStatus::SkippedIoError => self.io_errors,
        }
    }

    /// Total number of files counted
    pub fn total(&self) -> usize {
        IngestStatus::ALL.iter().map(|s| self.count(*s)).sum()
    }

    /// Alert the user should see, if any.
    ///
    /// Index write errors raise an error alert; extraction and I/O errors
    /// alone raise a warning.
    pub fn alert(&self) -> Option<(AlertLevel, String, String)> {
        if self.index_errors > 0 {
            Some((
                AlertLevel::Error,
                "Keyword Indexing Errors".to_string(),
                format!(
                    "Keyword index service had errors ingesting {} file(s). \
                     Keyword search results may be incomplete.",
                    self.index_errors
                ),
            ))
        } else if self.io_errors + self.extract_errors > 0 {
            Some((
                AlertLevel::Warning,
                "Keyword Indexing Warning".to_string(),
                format!(
                    "Keyword search could not read or extract text from {} file(s). \
                     They were not indexed.",
                    self.io_errors + self.extract_errors
                ),
            ))
        } else {
            None
        }
    }

    /// Two-column text table, one row per status kind
    pub fn render_table(&self) -> String {
        let width = IngestStatus::ALL
            .iter()
            .map(|s| s.label().len())
            .max()
            .unwrap_or(0);
        let mut out = String::new();
        for status in IngestStatus::ALL {
            let _ = writeln!(
                out,
                "{:<width$}  {}",
                status.label(),
                self.count(status),
                width = width
            );
        }
        out
    }
}
