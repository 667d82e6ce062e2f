//! Collaborator traits
//!
//! The ingest engine never talks to a search backend, a format handler, a
//! keyword list file or a user interface directly. It goes through these
//! narrow interfaces so each can be swapped without touching the engine.
//!
//! Thread safety: every trait requires `Send + Sync`. Index service and
//! sink methods are called both from the ingest thread and from search
//! runs executing on background threads.

use crate::error::{ArtifactError, ExtractError, IndexError};
use crate::keyword::{Keyword, KeywordList};
use crate::message::{AlertLevel, IngestMessage};
use crate::summary::IndexSummary;
use crate::types::{
    ArtifactId, Document, FileId, FileRecord, KeywordHitArtifact, QueryFilter, QueryResults,
};

/// Full-text index backend
///
/// Documents added are not visible to `query` until the next `commit`.
pub trait IndexService: Send + Sync {
    /// Whether the backend reports itself as running.
    ///
    /// # Errors
    ///
    /// Returns an error if the status itself cannot be obtained.
    fn is_running(&self) -> Result<bool, IndexError>;

    /// Append one document.
    fn add_document(&self, document: Document) -> Result<(), IndexError>;

    /// Make every added document visible to queries.
    fn commit(&self) -> Result<(), IndexError>;

    /// Number of committed documents (chunks plus metadata documents).
    fn document_count(&self) -> Result<u64, IndexError>;

    /// Number of distinct committed files.
    fn num_indexed_files(&self) -> Result<u64, IndexError>;

    /// Number of committed text chunks.
    fn num_indexed_chunks(&self) -> Result<u64, IndexError>;

    /// Run one keyword query against committed documents.
    ///
    /// Literal keywords answer with a single term; regex keywords answer
    /// with one entry per distinct matched term.
    ///
    /// # Errors
    ///
    /// `IndexError::Unavailable` when no index is usable, any other
    /// variant when only this query failed.
    fn query(&self, keyword: &Keyword, filter: &QueryFilter) -> Result<QueryResults, IndexError>;

    /// Text preview around `term` inside one chunk of a file.
    fn snippet(
        &self,
        term: &str,
        file_id: FileId,
        chunk: u32,
        is_regex: bool,
    ) -> Result<String, IndexError>;
}

/// Content-type specific text extractor
///
/// Extractors are consulted in order; the first one that supports the
/// detected format wins. An extractor writes its own chunk documents.
pub trait TextExtractor: Send + Sync {
    /// Name for logging
    fn name(&self) -> &str;

    /// Whether this extractor targets specific content types. Generic
    /// fallbacks return false and are never chosen by format.
    fn is_content_type_specific(&self) -> bool {
        true
    }

    /// Whether this extractor handles the file in the detected format
    fn is_supported(&self, file: &FileRecord, detected_format: Option<&str>) -> bool;

    /// Extract text, chunk it and write the chunks to the index.
    fn index(&self, file: &FileRecord) -> Result<(), ExtractError>;
}

/// Heuristic string extractor used when no text extractor applies
pub trait StringExtractor: Send + Sync {
    /// Extract printable strings, chunk them and write the chunks.
    fn index(&self, file: &FileRecord) -> Result<(), ExtractError>;
}

/// Content format (MIME type) detection
pub trait FormatDetector: Send + Sync {
    /// Detected MIME type, `None` when nothing could be determined.
    fn detect(&self, file: &FileRecord) -> Result<Option<String>, ExtractError>;
}

/// Source of keyword list definitions
///
/// Read at every search run launch, so edits take effect on the next run.
pub trait KeywordListStore: Send + Sync {
    /// Names of the lists selected for ingest search, in search order
    fn lists_for_ingest(&self) -> Vec<String>;

    /// Resolve a list by name
    fn resolve(&self, name: &str) -> Option<KeywordList>;

    /// True when no list selected for ingest has any keyword
    fn has_no_keywords_for_search(&self) -> bool {
        self.lists_for_ingest()
            .iter()
            .filter_map(|name| self.resolve(name))
            .all(|list| list.is_empty())
    }
}

/// Persistence of keyword-hit artifacts
pub trait ArtifactWriter: Send + Sync {
    /// Persist one hit and return its id
    fn write_keyword_hit(&self, artifact: KeywordHitArtifact) -> Result<ArtifactId, ArtifactError>;
}

/// Receiver of user-facing notifications
pub trait NotificationSink: Send + Sync {
    /// An inbox message (hit, summary, warning, error)
    fn post(&self, message: IngestMessage);

    /// End-of-job indexing summary
    fn on_summary(&self, _summary: &IndexSummary) {}

    /// Pop-up alert
    fn on_alert(&self, _level: AlertLevel, _title: &str, _body: &str) {}

    /// Number of indexed files changed after a commit
    fn on_index_changed(&self, _indexed_files: u64) {}

    /// New artifacts were written by one keyword of a search run
    fn on_artifacts(&self, _artifacts: &[ArtifactId]) {}
}
