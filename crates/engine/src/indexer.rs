//! Per-file indexing
//!
//! Decides how a file gets into the index (metadata only, format-specific
//! text, or heuristic strings), delegates the extraction itself, and records
//! exactly one `IngestStatus` for the file.
//!
//! # Decision order
//!
//! 1. Unallocated/unused-block pseudo-files: strings, always.
//! 2. Content not requested, directories, empty files: metadata only.
//! 3. Archive containers: metadata only (their members are ingested on
//!    their own once unpacked).
//! 4. First content-type specific extractor supporting the detected format.
//! 5. Fallback: heuristic strings.
//!
//! Failures never escape this module; they end up in the status table and
//! the log.

use crate::status::IngestStatusTable;
use keyhunt_core::{
    Document, ExtractError, FileRecord, FormatDetector, IndexService, IngestStatus,
    StringExtractor, TextExtractor,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// MIME types of archive containers indexed by metadata only
pub const ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/x-7z-compressed",
    "application/x-ace-compressed",
    "application/x-alz-compressed",
    "application/x-arj",
    "application/vnd.ms-cab-compressed",
    "application/x-cfs-compressed",
    "application/x-dgc-compressed",
    "application/x-apple-diskimage",
    "application/x-gca-compressed",
    "application/x-dar",
    "application/x-lzx",
    "application/x-lzh",
    "application/x-rar-compressed",
    "application/x-stuffit",
    "application/x-stuffitx",
    "application/x-gtar",
    "application/x-archive",
    "application/x-gzip",
    "application/gzip",
    "application/zip",
    "application/x-zoo",
    "application/x-cpio",
    "application/x-shar",
    "application/x-tar",
    "application/x-bzip",
    "application/x-bzip2",
    "application/x-lzip",
    "application/x-lzma",
    "application/x-lzop",
    "application/x-compress",
];

/// Returns true if the MIME type is an archive container
pub fn is_archive_format(mime: &str) -> bool {
    ARCHIVE_MIME_TYPES.contains(&mime)
}

/// Writes files into the index
pub struct Indexer {
    index: Arc<dyn IndexService>,
    detector: Arc<dyn FormatDetector>,
    // most specific first
    text_extractors: Vec<Arc<dyn TextExtractor>>,
    strings: Arc<dyn StringExtractor>,
    statuses: Arc<IngestStatusTable>,
}

impl Indexer {
    /// Create an indexer recording outcomes into `statuses`
    pub fn new(
        index: Arc<dyn IndexService>,
        detector: Arc<dyn FormatDetector>,
        text_extractors: Vec<Arc<dyn TextExtractor>>,
        strings: Arc<dyn StringExtractor>,
        statuses: Arc<IngestStatusTable>,
    ) -> Self {
        Self {
            index,
            detector,
            text_extractors,
            strings,
            statuses,
        }
    }

    /// Index one file and record its status.
    ///
    /// With `index_content` false only metadata is written, except for
    /// block pseudo-files which have no metadata worth indexing.
    pub fn index_file(&self, file: &FileRecord, index_content: bool) -> IngestStatus {
        let status = self.index_file_inner(file, index_content);
        self.statuses.record(file.id, status);
        debug!(
            target: "keyhunt::index",
            file_id = %file.id,
            name = %file.name,
            status = %status,
            "File indexed"
        );
        status
    }

    fn index_file_inner(&self, file: &FileRecord, index_content: bool) -> IngestStatus {
        if file.kind.is_block_pseudo_file() {
            return self.extract_strings(file);
        }

        if !index_content || file.kind.is_directory() || file.size() == 0 {
            return self.index_metadata(file);
        }

        let detected = self.detect_format(file);

        if detected.as_deref().is_some_and(is_archive_format) {
            return self.index_metadata(file);
        }

        if let Some(status) = self.extract_text(file, detected.as_deref()) {
            return status;
        }

        self.extract_strings(file)
    }

    fn index_metadata(&self, file: &FileRecord) -> IngestStatus {
        match self.index.add_document(Document::metadata_only(file)) {
            Ok(()) => IngestStatus::MetadataIndexed,
            Err(e) => {
                warn!(
                    target: "keyhunt::index",
                    file_id = %file.id,
                    error = %e,
                    "Unable to index metadata"
                );
                IngestStatus::SkippedIndexError
            }
        }
    }

    fn detect_format(&self, file: &FileRecord) -> Option<String> {
        match self.detector.detect(file) {
            Ok(format) => format,
            Err(e) => {
                warn!(
                    target: "keyhunt::index",
                    file_id = %file.id,
                    error = %e,
                    "Could not detect format"
                );
                None
            }
        }
    }

    /// `None` means no extractor applied or extraction failed; the caller
    /// falls back to strings.
    fn extract_text(&self, file: &FileRecord, detected: Option<&str>) -> Option<IngestStatus> {
        let extractor = self
            .text_extractors
            .iter()
            .find(|e| e.is_content_type_specific() && e.is_supported(file, detected));

        let Some(extractor) = extractor else {
            info!(
                target: "keyhunt::index",
                file_id = %file.id,
                name = %file.name,
                format = detected.unwrap_or("unknown"),
                "No text extractor found"
            );
            return None;
        };

        match extractor.index(file) {
            Ok(()) => Some(IngestStatus::TextIndexed),
            Err(e) => {
                warn!(
                    target: "keyhunt::index",
                    file_id = %file.id,
                    name = %file.name,
                    extractor = extractor.name(),
                    error = %e,
                    "Failed to extract text, falling back to strings"
                );
                None
            }
        }
    }

    fn extract_strings(&self, file: &FileRecord) -> IngestStatus {
        match self.strings.index(file) {
            Ok(()) => IngestStatus::StringsIndexed,
            Err(e) => {
                warn!(
                    target: "keyhunt::index",
                    file_id = %file.id,
                    name = %file.name,
                    error = %e,
                    "Failed to extract strings"
                );
                match e {
                    ExtractError::Index(_) => IngestStatus::SkippedIndexError,
                    ExtractError::Io(_) => IngestStatus::SkippedIoError,
                    ExtractError::Unsupported(_) | ExtractError::Failed(_) => {
                        IngestStatus::SkippedExtractError
                    }
                }
            }
        }
    }
}
