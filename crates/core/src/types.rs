//! Core types for keyhunt
//!
//! This module defines the foundational types:
//! - JobId: Unique identifier for one ingest job
//! - FileId / DataSourceId: identifiers assigned by the case database
//! - FileRecord: a file handed to the ingest job by the pipeline
//! - IngestStatus: per-file indexing outcome
//! - Document: what gets written into the index service
//! - ContentHit / QueryResults: what the index service answers with
//! - KeywordHitArtifact: persisted record of a newly-confirmed hit

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an ingest job
///
/// Attached to every log line the engine emits for a job so that
/// concurrent jobs can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Create a new random JobId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the raw bytes of this JobId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Case-database identifier of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a data source (e.g. one disk image)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataSourceId(pub u64);

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a persisted keyword-hit artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(pub u64);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// FileRecord
// ============================================================================

/// What kind of object a file record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// Regular allocated file
    Regular,
    /// Directory
    Directory,
    /// Synthesized directory with no content and no on-disk name
    VirtualDirectory,
    /// Pseudo-file covering unallocated space
    UnallocatedBlocks,
    /// Pseudo-file covering unused blocks of a volume
    UnusedBlocks,
}

impl FileKind {
    /// Returns true for the unallocated/unused-block pseudo-files that only
    /// support heuristic string extraction.
    pub fn is_block_pseudo_file(&self) -> bool {
        matches!(self, FileKind::UnallocatedBlocks | FileKind::UnusedBlocks)
    }

    /// Returns true for real and virtual directories.
    pub fn is_directory(&self) -> bool {
        matches!(self, FileKind::Directory | FileKind::VirtualDirectory)
    }
}

/// Hash-set classification of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KnownState {
    /// Not found in any hash set
    #[default]
    Unknown,
    /// Matched a known-good hash set
    Known,
    /// Matched a notable (known-bad) hash set
    Notable,
}

/// A file handed to the ingest job by the pipeline
///
/// Content is shared (`Arc<[u8]>`) so extractors can read it without
/// copying; metadata-only processing never touches it.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Case-database identifier
    pub id: FileId,
    /// File name without its parent path
    pub name: String,
    /// Parent path, ending with `/`
    pub parent_path: String,
    /// Owning data source, when the case database could resolve it
    pub data_source: Option<DataSourceId>,
    /// Object kind
    pub kind: FileKind,
    /// Hash-set classification
    pub known: KnownState,
    content: Arc<[u8]>,
}

impl FileRecord {
    /// Create a regular file record with the given content
    pub fn new(
        id: u64,
        data_source: u64,
        name: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id: FileId(id),
            name: name.into(),
            parent_path: "/".to_string(),
            data_source: Some(DataSourceId(data_source)),
            kind: FileKind::Regular,
            known: KnownState::Unknown,
            content: Arc::from(content.into()),
        }
    }

    /// Set the object kind
    pub fn with_kind(mut self, kind: FileKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the hash-set classification
    pub fn with_known(mut self, known: KnownState) -> Self {
        self.known = known;
        self
    }

    /// Set the parent path
    pub fn with_parent_path(mut self, parent_path: impl Into<String>) -> Self {
        self.parent_path = parent_path.into();
        self
    }

    /// Clear the data source (case database could not resolve it)
    pub fn without_data_source(mut self) -> Self {
        self.data_source = None;
        self
    }

    /// File content
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Content size in bytes
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Parent path joined with the file name
    pub fn full_path(&self) -> String {
        format!("{}{}", self.parent_path, self.name)
    }

    /// Lowercased extension, if the name has one
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit_once('.')
            .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

// ============================================================================
// IngestStatus
// ============================================================================

/// Outcome of indexing one file
///
/// Set exactly once per file id within a job and never mutated afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngestStatus {
    /// Text was extracted by a format-specific extractor and indexed
    TextIndexed,
    /// Strings were extracted heuristically and indexed
    StringsIndexed,
    /// Only metadata was indexed
    MetadataIndexed,
    /// Skipped because the index service rejected the write
    SkippedIndexError,
    /// Skipped because text extraction failed
    SkippedExtractError,
    /// Skipped because the content could not be read
    SkippedIoError,
}

impl IngestStatus {
    /// All six status kinds, in summary order
    pub const ALL: [IngestStatus; 6] = [
        IngestStatus::TextIndexed,
        IngestStatus::StringsIndexed,
        IngestStatus::MetadataIndexed,
        IngestStatus::SkippedIndexError,
        IngestStatus::SkippedExtractError,
        IngestStatus::SkippedIoError,
    ];

    /// Returns true for the three skip kinds
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            IngestStatus::SkippedIndexError
                | IngestStatus::SkippedExtractError
                | IngestStatus::SkippedIoError
        )
    }

    /// Human-readable summary label
    pub fn label(&self) -> &'static str {
        match self {
            IngestStatus::TextIndexed => "Files with known types",
            IngestStatus::StringsIndexed => "Files with general strings extracted",
            IngestStatus::MetadataIndexed => "Metadata only was indexed",
            IngestStatus::SkippedIndexError => "Error (indexer)",
            IngestStatus::SkippedExtractError => "Error (text extraction)",
            IngestStatus::SkippedIoError => "Error (I/O)",
        }
    }
}

impl fmt::Display for IngestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStatus::TextIndexed => "text_indexed",
            IngestStatus::StringsIndexed => "strings_indexed",
            IngestStatus::MetadataIndexed => "metadata_indexed",
            IngestStatus::SkippedIndexError => "skipped_index_error",
            IngestStatus::SkippedExtractError => "skipped_extract_error",
            IngestStatus::SkippedIoError => "skipped_io_error",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Document
// ============================================================================

/// Body of an index document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    /// Name, path and other metadata only
    MetadataOnly,
    /// Extracted text for one chunk of the file
    Text(String),
}

/// One document written to the index service
///
/// Large files are written as several chunk documents; chunk numbering
/// starts at 1. A metadata-only document has no chunk.
#[derive(Debug, Clone)]
pub struct Document {
    /// File the document belongs to
    pub file_id: FileId,
    /// Data source of the file
    pub data_source: Option<DataSourceId>,
    /// File name
    pub name: String,
    /// Parent path
    pub parent_path: String,
    /// Chunk number, `None` for metadata-only documents
    pub chunk: Option<u32>,
    /// Document body
    pub content: DocumentContent,
}

impl Document {
    /// Metadata-only document for a file
    pub fn metadata_only(file: &FileRecord) -> Self {
        Self {
            file_id: file.id,
            data_source: file.data_source,
            name: file.name.clone(),
            parent_path: file.parent_path.clone(),
            chunk: None,
            content: DocumentContent::MetadataOnly,
        }
    }

    /// Text chunk document for a file
    pub fn chunk(file: &FileRecord, chunk: u32, text: String) -> Self {
        Self {
            file_id: file.id,
            data_source: file.data_source,
            name: file.name.clone(),
            parent_path: file.parent_path.clone(),
            chunk: Some(chunk),
            content: DocumentContent::Text(text),
        }
    }
}

// ============================================================================
// Query
// ============================================================================

/// Restriction applied to every keyword query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryFilter {
    /// Only documents from these data sources match. Empty matches nothing.
    pub data_sources: Vec<DataSourceId>,
}

impl QueryFilter {
    /// Filter restricted to the given data sources
    pub fn data_sources(ids: impl IntoIterator<Item = DataSourceId>) -> Self {
        Self {
            data_sources: ids.into_iter().collect(),
        }
    }

    /// Returns true if a document from `source` passes the filter
    pub fn admits(&self, source: Option<DataSourceId>) -> bool {
        source.is_some_and(|s| self.data_sources.contains(&s))
    }
}

/// A keyword match inside one document chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHit {
    /// File that matched
    pub file_id: FileId,
    /// Chunk that matched (0 when the file was indexed as a single document)
    pub chunk: u32,
    /// Data source of the file
    pub data_source: DataSourceId,
    /// File name
    pub file_name: String,
    /// Parent path of the file
    pub parent_path: String,
}

impl ContentHit {
    /// Identifier used for result deduplication
    ///
    /// Hits are deduplicated per file, not per chunk: a second chunk of an
    /// already-reported file is not a new hit.
    pub fn document_id(&self) -> FileId {
        self.file_id
    }

    /// Parent path joined with the file name
    pub fn full_path(&self) -> String {
        format!("{}{}", self.parent_path, self.file_name)
    }
}

/// Raw query answer: matched term -> hits
///
/// A literal query answers with a single term; a regex query answers with
/// one entry per distinct term the expression matched.
pub type QueryResults = BTreeMap<String, Vec<ContentHit>>;

// ============================================================================
// KeywordHitArtifact
// ============================================================================

/// Persisted record of one newly-confirmed keyword hit in one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordHitArtifact {
    /// Term that matched
    pub term: String,
    /// Regular expression that produced the term, for regex keywords
    pub regex: Option<String>,
    /// Keyword list the keyword came from
    pub list_name: String,
    /// File that matched
    pub file_id: FileId,
    /// Full path of the file
    pub file_path: String,
    /// First chunk of the file that matched
    pub chunk: u32,
    /// Text preview around the match
    pub snippet: String,
}
