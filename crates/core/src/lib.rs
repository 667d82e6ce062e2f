//! Core types and traits for keyhunt
//!
//! This crate defines the foundational types shared by the ingest engine
//! and the collaborator implementations:
//! - FileRecord, FileId, DataSourceId: files handed in by the ingest pipeline
//! - Keyword, KeywordList: what a search run looks for
//! - ContentHit, QueryResults: what the index service answers with
//! - IngestStatus: per-file indexing outcome
//! - IngestMessage: notifications posted to the host
//! - IndexSummary: end-of-job per-status counts
//! - Error: error type hierarchy
//! - Traits: collaborator interfaces (index service, extractors, list store, sinks)
//! - IngestConfig: update frequency and known-file handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod keyword;
pub mod message;
pub mod summary;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use cancel::CancelFlag;
pub use config::{IngestConfig, UpdateFrequency, CONFIG_FILE_NAME};
pub use error::{ArtifactError, Error, ExtractError, IndexError, Result};
pub use keyword::{Keyword, KeywordList};
pub use message::{AlertLevel, IngestMessage, MessageIdGenerator, MessageKind};
pub use summary::IndexSummary;
pub use traits::{
    ArtifactWriter, FormatDetector, IndexService, KeywordListStore, NotificationSink,
    StringExtractor, TextExtractor,
};
pub use types::{
    ArtifactId, ContentHit, DataSourceId, Document, DocumentContent, FileId, FileKind,
    FileRecord, IngestStatus, JobId, KeywordHitArtifact, KnownState, QueryFilter, QueryResults,
};
