//! Error types for keyhunt
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Errors fall into three propagation scopes:
//! - job: `Error` returned from controller start-up (index service unreachable)
//! - run: `IndexError::Unavailable` observed during a search aborts that run
//! - item: every other `IndexError` / `ExtractError` is recorded and logged

use crate::types::FileId;
use std::io;
use thiserror::Error;

/// Result type alias for job-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the index service
#[derive(Debug, Error)]
pub enum IndexError {
    /// No usable index: service down, core not open, connection refused
    #[error("Index service unavailable: {0}")]
    Unavailable(String),

    /// A single query could not be executed
    #[error("Query '{query}' failed: {reason}")]
    Query {
        /// Query string that failed
        query: String,
        /// Failure reason
        reason: String,
    },

    /// A document could not be written
    #[error("Failed to index file {file_id}: {reason}")]
    Write {
        /// File whose document was rejected
        file_id: FileId,
        /// Failure reason
        reason: String,
    },

    /// Commit failed
    #[error("Index commit failed: {0}")]
    Commit(String),
}

impl IndexError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        IndexError::Unavailable(reason.into())
    }

    /// Create a query error
    pub fn query(query: impl Into<String>, reason: impl Into<String>) -> Self {
        IndexError::Query {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// True when no index is usable at all, so every further request
    /// would fail the same way.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, IndexError::Unavailable(_))
    }
}

/// Errors reported by text, string and format extractors
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Content could not be read
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The extractor does not handle this content
    #[error("Unsupported content: {0}")]
    Unsupported(String),

    /// Extraction ran but produced nothing usable
    #[error("Extraction failed: {0}")]
    Failed(String),

    /// Extracted text could not be written to the index
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Errors reported by the artifact store
#[derive(Debug, Error)]
#[error("Failed to write artifact: {0}")]
pub struct ArtifactError(pub String);

/// Job-level error
#[derive(Debug, Error)]
pub enum Error {
    /// Index service unreachable at start-up; the job cannot start
    #[error("Keyword search index unavailable: {0}")]
    IndexUnavailable(String),

    /// Operation requires a started job
    #[error("Ingest job not initialized")]
    NotInitialized,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index service error surfaced at job level
    #[error(transparent)]
    Index(#[from] IndexError),
}
