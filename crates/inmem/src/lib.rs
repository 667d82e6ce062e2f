//! In-process collaborators for keyhunt ingest jobs
//!
//! Implementations of every `keyhunt-core` collaborator trait that keep
//! all state in memory:
//! - InMemoryIndex: committed/pending documents, literal and regex term queries
//! - PlainTextExtractor, HtmlTextExtractor, AsciiStringExtractor: chunked text
//! - ExtensionFormatDetector: magic bytes, then file extension
//! - StaticKeywordLists: editable keyword list store
//! - MemoryArtifactStore: keyword-hit artifacts
//! - RecordingSink, LogSink, JsonLinesSink: notification sinks
//!
//! Useful for tests and for embedding a job without an external engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifacts;
pub mod extract;
pub mod index;
pub mod lists;
pub mod sink;
pub mod tokenizer;

pub use artifacts::MemoryArtifactStore;
pub use extract::{
    AsciiStringExtractor, ExtensionFormatDetector, HtmlTextExtractor, PlainTextExtractor,
    DEFAULT_CHUNK_SIZE,
};
pub use index::InMemoryIndex;
pub use lists::StaticKeywordLists;
pub use sink::{JsonLinesSink, LogSink, RecordingSink};
