//! keyhunt - incremental text indexing and periodic keyword search for ingest jobs
//!
//! Files handed in by an ingest pipeline are written to a full-text index
//! and committed on a cadence. Between files, a single-flight searcher
//! re-runs the configured keyword lists against the growing index and
//! reports each (keyword, file) hit exactly once.
//!
//! # Quick Start
//!
//! ```ignore
//! use keyhunt::{IngestConfig, IngestJobController, JobServices};
//!
//! let job = IngestJobController::new(IngestConfig::default(), services)?;
//! job.start_up()?;
//! for file in files {
//!     job.process(&file);
//! }
//! job.shut_down(false)?;
//! let reports = job.wait_for_searchers();
//! ```
//!
//! # Architecture
//!
//! - `keyhunt-core`: data model, collaborator traits, errors, configuration
//! - `keyhunt-engine`: indexer, status table, deduplicator, scheduler, controller
//! - `keyhunt-inmem`: in-process collaborators (index, extractors, lists, sinks)

pub use keyhunt_core::*;
pub use keyhunt_engine::*;

/// In-process collaborator implementations
pub mod inmem {
    pub use keyhunt_inmem::*;
}
