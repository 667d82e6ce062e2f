//! Keyword search ingest engine
//!
//! This crate orchestrates indexing and periodic searching during an ingest job:
//! - Indexer: per-file extraction strategy and status recording
//! - IngestStatusTable: one outcome per file, summarized at job end
//! - ResultDeduplicator: per-keyword ledger of reported documents
//! - DataSourceSet: data sources searched by this job
//! - PeriodicTrigger: commit-due and search-due timers
//! - SearchScheduler: single-flight gate and search run threads
//! - IngestJobController: start_up / process / shut_down
//!
//! The engine never talks to a concrete index or extractor; everything goes
//! through the collaborator traits of `keyhunt-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod data_sources;
pub mod dedup;
pub mod indexer;
pub mod scheduler;
pub mod searcher;
pub mod status;
pub mod trigger;

pub use controller::{IngestJobController, JobServices};
pub use data_sources::DataSourceSet;
pub use dedup::{flatten_by_file, ResultDeduplicator};
pub use indexer::{is_archive_format, Indexer, ARCHIVE_MIME_TYPES};
pub use scheduler::{SchedulerState, SearchScheduler};
pub use searcher::{RunOutcome, RunReport, MODULE_NAME};
pub use status::IngestStatusTable;
pub use trigger::PeriodicTrigger;
