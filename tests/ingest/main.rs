//! Ingest Integration Tests
//!
//! End-to-end behavior of an ingest job: indexing statuses, commit/search
//! ordering, result deduplication across runs, the single-flight searcher
//! gate, cancellation and configuration.

#[path = "../common/mod.rs"]
mod common;

mod cancellation;
mod commit_order;
mod config;
mod indexing;
mod scenario;
