//! One keyword search run
//!
//! A `SearcherRun` is created at launch with a snapshot of the keyword
//! lists and executed on its own thread once the scheduler's gate is held.
//! Everything here runs with exclusive access to the result ledger.
//!
//! # Cancellation checkpoints
//!
//! - before each keyword's query
//! - right after a query returns, before any of its hits are handled
//! - before each hit file
//!
//! Work persisted for earlier keywords is kept when a run stops early.

use crate::data_sources::DataSourceSet;
use crate::dedup::{flatten_by_file, ResultDeduplicator};
use keyhunt_core::{
    ArtifactId, ArtifactWriter, CancelFlag, ContentHit, IndexService, IngestMessage, JobId,
    Keyword, KeywordHitArtifact, KeywordList, MessageIdGenerator, MessageKind, NotificationSink,
};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Module name on every message this crate posts
pub const MODULE_NAME: &str = "Keyword Search";

// ============================================================================
// Run reports
// ============================================================================

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    /// Every keyword of every list was searched
    Completed,
    /// The cancel flag was observed at a checkpoint
    Cancelled,
    /// The index became unusable, or the run panicked
    Aborted,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Run id, increasing per job starting at 1
    pub run_id: u64,
    /// True for the shutdown run
    pub is_final: bool,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Queries that returned an answer
    pub keywords_searched: usize,
    /// Newly reported (term, file) pairs with a persisted artifact
    pub new_hits: usize,
    /// Wall time from launch to gate release
    pub elapsed: Duration,
}

impl RunReport {
    fn empty(run_id: u64, is_final: bool, outcome: RunOutcome, elapsed: Duration) -> Self {
        Self {
            run_id,
            is_final,
            outcome,
            keywords_searched: 0,
            new_hits: 0,
            elapsed,
        }
    }

    pub(crate) fn aborted(run_id: u64, is_final: bool) -> Self {
        Self::empty(run_id, is_final, RunOutcome::Aborted, Duration::ZERO)
    }

    /// Non-final run that never searched
    pub(crate) fn cancelled(run_id: u64, elapsed: Duration) -> Self {
        Self::empty(run_id, false, RunOutcome::Cancelled, elapsed)
    }
}

// ============================================================================
// Search context
// ============================================================================

/// Collaborators a run talks to, shared by every run of a job
pub(crate) struct SearchContext {
    pub(crate) job_id: JobId,
    pub(crate) index: Arc<dyn IndexService>,
    pub(crate) artifacts: Arc<dyn ArtifactWriter>,
    pub(crate) sink: Arc<dyn NotificationSink>,
    pub(crate) ids: Arc<MessageIdGenerator>,
    pub(crate) data_sources: Arc<DataSourceSet>,
}

impl SearchContext {
    pub(crate) fn post(&self, kind: MessageKind, subject: impl Into<String>, details: impl Into<String>) {
        self.sink.post(IngestMessage::new(
            self.ids.next_id(),
            kind,
            MODULE_NAME,
            subject,
            details,
        ));
    }
}

// ============================================================================
// SearcherRun
// ============================================================================

/// Why a keyword's processing stopped early
enum Halt {
    Cancelled,
    Unavailable,
}

enum HitOutcome {
    Reported(ArtifactId),
    Skipped,
    Halted(Halt),
}

/// Transient state of one run
pub(crate) struct SearcherRun {
    pub(crate) id: u64,
    pub(crate) is_final: bool,
    pub(crate) lists: Vec<KeywordList>,
    pub(crate) cancel: CancelFlag,
}

impl SearcherRun {
    /// Search every keyword of every list, in order
    pub(crate) fn execute(
        &self,
        ctx: &SearchContext,
        ledger: &mut ResultDeduplicator,
        started: Instant,
    ) -> RunReport {
        let mut report = RunReport {
            run_id: self.id,
            is_final: self.is_final,
            outcome: RunOutcome::Completed,
            keywords_searched: 0,
            new_hits: 0,
            elapsed: Duration::ZERO,
        };

        'lists: for list in &self.lists {
            for keyword in list.keywords() {
                if self.cancel.is_cancelled() {
                    report.outcome = RunOutcome::Cancelled;
                    break 'lists;
                }

                let filter = ctx.data_sources.query_filter();
                let results = match ctx.index.query(keyword, &filter) {
                    Ok(results) => results,
                    Err(e) if e.is_unavailable() => {
                        error!(
                            target: "keyhunt::search",
                            job_id = %ctx.job_id,
                            run_id = self.id,
                            keyword = %keyword,
                            error = %e,
                            "Index unavailable, aborting search run"
                        );
                        report.outcome = RunOutcome::Aborted;
                        break 'lists;
                    }
                    Err(e) => {
                        warn!(
                            target: "keyhunt::search",
                            job_id = %ctx.job_id,
                            run_id = self.id,
                            keyword = %keyword,
                            error = %e,
                            "Query failed, skipping keyword"
                        );
                        continue;
                    }
                };

                if self.cancel.is_cancelled() {
                    report.outcome = RunOutcome::Cancelled;
                    break 'lists;
                }
                report.keywords_searched += 1;

                let fresh = ledger.filter_new(results, keyword.is_regex());
                debug!(
                    target: "keyhunt::search",
                    run_id = self.id,
                    keyword = %keyword,
                    new_terms = fresh.len(),
                    "Keyword searched"
                );
                if fresh.is_empty() {
                    continue;
                }

                let mut written = Vec::new();
                let halted = self.report_new_hits(ctx, ledger, list, keyword, fresh, &mut written);
                report.new_hits += written.len();
                if !written.is_empty() {
                    ctx.sink.on_artifacts(&written);
                }

                match halted {
                    None => {}
                    Some(Halt::Cancelled) => {
                        report.outcome = RunOutcome::Cancelled;
                        break 'lists;
                    }
                    Some(Halt::Unavailable) => {
                        report.outcome = RunOutcome::Aborted;
                        break 'lists;
                    }
                }
            }
        }

        report.elapsed = started.elapsed();
        report
    }

    /// Persist and announce the new hits of one query.
    ///
    /// A hit that ends up without an artifact is taken back out of the
    /// ledger so a later run reports it. On a halt the same goes for every
    /// hit not reached yet.
    fn report_new_hits(
        &self,
        ctx: &SearchContext,
        ledger: &mut ResultDeduplicator,
        list: &KeywordList,
        keyword: &Keyword,
        fresh: BTreeMap<Keyword, Vec<ContentHit>>,
        written: &mut Vec<ArtifactId>,
    ) -> Option<Halt> {
        let pending: Vec<(Keyword, ContentHit)> = fresh
            .iter()
            .flat_map(|(term, hits)| {
                flatten_by_file(hits)
                    .into_iter()
                    .map(move |hit| (term.clone(), hit.clone()))
            })
            .collect();
        let mut pending = pending.into_iter();

        while let Some((term, hit)) = pending.next() {
            match self.report_hit(ctx, list, keyword, &term, &hit) {
                HitOutcome::Reported(id) => written.push(id),
                HitOutcome::Skipped => {
                    ledger.forget(&term, hit.document_id());
                }
                HitOutcome::Halted(halt) => {
                    ledger.forget(&term, hit.document_id());
                    for (term, hit) in pending {
                        ledger.forget(&term, hit.document_id());
                    }
                    return Some(halt);
                }
            }
        }
        None
    }

    /// Snippet, artifact and message for one hit file
    fn report_hit(
        &self,
        ctx: &SearchContext,
        list: &KeywordList,
        keyword: &Keyword,
        term: &Keyword,
        hit: &ContentHit,
    ) -> HitOutcome {
        if self.cancel.is_cancelled() {
            return HitOutcome::Halted(Halt::Cancelled);
        }

        let snippet = match ctx
            .index
            .snippet(term.query(), hit.file_id, hit.chunk, keyword.is_regex())
        {
            Ok(snippet) => snippet,
            Err(e) if e.is_unavailable() => {
                error!(
                    target: "keyhunt::search",
                    job_id = %ctx.job_id,
                    run_id = self.id,
                    error = %e,
                    "Index unavailable while fetching snippet, aborting search run"
                );
                return HitOutcome::Halted(Halt::Unavailable);
            }
            Err(e) => {
                warn!(
                    target: "keyhunt::search",
                    run_id = self.id,
                    term = term.query(),
                    file_id = %hit.file_id,
                    error = %e,
                    "Snippet failed, skipping hit"
                );
                return HitOutcome::Skipped;
            }
        };

        let artifact = KeywordHitArtifact {
            term: term.query().to_string(),
            regex: keyword.is_regex().then(|| keyword.query().to_string()),
            list_name: list.name().to_string(),
            file_id: hit.file_id,
            file_path: hit.full_path(),
            chunk: hit.chunk,
            snippet,
        };

        let message = list
            .ingest_messages
            .then(|| hit_message(ctx, keyword, &artifact));

        match ctx.artifacts.write_keyword_hit(artifact) {
            Ok(id) => {
                if let Some(message) = message {
                    ctx.sink.post(message.with_artifact(id));
                }
                HitOutcome::Reported(id)
            }
            Err(e) => {
                warn!(
                    target: "keyhunt::search",
                    run_id = self.id,
                    term = term.query(),
                    file_id = %hit.file_id,
                    error = %e,
                    "Could not persist keyword hit"
                );
                HitOutcome::Skipped
            }
        }
    }
}

/// Data message announcing one hit
fn hit_message(ctx: &SearchContext, keyword: &Keyword, artifact: &KeywordHitArtifact) -> IngestMessage {
    let subject = if keyword.is_regex() {
        format!("Regexp hit: {}", artifact.term)
    } else {
        format!("Keyword hit: {}", artifact.term)
    };

    let mut details = String::new();
    let _ = writeln!(details, "Keyword: {}", artifact.term);
    let _ = writeln!(details, "Preview: {}", artifact.snippet);
    let _ = writeln!(details, "File: {}", artifact.file_path);
    let _ = writeln!(details, "List: {}", artifact.list_name);
    if let Some(regex) = &artifact.regex {
        let _ = writeln!(details, "Regex: {}", regex);
    }

    IngestMessage::new(ctx.ids.next_id(), MessageKind::Data, MODULE_NAME, subject, details)
        .with_unique_key(artifact.term.to_lowercase())
}

/// Log line for a finished run
pub(crate) fn log_report(job_id: &JobId, report: &RunReport) {
    info!(
        target: "keyhunt::search",
        job_id = %job_id,
        run_id = report.run_id,
        is_final = report.is_final,
        outcome = %report.outcome,
        keywords = report.keywords_searched,
        new_hits = report.new_hits,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Search run finished"
    );
}
