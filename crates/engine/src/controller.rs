//! Ingest job controller
//!
//! Top-level lifecycle of one keyword search ingest job:
//!
//! ```text
//! start_up() -> process(file)* -> shut_down(cancelled) -> wait_for_searchers()
//! ```
//!
//! `process` runs on the ingest thread. Before indexing a file it checks
//! commit-due; a due commit runs synchronously and may launch a search run,
//! so a run never sees an index older than the commit that triggered it.

use crate::data_sources::DataSourceSet;
use crate::indexer::Indexer;
use crate::scheduler::{SchedulerState, SearchScheduler};
use crate::searcher::{RunReport, SearchContext, MODULE_NAME};
use crate::status::IngestStatusTable;
use keyhunt_core::{
    ArtifactWriter, Error, FileId, FileRecord, FormatDetector, IndexService, IndexSummary,
    IngestConfig, IngestMessage, IngestStatus, JobId, KeywordList, KeywordListStore, KnownState,
    MessageIdGenerator, MessageKind, NotificationSink, Result, StringExtractor, TextExtractor,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Collaborators of one ingest job
pub struct JobServices {
    /// Full-text index
    pub index: Arc<dyn IndexService>,
    /// Keyword list definitions
    pub keyword_lists: Arc<dyn KeywordListStore>,
    /// Keyword-hit artifact persistence
    pub artifacts: Arc<dyn ArtifactWriter>,
    /// Messages, alerts and summary
    pub sink: Arc<dyn NotificationSink>,
    /// Content format detection
    pub format_detector: Arc<dyn FormatDetector>,
    /// Content-type specific extractors, most specific first
    pub text_extractors: Vec<Arc<dyn TextExtractor>>,
    /// Heuristic string extraction fallback
    pub string_extractor: Arc<dyn StringExtractor>,
}

/// Drives indexing and periodic search for one ingest job
pub struct IngestJobController {
    job_id: JobId,
    config: IngestConfig,
    index: Arc<dyn IndexService>,
    keyword_lists: Arc<dyn KeywordListStore>,
    sink: Arc<dyn NotificationSink>,
    ids: Arc<MessageIdGenerator>,
    statuses: Arc<IngestStatusTable>,
    data_sources: Arc<DataSourceSet>,
    indexer: Indexer,
    scheduler: SearchScheduler,
    initialized: AtomicBool,
    processed_files: AtomicBool,
    shut_down: AtomicBool,
}

impl IngestJobController {
    /// Create a controller. Nothing runs until `start_up()`.
    ///
    /// # Errors
    ///
    /// `Error::Config` if the configuration is invalid.
    pub fn new(config: IngestConfig, services: JobServices) -> Result<Self> {
        config.validate()?;

        let job_id = JobId::new();
        let ids = Arc::new(MessageIdGenerator::new());
        let statuses = Arc::new(IngestStatusTable::new());
        let data_sources = Arc::new(DataSourceSet::new());

        let indexer = Indexer::new(
            Arc::clone(&services.index),
            services.format_detector,
            services.text_extractors,
            services.string_extractor,
            Arc::clone(&statuses),
        );

        let search = SearchContext {
            job_id,
            index: Arc::clone(&services.index),
            artifacts: services.artifacts,
            sink: Arc::clone(&services.sink),
            ids: Arc::clone(&ids),
            data_sources: Arc::clone(&data_sources),
        };
        let scheduler = SearchScheduler::new(
            config.commit_interval(),
            config.search_interval(),
            search,
            Arc::clone(&statuses),
        );

        Ok(Self {
            job_id,
            config,
            index: services.index,
            keyword_lists: services.keyword_lists,
            sink: services.sink,
            ids,
            statuses,
            data_sources,
            indexer,
            scheduler,
            initialized: AtomicBool::new(false),
            processed_files: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Job id attached to every log line
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Configuration in effect
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Scheduler of this job
    pub fn scheduler(&self) -> &SearchScheduler {
        &self.scheduler
    }

    /// Scheduler state
    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Ingest status of a file, until the job tears down
    pub fn status_of(&self, file_id: FileId) -> Option<IngestStatus> {
        self.statuses.get(file_id)
    }

    /// Per-status counts so far
    pub fn summary(&self) -> IndexSummary {
        self.statuses.summary()
    }

    /// Number of data sources seen so far
    pub fn data_source_count(&self) -> usize {
        self.data_sources.len()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Check the index service and start the timers.
    ///
    /// # Errors
    ///
    /// `Error::IndexUnavailable` if the index service is not running or does
    /// not answer; the job must not proceed.
    pub fn start_up(&self) -> Result<()> {
        info!(target: "keyhunt::ingest", job_id = %self.job_id, "Starting keyword search ingest");

        let reachable = match self.index.is_running() {
            Ok(true) => self.index.document_count().map(|_| ()).map_err(|e| e.to_string()),
            Ok(false) => Err("index service is not running".to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(reason) = reachable {
            error!(
                target: "keyhunt::ingest",
                job_id = %self.job_id,
                reason = %reason,
                "Keyword search index unavailable"
            );
            self.post(
                MessageKind::Error,
                "Error connecting to keyword search index",
                format!(
                    "Keyword search index could not be reached ({}). \
                     Keyword search ingest will not run.",
                    reason
                ),
            );
            return Err(Error::IndexUnavailable(reason));
        }

        if self.keyword_lists.has_no_keywords_for_search() {
            warn!(target: "keyhunt::ingest", job_id = %self.job_id, "No keywords configured for ingest");
            self.post(
                MessageKind::Warning,
                "No keywords in keyword list",
                "Only indexing will be done and keyword search will be skipped. \
                 Keyword lists can still be added to ingest.",
            );
        }

        self.scheduler.start()?;
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Index one file, committing and launching a search first if due.
    ///
    /// Never fails: per-file problems end up in the returned status.
    pub fn process(&self, file: &FileRecord) -> IngestStatus {
        if !self.initialized.load(Ordering::Acquire) {
            let status = IngestStatus::SkippedIndexError;
            self.statuses.record(file.id, status);
            return status;
        }

        match file.data_source {
            Some(source) => {
                if self.data_sources.insert(source) {
                    info!(target: "keyhunt::ingest", job_id = %self.job_id, data_source = %source, "Data source added");
                }
            }
            None => warn!(
                target: "keyhunt::ingest",
                job_id = %self.job_id,
                file_id = %file.id,
                "File has no data source"
            ),
        }

        if self.config.skip_known_files && file.known == KnownState::Known {
            return self.indexer.index_file(file, false);
        }

        self.processed_files.store(true, Ordering::Release);
        self.commit_and_search_if_due();
        self.indexer.index_file(file, true)
    }

    /// End the job.
    ///
    /// Cancelled: cancel active runs, commit once, release state, no final
    /// search. Otherwise: commit, post the summary, then launch the final
    /// run (which releases state when it ends) or release state now.
    /// Later `process` calls record `SkippedIndexError` and index nothing.
    pub fn shut_down(&self, cancelled: bool) -> Result<()> {
        if self.shut_down.load(Ordering::Acquire) {
            return Ok(());
        }
        if !self.initialized.load(Ordering::Acquire) {
            return Err(Error::NotInitialized);
        }
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // files arriving from here on are refused
        self.initialized.store(false, Ordering::Release);

        self.scheduler.begin_shutdown();

        if cancelled {
            let signalled = self.scheduler.cancel_active();
            info!(
                target: "keyhunt::ingest",
                job_id = %self.job_id,
                cancelled_runs = signalled,
                "Keyword search ingest cancelled"
            );
            self.commit();
            self.scheduler.teardown();
            return Ok(());
        }

        info!(target: "keyhunt::ingest", job_id = %self.job_id, "Keyword search ingest finishing");
        self.commit();
        self.post_index_summary();
        self.log_index_counts();

        let lists = self.snapshot_lists();
        if lists.is_empty() || !self.processed_files.load(Ordering::Acquire) {
            self.scheduler.teardown();
            return Ok(());
        }

        if let Err(e) = self.scheduler.launch(lists, true) {
            error!(
                target: "keyhunt::ingest",
                job_id = %self.job_id,
                error = %e,
                "Could not start final search"
            );
            self.scheduler.teardown();
            return Err(Error::Io(e));
        }
        Ok(())
    }

    /// Join every search run launched so far and return their reports
    pub fn wait_for_searchers(&self) -> Vec<RunReport> {
        self.scheduler.wait_for_runs()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn commit_and_search_if_due(&self) {
        if !self.scheduler.take_commit_due() {
            return;
        }
        self.commit();

        if !self.scheduler.should_launch() {
            return;
        }
        let lists = self.snapshot_lists();
        if lists.iter().all(KeywordList::is_empty) {
            return;
        }
        if let Err(e) = self.scheduler.launch(lists, false) {
            error!(
                target: "keyhunt::ingest",
                job_id = %self.job_id,
                error = %e,
                "Could not start search run"
            );
        }
    }

    fn commit(&self) {
        if let Err(e) = self.index.commit() {
            warn!(target: "keyhunt::index", job_id = %self.job_id, error = %e, "Commit failed");
            return;
        }
        info!(target: "keyhunt::index", job_id = %self.job_id, "Index committed");

        match self.index.num_indexed_files() {
            Ok(files) => self.sink.on_index_changed(files),
            Err(e) => warn!(
                target: "keyhunt::index",
                job_id = %self.job_id,
                error = %e,
                "Could not count indexed files"
            ),
        }
    }

    /// Lists selected for ingest, resolved now
    fn snapshot_lists(&self) -> Vec<KeywordList> {
        self.keyword_lists
            .lists_for_ingest()
            .into_iter()
            .filter_map(|name| {
                let list = self.keyword_lists.resolve(&name);
                if list.is_none() {
                    warn!(target: "keyhunt::search", job_id = %self.job_id, list = %name, "Keyword list not found");
                }
                list
            })
            .collect()
    }

    fn post_index_summary(&self) {
        let summary = self.statuses.summary();
        info!(
            target: "keyhunt::ingest",
            job_id = %self.job_id,
            text = summary.text_indexed,
            strings = summary.strings_indexed,
            metadata = summary.metadata_indexed,
            index_errors = summary.index_errors,
            extract_errors = summary.extract_errors,
            io_errors = summary.io_errors,
            "Indexing summary"
        );
        self.post(MessageKind::Info, "Keyword Indexing Results", summary.render_table());
        self.sink.on_summary(&summary);

        if let Some((level, title, body)) = summary.alert() {
            warn!(target: "keyhunt::ingest", job_id = %self.job_id, alert = %title, "{}", body);
            self.sink.on_alert(level, &title, &body);
        }
    }

    fn log_index_counts(&self) {
        match (self.index.num_indexed_files(), self.index.num_indexed_chunks()) {
            (Ok(files), Ok(chunks)) => info!(
                target: "keyhunt::index",
                job_id = %self.job_id,
                files,
                chunks,
                "Indexed files and chunks"
            ),
            (Err(e), _) | (_, Err(e)) => warn!(
                target: "keyhunt::index",
                job_id = %self.job_id,
                error = %e,
                "Could not count indexed files and chunks"
            ),
        }
    }

    fn post(&self, kind: MessageKind, subject: &str, details: impl Into<String>) {
        self.sink.post(IngestMessage::new(
            self.ids.next_id(),
            kind,
            MODULE_NAME,
            subject,
            details,
        ));
    }
}

impl std::fmt::Debug for IngestJobController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestJobController")
            .field("job_id", &self.job_id)
            .field("state", &self.scheduler.state())
            .finish()
    }
}
