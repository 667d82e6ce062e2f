//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use keyhunt::inmem::{
    AsciiStringExtractor, ExtensionFormatDetector, HtmlTextExtractor, InMemoryIndex,
    MemoryArtifactStore, PlainTextExtractor, RecordingSink, StaticKeywordLists,
};
pub use keyhunt::{
    ContentHit, DataSourceId, Document, FileId, FileKind, FileRecord, IndexError, IndexService,
    IngestConfig, IngestJobController, IngestStatus, JobServices, Keyword, KeywordList,
    KnownState, MessageKind, QueryFilter, QueryResults, RunOutcome, RunReport, SchedulerState,
};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

/// Interval long enough that timers never fire during a test
pub const LONG: Duration = Duration::from_secs(3600);

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route engine logs to the test writer.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Poll `cond` every millisecond until it holds or `limit` elapses.
pub fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

// ============================================================================
// ObservedIndex - instrumented index service
// ============================================================================

/// Index call seen by `ObservedIndex`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexEvent {
    /// Commit, with the committed document count afterwards
    Commit(u64),
    /// Query for a keyword
    Query(String),
}

/// Wraps an `InMemoryIndex`, records commits and queries, tracks how many
/// queries run at once, and can hold queries until released.
pub struct ObservedIndex {
    pub inner: Arc<InMemoryIndex>,
    events: Mutex<Vec<IndexEvent>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    held: Mutex<bool>,
    release: Condvar,
    waiting: AtomicUsize,
    query_delay: Mutex<Duration>,
}

impl ObservedIndex {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(InMemoryIndex::new()),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            held: Mutex::new(false),
            release: Condvar::new(),
            waiting: AtomicUsize::new(0),
            query_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Block every query until `release_queries()`
    pub fn hold_queries(&self) {
        *self.held.lock() = true;
    }

    /// Let held queries proceed
    pub fn release_queries(&self) {
        *self.held.lock() = false;
        self.release.notify_all();
    }

    /// Queries currently blocked by `hold_queries()`
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Sleep this long inside every query
    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock() = delay;
    }

    /// Most queries ever executing at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<IndexEvent> {
        self.events.lock().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, IndexEvent::Commit(_)))
            .count()
    }

    pub fn query_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, IndexEvent::Query(_)))
            .count()
    }
}

impl IndexService for ObservedIndex {
    fn is_running(&self) -> Result<bool, IndexError> {
        self.inner.is_running()
    }

    fn add_document(&self, document: Document) -> Result<(), IndexError> {
        self.inner.add_document(document)
    }

    fn commit(&self) -> Result<(), IndexError> {
        self.inner.commit()?;
        let docs = self.inner.document_count()?;
        self.events.lock().push(IndexEvent::Commit(docs));
        Ok(())
    }

    fn document_count(&self) -> Result<u64, IndexError> {
        self.inner.document_count()
    }

    fn num_indexed_files(&self) -> Result<u64, IndexError> {
        self.inner.num_indexed_files()
    }

    fn num_indexed_chunks(&self) -> Result<u64, IndexError> {
        self.inner.num_indexed_chunks()
    }

    fn query(&self, keyword: &Keyword, filter: &QueryFilter) -> Result<QueryResults, IndexError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.events
            .lock()
            .push(IndexEvent::Query(keyword.query().to_string()));

        {
            let mut held = self.held.lock();
            if *held {
                self.waiting.fetch_add(1, Ordering::SeqCst);
                while *held {
                    self.release.wait(&mut held);
                }
                self.waiting.fetch_sub(1, Ordering::SeqCst);
            }
        }

        let delay = *self.query_delay.lock();
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        let result = self.inner.query(keyword, filter);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn snippet(
        &self,
        term: &str,
        file_id: FileId,
        chunk: u32,
        is_regex: bool,
    ) -> Result<String, IndexError> {
        self.inner.snippet(term, file_id, chunk, is_regex)
    }
}

// ============================================================================
// TestJob - controller wired to in-memory collaborators
// ============================================================================

/// An ingest job over `ObservedIndex` and in-memory collaborators
pub struct TestJob {
    pub index: Arc<ObservedIndex>,
    pub lists: Arc<StaticKeywordLists>,
    pub artifacts: Arc<MemoryArtifactStore>,
    pub sink: Arc<RecordingSink>,
    pub job: IngestJobController,
}

impl TestJob {
    /// Job with timers that never fire on their own
    pub fn new(lists: Vec<KeywordList>) -> Self {
        Self::with_config(IngestConfig::with_intervals(LONG, LONG), lists)
    }

    pub fn with_config(config: IngestConfig, lists: Vec<KeywordList>) -> Self {
        init_tracing();
        let index = Arc::new(ObservedIndex::new());
        let store = Arc::new(StaticKeywordLists::new());
        for list in lists {
            store.insert(list, true);
        }
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let sink = Arc::new(RecordingSink::new());
        let services = JobServices {
            index: index.clone(),
            keyword_lists: store.clone(),
            artifacts: artifacts.clone(),
            sink: sink.clone(),
            format_detector: Arc::new(ExtensionFormatDetector::new()),
            text_extractors: vec![
                Arc::new(HtmlTextExtractor::new(index.clone())),
                Arc::new(PlainTextExtractor::new(index.clone())),
            ],
            string_extractor: Arc::new(AsciiStringExtractor::new(index.clone())),
        };
        let job = IngestJobController::new(config, services).expect("valid config");
        TestJob {
            index,
            lists: store,
            artifacts,
            sink,
            job,
        }
    }

    /// Job that has passed `start_up()`
    pub fn started(lists: Vec<KeywordList>) -> Self {
        let test = Self::new(lists);
        test.job.start_up().expect("start_up");
        test
    }

    /// Raise both due flags, then process `file`: the commit and the search
    /// launch happen before `file` itself is indexed.
    pub fn process_with_search(&self, file: &FileRecord) -> IngestStatus {
        self.job.scheduler().mark_commit_due();
        self.job.scheduler().mark_search_due();
        self.job.process(file)
    }

    /// Like `process_with_search`, then wait for the launched run
    pub fn search_round(&self, file: &FileRecord) -> Vec<RunReport> {
        self.process_with_search(file);
        self.job.wait_for_searchers()
    }
}

/// Text file in data source 1
pub fn text_file(id: u64, text: &str) -> FileRecord {
    FileRecord::new(id, 1, format!("file{}.txt", id), text.as_bytes().to_vec())
}

/// Keyword list "L" = {"foo" (literal), "ba.*" (regex)} with hit messages
pub fn foo_bar_list() -> KeywordList {
    KeywordList::new(
        "L",
        vec![Keyword::literal("foo"), Keyword::regex("ba.*")],
        true,
    )
}

/// New-hit count of a report set
pub fn new_hits(reports: &[RunReport]) -> usize {
    reports.iter().map(|r| r.new_hits).sum()
}
