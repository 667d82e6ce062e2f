//! Commit/search scheduling and the single-flight searcher gate
//!
//! Two `PeriodicTrigger`s raise commit-due and search-due flags. The ingest
//! thread polls commit-due between files; after committing it asks
//! `should_launch()` and, if so, launches a search run on its own thread.
//!
//! # Single flight
//!
//! A run acquires the gate (a mutex that owns the result ledger) before any
//! index I/O and holds it until its body has fully exited. A run launched
//! while an older one is still inside, cancelled or not, blocks at the gate
//! on its own thread. The ingest thread never waits on the gate.
//!
//! While a run holds the gate both triggers are disarmed. On exit they are
//! re-armed unless the job is shutting down or a final run is pending.
//!
//! # Final run
//!
//! The shutdown run is never cancelled by `cancel_active()`. When it exits
//! it tears down the per-job state (ledger, data sources, statuses) and the
//! scheduler reaches `Done`. A non-final run that gets the gate after the
//! final run was launched returns `Cancelled` without touching the index.

use crate::dedup::ResultDeduplicator;
use crate::searcher::{log_report, RunReport, SearchContext, SearcherRun};
use crate::status::IngestStatusTable;
use crate::trigger::PeriodicTrigger;
use keyhunt_core::{CancelFlag, KeywordList, MessageKind};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info};

// ============================================================================
// SchedulerState
// ============================================================================

/// Observable scheduler state
///
/// `Idle -> CommitPending -> SearchPending -> Running -> Idle` while the
/// job runs, `ShuttingDown -> FinalSearchRunning -> Done` at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Nothing due, no run inside the gate
    Idle,
    /// Commit-due raised, waiting for the next `process` call
    CommitPending,
    /// Search-due raised, waiting for the next commit
    SearchPending,
    /// A run holds the gate
    Running,
    /// Shutdown started; no timer-driven run will launch
    ShuttingDown,
    /// The final run holds the gate
    FinalSearchRunning,
    /// Per-job state released
    Done,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::CommitPending => "commit_pending",
            SchedulerState::SearchPending => "search_pending",
            SchedulerState::Running => "running",
            SchedulerState::ShuttingDown => "shutting_down",
            SchedulerState::FinalSearchRunning => "final_search_running",
            SchedulerState::Done => "done",
        };
        f.write_str(s)
    }
}

// ============================================================================
// SchedulerCore
// ============================================================================

struct RunHandle {
    id: u64,
    is_final: bool,
    cancel: CancelFlag,
    thread: JoinHandle<RunReport>,
}

/// State shared between the scheduler and its run threads
struct SchedulerCore {
    gate: Mutex<ResultDeduplicator>,
    commit_trigger: PeriodicTrigger,
    search_trigger: PeriodicTrigger,
    searcher_active: AtomicBool,
    final_pending: AtomicBool,
    final_running: AtomicBool,
    shutting_down: AtomicBool,
    done: AtomicBool,
    next_run_id: AtomicU64,
    runs: Mutex<Vec<RunHandle>>,
    finished: Mutex<Vec<RunReport>>,
    search: SearchContext,
    statuses: Arc<IngestStatusTable>,
}

/// Held by a run from gate entry to exit. Dropping it finishes the run
/// before the ledger lock is released.
struct ActiveRun<'a> {
    core: &'a SchedulerCore,
    ledger: MutexGuard<'a, ResultDeduplicator>,
    is_final: bool,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        let core = self.core;
        if self.is_final {
            core.teardown_locked(&mut self.ledger);
        } else if !core.final_pending.load(Ordering::Acquire)
            && !core.shutting_down.load(Ordering::Acquire)
            && !core.done.load(Ordering::Acquire)
        {
            core.commit_trigger.arm();
            core.search_trigger.arm();
        }
        core.searcher_active.store(false, Ordering::Release);
    }
}

impl SchedulerCore {
    fn enter_gate(&self, is_final: bool) -> ActiveRun<'_> {
        let ledger = self.gate.lock();
        self.searcher_active.store(true, Ordering::Release);
        if is_final {
            self.final_pending.store(false, Ordering::Release);
            self.final_running.store(true, Ordering::Release);
        }
        self.commit_trigger.disarm();
        self.search_trigger.disarm();
        self.search_trigger.clear();
        ActiveRun {
            core: self,
            ledger,
            is_final,
        }
    }

    fn run(&self, run: SearcherRun) -> RunReport {
        let started = Instant::now();
        let mut active = self.enter_gate(run.is_final);
        if !run.is_final && self.is_finishing() {
            info!(
                target: "keyhunt::search",
                job_id = %self.search.job_id,
                run_id = run.id,
                "Final search launched, skipping search run"
            );
            drop(active);
            let report = RunReport::cancelled(run.id, started.elapsed());
            log_report(&self.search.job_id, &report);
            return report;
        }
        info!(
            target: "keyhunt::search",
            job_id = %self.search.job_id,
            run_id = run.id,
            is_final = run.is_final,
            lists = run.lists.len(),
            "Search run started"
        );
        let report = run.execute(&self.search, &mut active.ledger, started);
        drop(active);
        log_report(&self.search.job_id, &report);
        report
    }

    /// True once the final run was launched or per-job state is gone
    fn is_finishing(&self) -> bool {
        self.final_pending.load(Ordering::Acquire) || self.done.load(Ordering::Acquire)
    }

    fn teardown_locked(&self, ledger: &mut ResultDeduplicator) {
        ledger.clear();
        self.search.data_sources.clear();
        self.statuses.clear();
        self.commit_trigger.stop();
        self.search_trigger.stop();
        self.commit_trigger.clear();
        self.search_trigger.clear();
        self.final_running.store(false, Ordering::Release);
        self.done.store(true, Ordering::Release);
        info!(target: "keyhunt::search", job_id = %self.search.job_id, "Search state released");
    }

    /// Join finished (or, with `block`, all) run threads
    fn reap(&self, block: bool) {
        let pending: Vec<RunHandle> = {
            let mut runs = self.runs.lock();
            if block {
                runs.drain(..).collect()
            } else {
                let (done, running): (Vec<_>, Vec<_>) =
                    runs.drain(..).partition(|h| h.thread.is_finished());
                *runs = running;
                done
            }
        };

        for handle in pending {
            let report = match handle.thread.join() {
                Ok(report) => report,
                Err(_) => {
                    error!(
                        target: "keyhunt::search",
                        job_id = %self.search.job_id,
                        run_id = handle.id,
                        "Search run panicked"
                    );
                    self.search.post(
                        MessageKind::Error,
                        "Keyword search run failed",
                        format!("Search run {} stopped unexpectedly. Results may be incomplete.", handle.id),
                    );
                    RunReport::aborted(handle.id, handle.is_final)
                }
            };
            self.finished.lock().push(report);
        }
    }
}

// ============================================================================
// SearchScheduler
// ============================================================================

/// Owns the triggers, the gate and the run threads of one job
pub struct SearchScheduler {
    core: Arc<SchedulerCore>,
}

impl SearchScheduler {
    pub(crate) fn new(
        commit_interval: Duration,
        search_interval: Duration,
        search: SearchContext,
        statuses: Arc<IngestStatusTable>,
    ) -> Self {
        Self {
            core: Arc::new(SchedulerCore {
                gate: Mutex::new(ResultDeduplicator::new()),
                commit_trigger: PeriodicTrigger::new("commit", commit_interval),
                search_trigger: PeriodicTrigger::new("search", search_interval),
                searcher_active: AtomicBool::new(false),
                final_pending: AtomicBool::new(false),
                final_running: AtomicBool::new(false),
                shutting_down: AtomicBool::new(false),
                done: AtomicBool::new(false),
                next_run_id: AtomicU64::new(1),
                runs: Mutex::new(Vec::new()),
                finished: Mutex::new(Vec::new()),
                search,
                statuses,
            }),
        }
    }

    /// Start both timer threads and arm them
    pub fn start(&self) -> std::io::Result<()> {
        self.core.commit_trigger.start()?;
        self.core.search_trigger.start()?;
        self.core.commit_trigger.arm();
        self.core.search_trigger.arm();
        info!(
            target: "keyhunt::trigger",
            job_id = %self.core.search.job_id,
            commit_ms = self.core.commit_trigger.period().as_millis() as u64,
            search_ms = self.core.search_trigger.period().as_millis() as u64,
            "Timers started"
        );
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> SchedulerState {
        let core = &self.core;
        if core.done.load(Ordering::Acquire) {
            SchedulerState::Done
        } else if core.final_running.load(Ordering::Acquire) {
            SchedulerState::FinalSearchRunning
        } else if core.shutting_down.load(Ordering::Acquire) {
            SchedulerState::ShuttingDown
        } else if core.searcher_active.load(Ordering::Acquire) {
            SchedulerState::Running
        } else if core.commit_trigger.is_due() {
            SchedulerState::CommitPending
        } else if core.search_trigger.is_due() {
            SchedulerState::SearchPending
        } else {
            SchedulerState::Idle
        }
    }

    /// Lower the commit-due flag, returning whether it was raised
    pub fn take_commit_due(&self) -> bool {
        self.core.commit_trigger.take()
    }

    /// Raise commit-due now
    pub fn mark_commit_due(&self) {
        self.core.commit_trigger.fire();
    }

    /// Raise search-due now
    pub fn mark_search_due(&self) {
        self.core.search_trigger.fire();
    }

    /// True if search-due is raised
    pub fn is_search_due(&self) -> bool {
        self.core.search_trigger.is_due()
    }

    /// True while a run holds the gate
    pub fn is_searcher_active(&self) -> bool {
        self.core.searcher_active.load(Ordering::Acquire)
    }

    /// True once shutdown started
    pub fn is_shutting_down(&self) -> bool {
        self.core.shutting_down.load(Ordering::Acquire)
    }

    /// True if a timer-driven run may launch now
    pub fn should_launch(&self) -> bool {
        self.is_search_due() && !self.is_searcher_active() && !self.is_shutting_down()
    }

    /// Launch a run over `lists` on a new thread and return its id.
    ///
    /// The run blocks on its own thread until the gate is free.
    pub fn launch(&self, lists: Vec<KeywordList>, is_final: bool) -> std::io::Result<u64> {
        self.core.reap(false);

        let id = self.core.next_run_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancelFlag::new();
        let run = SearcherRun {
            id,
            is_final,
            lists,
            cancel: cancel.clone(),
        };
        if is_final {
            self.core.final_pending.store(true, Ordering::Release);
        }

        let core = Arc::clone(&self.core);
        let spawned = thread::Builder::new()
            .name(format!("keyhunt-searcher-{}", id))
            .spawn(move || core.run(run));

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                if is_final {
                    self.core.final_pending.store(false, Ordering::Release);
                }
                return Err(e);
            }
        };

        self.core.runs.lock().push(RunHandle {
            id,
            is_final,
            cancel,
            thread,
        });
        info!(
            target: "keyhunt::search",
            job_id = %self.core.search.job_id,
            run_id = id,
            is_final,
            "Search run launched"
        );
        Ok(id)
    }

    /// Stop timer-driven work: no more launches, triggers disarmed
    pub fn begin_shutdown(&self) {
        self.core.shutting_down.store(true, Ordering::Release);
        self.core.commit_trigger.disarm();
        self.core.search_trigger.disarm();
        self.core.commit_trigger.clear();
        self.core.search_trigger.clear();
    }

    /// Request cancellation of every non-final run. Returns how many were
    /// signalled.
    pub fn cancel_active(&self) -> usize {
        let runs = self.core.runs.lock();
        let mut cancelled = 0;
        for handle in runs.iter().filter(|h| !h.is_final && !h.thread.is_finished()) {
            handle.cancel.cancel();
            cancelled += 1;
        }
        cancelled
    }

    /// Release per-job state now, waiting for the gate if a run holds it
    pub fn teardown(&self) {
        if self.core.done.load(Ordering::Acquire) {
            return;
        }
        let mut ledger = self.core.gate.lock();
        self.core.teardown_locked(&mut ledger);
    }

    /// True once per-job state was released
    pub fn is_done(&self) -> bool {
        self.core.done.load(Ordering::Acquire)
    }

    /// Join every launched run and return the reports not yet returned,
    /// ordered by run id
    pub fn wait_for_runs(&self) -> Vec<RunReport> {
        self.core.reap(true);
        let mut reports = std::mem::take(&mut *self.core.finished.lock());
        reports.sort_by_key(|r| r.run_id);
        reports
    }

    /// Reported (keyword, file) pairs in the ledger; waits for the gate
    pub fn reported_count(&self) -> usize {
        self.core.gate.lock().reported_count()
    }
}

impl fmt::Debug for SearchScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchScheduler")
            .field("job_id", &self.core.search.job_id)
            .field("state", &self.state())
            .finish()
    }
}
