//! Cancelled shutdown: active runs stop, one commit, no final search

use crate::common::*;
use std::thread;
use std::time::Duration;

#[test]
fn test_cancel_during_active_run() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo"));

    t.index.hold_queries();
    t.process_with_search(&text_file(100, "filler"));
    assert!(wait_until(Duration::from_secs(5), || t.index.waiting() == 1));
    t.job.process(&text_file(2, "foo bar"));
    assert_eq!(t.index.commit_count(), 1);

    thread::scope(|s| {
        // teardown waits for the run to leave the gate
        let shutdown = s.spawn(|| t.job.shut_down(true));
        assert!(wait_until(Duration::from_secs(5), || t.index.commit_count() == 2));
        assert_eq!(t.job.state(), SchedulerState::ShuttingDown);
        t.index.release_queries();
        shutdown.join().unwrap().unwrap();
    });

    let reports = t.job.wait_for_searchers();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, RunOutcome::Cancelled);
    assert!(!reports[0].is_final);
    assert_eq!(reports[0].new_hits, 0);

    assert_eq!(t.job.state(), SchedulerState::Done);
    assert_eq!(t.index.commit_count(), 2);
    assert_eq!(t.index.query_count(), 1);
    assert!(t.artifacts.is_empty());
    assert!(t.sink.summaries().is_empty());
    assert_eq!(t.job.status_of(FileId(1)), None);
}

#[test]
fn test_cancel_stops_queued_runs_too() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo"));

    t.index.hold_queries();
    t.process_with_search(&text_file(100, "filler"));
    assert!(wait_until(Duration::from_secs(5), || t.index.waiting() == 1));
    t.job
        .scheduler()
        .launch(vec![foo_bar_list()], false)
        .unwrap();

    thread::scope(|s| {
        let shutdown = s.spawn(|| t.job.shut_down(true));
        assert!(wait_until(Duration::from_secs(5), || t.index.commit_count() == 2));
        t.index.release_queries();
        shutdown.join().unwrap().unwrap();
    });

    let reports = t.job.wait_for_searchers();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.outcome == RunOutcome::Cancelled));
    assert_eq!(new_hits(&reports), 0);
    // the queued run never got to query
    assert_eq!(t.index.query_count(), 1);
    assert_eq!(t.job.state(), SchedulerState::Done);
}

#[test]
fn test_cancel_without_active_run() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo"));

    t.job.shut_down(true).unwrap();

    assert!(t.job.wait_for_searchers().is_empty());
    assert_eq!(t.index.commit_count(), 1);
    assert_eq!(t.index.query_count(), 0);
    assert_eq!(t.job.state(), SchedulerState::Done);
    assert!(t.sink.summaries().is_empty());
}

#[test]
fn test_files_after_cancel_are_refused() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo"));
    t.job.shut_down(true).unwrap();
    let commits = t.index.commit_count();

    let status = t.process_with_search(&text_file(2, "foo"));
    assert_eq!(status, IngestStatus::SkippedIndexError);
    assert_eq!(t.job.status_of(FileId(2)), Some(IngestStatus::SkippedIndexError));
    assert_eq!(t.index.commit_count(), commits);
    assert_eq!(t.index.inner.pending_count(), 0);
    assert_eq!(t.job.data_source_count(), 0);
    assert!(t.job.wait_for_searchers().is_empty());
    assert!(t.artifacts.is_empty());
}
