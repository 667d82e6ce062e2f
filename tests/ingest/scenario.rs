//! Repeated searches over a growing index report each hit once

use crate::common::*;

#[test]
fn test_three_runs_report_only_new_hits() {
    let t = TestJob::started(vec![foo_bar_list()]);

    // nothing indexed yet
    let reports = t.search_round(&text_file(100, "nothing here"));
    assert_eq!(reports.len(), 1);
    assert_eq!(new_hits(&reports), 0);

    for id in 1..=3 {
        t.job.process(&text_file(id, "a foo line"));
    }

    // first run: all three foo files are new
    let reports = t.search_round(&text_file(101, "filler"));
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].outcome, RunOutcome::Completed);
    assert_eq!(reports[0].keywords_searched, 2);
    assert_eq!(new_hits(&reports), 3);
    assert_eq!(t.artifacts.files_for_term("foo"), vec![FileId(1), FileId(2), FileId(3)]);

    // second run, unchanged index: nothing new
    let reports = t.search_round(&text_file(102, "filler"));
    assert_eq!(new_hits(&reports), 0);

    // third run after one more foo file
    t.job.process(&text_file(4, "more foo"));
    let reports = t.search_round(&text_file(103, "filler"));
    assert_eq!(new_hits(&reports), 1);
    assert_eq!(t.artifacts.files_for_term("foo").len(), 4);
    assert_eq!(t.artifacts.files_for_term("foo")[3], FileId(4));

    let hit_messages = t.sink.messages_of(MessageKind::Data);
    assert_eq!(hit_messages.len(), 4);
    assert!(hit_messages.iter().all(|m| m.subject == "Keyword hit: foo"));
    assert!(hit_messages.iter().all(|m| m.artifact.is_some()));

    t.job.shut_down(false).unwrap();
    let final_reports = t.job.wait_for_searchers();
    assert_eq!(final_reports.len(), 1);
    assert!(final_reports[0].is_final);
    assert_eq!(final_reports[0].new_hits, 0);
    assert_eq!(t.job.state(), SchedulerState::Done);
}

#[test]
fn test_regex_terms_reported_individually() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "bar"));
    t.job.process(&text_file(2, "baz and bar"));

    let reports = t.search_round(&text_file(100, "filler"));
    // bar in files 1 and 2, baz in file 2
    assert_eq!(new_hits(&reports), 3);
    let subjects: Vec<String> = t
        .sink
        .messages_of(MessageKind::Data)
        .into_iter()
        .map(|m| m.subject)
        .collect();
    assert!(subjects.contains(&"Regexp hit: bar".to_string()));
    assert!(subjects.contains(&"Regexp hit: baz".to_string()));

    // a new term from an already-searched regex is new on its own
    t.job.process(&text_file(3, "bat"));
    let reports = t.search_round(&text_file(101, "filler"));
    assert_eq!(new_hits(&reports), 1);
    assert_eq!(t.artifacts.files_for_term("bat"), vec![FileId(3)]);
}

#[test]
fn test_final_run_picks_up_last_files() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo"));
    t.job.process(&text_file(2, "foo"));
    t.job.shut_down(false).unwrap();

    let reports = t.job.wait_for_searchers();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_final);
    assert_eq!(reports[0].new_hits, 2);
    assert_eq!(t.job.state(), SchedulerState::Done);
    // teardown cleared per-job state
    assert_eq!(t.job.status_of(FileId(1)), None);
    assert_eq!(t.job.data_source_count(), 0);
}

#[test]
fn test_other_data_sources_never_reported() {
    let t = TestJob::started(vec![foo_bar_list()]);
    // a file from a data source of an earlier job, already in the index
    let earlier = FileRecord::new(50, 9, "old.txt", b"foo".to_vec());
    t.index
        .inner
        .add_document(Document::chunk(&earlier, 1, "foo".to_string()))
        .unwrap();

    t.job.process(&text_file(1, "foo"));
    let reports = t.search_round(&text_file(100, "filler"));
    assert_eq!(new_hits(&reports), 1);
    assert_eq!(t.artifacts.files_for_term("foo"), vec![FileId(1)]);
}

#[test]
fn test_list_edits_apply_to_next_run() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo qux"));
    let reports = t.search_round(&text_file(100, "filler"));
    assert_eq!(new_hits(&reports), 1);

    t.lists.add_keyword("L", Keyword::literal("qux"));
    let reports = t.search_round(&text_file(101, "filler"));
    assert_eq!(reports[0].keywords_searched, 3);
    assert_eq!(new_hits(&reports), 1);
    assert_eq!(t.artifacts.files_for_term("qux"), vec![FileId(1)]);
}

#[test]
fn test_quiet_list_writes_artifacts_without_messages() {
    let quiet = KeywordList::new("quiet", vec![Keyword::literal("foo")], false);
    let t = TestJob::started(vec![quiet]);
    t.job.process(&text_file(1, "foo"));
    let reports = t.search_round(&text_file(100, "filler"));
    assert_eq!(new_hits(&reports), 1);
    assert!(t.sink.messages_of(MessageKind::Data).is_empty());
    assert_eq!(t.sink.artifact_batches(), vec![1]);
}

#[test]
fn test_failed_artifact_write_is_reported_later() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo"));
    t.artifacts.set_failing(true);
    let reports = t.search_round(&text_file(100, "filler"));
    assert_eq!(reports[0].outcome, RunOutcome::Completed);
    assert_eq!(new_hits(&reports), 0);
    assert!(t.sink.messages_of(MessageKind::Data).is_empty());

    // the hit was never persisted, so the next run reports it
    t.artifacts.set_failing(false);
    let reports = t.search_round(&text_file(101, "filler"));
    assert_eq!(new_hits(&reports), 1);
    assert_eq!(t.sink.messages_of(MessageKind::Data).len(), 1);
}
