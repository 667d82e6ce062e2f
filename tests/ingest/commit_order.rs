//! A run never sees an index older than the commit that launched it

use crate::common::*;

fn first_query(events: &[IndexEvent]) -> Option<usize> {
    events.iter().position(|e| matches!(e, IndexEvent::Query(_)))
}

#[test]
fn test_commit_precedes_first_query() {
    let t = TestJob::started(vec![foo_bar_list()]);
    for id in 1..=3 {
        t.job.process(&text_file(id, "foo"));
    }

    let reports = t.search_round(&text_file(100, "filler"));
    assert_eq!(new_hits(&reports), 3);

    let events = t.index.events();
    assert_eq!(events[0], IndexEvent::Commit(3));
    assert_eq!(first_query(&events), Some(1));
}

#[test]
fn test_file_carrying_the_commit_is_indexed_after_it() {
    let t = TestJob::started(vec![foo_bar_list()]);

    // commit and launch happen before file 5 is indexed
    let reports = t.search_round(&text_file(5, "foo"));
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].new_hits, 0);
    assert_eq!(t.index.events()[0], IndexEvent::Commit(0));

    let reports = t.search_round(&text_file(100, "filler"));
    assert_eq!(reports[0].new_hits, 1);
    assert_eq!(t.artifacts.files_for_term("foo"), vec![FileId(5)]);
}

#[test]
fn test_final_run_follows_shutdown_commit() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo"));
    t.job.process(&text_file(2, "bar"));

    t.job.shut_down(false).unwrap();
    let reports = t.job.wait_for_searchers();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_final);
    assert_eq!(reports[0].new_hits, 2);

    assert_eq!(
        t.index.events(),
        vec![
            IndexEvent::Commit(2),
            IndexEvent::Query("foo".to_string()),
            IndexEvent::Query("ba.*".to_string()),
        ]
    );
}

#[test]
fn test_every_query_has_a_commit_before_it() {
    let config = IngestConfig::with_intervals(
        std::time::Duration::from_millis(2),
        std::time::Duration::from_millis(2),
    );
    let t = TestJob::with_config(config, vec![foo_bar_list()]);
    t.job.start_up().unwrap();

    for id in 1..=100u64 {
        t.job.process(&text_file(id, "foo"));
        std::thread::sleep(std::time::Duration::from_micros(200));
    }
    t.job.shut_down(false).unwrap();
    t.job.wait_for_searchers();

    let events = t.index.events();
    let first_commit = events
        .iter()
        .position(|e| matches!(e, IndexEvent::Commit(_)));
    assert!(first_commit < first_query(&events));
    assert_eq!(t.artifacts.files_for_term("foo").len(), 100);
}
