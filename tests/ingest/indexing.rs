//! Per-file indexing decisions as seen through the controller

use crate::common::*;
use keyhunt::AlertLevel;

fn statuses(t: &TestJob, files: &[FileRecord]) -> Vec<IngestStatus> {
    files.iter().map(|f| t.job.process(f)).collect()
}

#[test]
fn test_each_file_kind_gets_the_expected_status() {
    let t = TestJob::started(vec![foo_bar_list()]);

    let files = vec![
        text_file(1, "plain foo text"),
        FileRecord::new(2, 1, "page.html", b"<html><body><p>foo</p></body></html>".to_vec()),
        FileRecord::new(3, 1, "bundle.zip", b"PK\x03\x04foo inside".to_vec()),
        FileRecord::new(4, 1, "photos", Vec::<u8>::new()).with_kind(FileKind::Directory),
        FileRecord::new(5, 1, "$OrphanFiles", Vec::<u8>::new()).with_kind(FileKind::VirtualDirectory),
        FileRecord::new(6, 1, "Unalloc_1_0_4096", b"\x00\x00deleted foo note\x00".to_vec())
            .with_kind(FileKind::UnallocatedBlocks),
        FileRecord::new(7, 1, "empty.txt", Vec::<u8>::new()),
        FileRecord::new(8, 1, "blob.bin", b"\x00\x01\x02secret foo value\xff\xfe".to_vec()),
        text_file(9, "known foo").with_known(KnownState::Known),
    ];

    assert_eq!(
        statuses(&t, &files),
        vec![
            IngestStatus::TextIndexed,
            IngestStatus::TextIndexed,
            IngestStatus::MetadataIndexed,
            IngestStatus::MetadataIndexed,
            IngestStatus::MetadataIndexed,
            IngestStatus::StringsIndexed,
            IngestStatus::MetadataIndexed,
            IngestStatus::StringsIndexed,
            IngestStatus::MetadataIndexed,
        ]
    );

    let summary = t.job.summary();
    assert_eq!(summary.text_indexed, 2);
    assert_eq!(summary.strings_indexed, 2);
    assert_eq!(summary.metadata_indexed, 5);
    assert_eq!(summary.total(), 9);
    assert!(summary.alert().is_none());
}

#[test]
fn test_content_reaches_the_index_only_where_extracted() {
    let t = TestJob::started(vec![foo_bar_list()]);

    t.job.process(&text_file(1, "foo"));
    t.job
        .process(&FileRecord::new(2, 1, "page.html", b"<p>foo</p>".to_vec()));
    t.job
        .process(&FileRecord::new(3, 1, "bundle.zip", b"PK\x03\x04foo".to_vec()));
    t.job.process(
        &FileRecord::new(4, 1, "Unalloc_1", b"\x00\x00loose foo bytes\x00".to_vec())
            .with_kind(FileKind::UnallocatedBlocks),
    );
    t.job.process(&text_file(5, "foo").with_known(KnownState::Known));

    t.job.shut_down(false).unwrap();
    t.job.wait_for_searchers();

    let mut files = t.artifacts.files_for_term("foo");
    files.sort();
    // archive members and known files are not searchable by content
    assert_eq!(files, vec![FileId(1), FileId(2), FileId(4)]);
}

#[test]
fn test_file_processed_twice_keeps_first_status() {
    let t = TestJob::started(vec![foo_bar_list()]);
    let file = text_file(1, "foo");
    assert_eq!(t.job.process(&file), IngestStatus::TextIndexed);

    t.index.inner.set_available(false);
    assert_eq!(t.job.process(&file), IngestStatus::SkippedIndexError);
    t.index.inner.set_available(true);

    assert_eq!(t.job.status_of(FileId(1)), Some(IngestStatus::TextIndexed));
    assert_eq!(t.job.summary().total(), 1);
}

#[test]
fn test_index_failures_are_counted_and_alerted() {
    let t = TestJob::started(vec![foo_bar_list()]);
    t.job.process(&text_file(1, "foo"));

    t.index.inner.set_available(false);
    t.job.process(&text_file(2, "bar"));
    t.job.process(&text_file(3, "baz"));
    t.index.inner.set_available(true);

    let summary = t.job.summary();
    assert_eq!(summary.text_indexed, 1);
    assert_eq!(summary.index_errors, 2);

    t.job.shut_down(false).unwrap();
    t.job.wait_for_searchers();

    assert_eq!(t.sink.summaries(), vec![summary]);
    let alerts = t.sink.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].0, AlertLevel::Error);
    assert_eq!(alerts[0].1, "Keyword Indexing Errors");
}

#[test]
fn test_files_without_data_source_are_still_indexed() {
    let t = TestJob::started(vec![foo_bar_list()]);
    let orphan = text_file(1, "foo").without_data_source();
    assert_eq!(t.job.process(&orphan), IngestStatus::TextIndexed);
    assert_eq!(t.job.data_source_count(), 0);
}
