//! Configuration file handling and timer-driven searching

use crate::common::*;
use keyhunt::{Error, UpdateFrequency, CONFIG_FILE_NAME};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_intervals_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        "update_frequency = \"slowest\"\nsearch_interval_ms = 250\n",
    )
    .unwrap();

    let config = IngestConfig::from_file(&path).unwrap();
    assert_eq!(config.update_frequency, UpdateFrequency::Slowest);
    assert!(config.skip_known_files);

    let t = TestJob::with_config(config, vec![foo_bar_list()]);
    assert_eq!(t.job.config().commit_interval(), Duration::from_secs(60));
    assert_eq!(t.job.config().search_interval(), Duration::from_millis(250));
}

#[test]
fn test_default_file_written_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    IngestConfig::write_default_if_missing(&path).unwrap();
    let config = IngestConfig::from_file(&path).unwrap();
    assert_eq!(config, IngestConfig::default());
    assert_eq!(config.commit_interval(), Duration::from_secs(300));

    std::fs::write(&path, "update_frequency = \"fast\"\n").unwrap();
    IngestConfig::write_default_if_missing(&path).unwrap();
    let config = IngestConfig::from_file(&path).unwrap();
    assert_eq!(config.update_frequency, UpdateFrequency::Fast);
}

#[test]
fn test_bad_config_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    std::fs::write(&path, "update_frequency = \"sometimes\"\n").unwrap();
    assert!(matches!(IngestConfig::from_file(&path), Err(Error::Config(_))));

    std::fs::write(&path, "commit_interval_ms = 0\n").unwrap();
    assert!(matches!(IngestConfig::from_file(&path), Err(Error::Config(_))));

    let missing = dir.path().join("missing.toml");
    assert!(matches!(IngestConfig::from_file(&missing), Err(Error::Config(_))));
}

#[test]
fn test_skip_known_files_setting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    let mut config = IngestConfig::with_intervals(LONG, LONG);
    config.skip_known_files = false;
    config.write_to_file(&path).unwrap();

    let t = TestJob::with_config(IngestConfig::from_file(&path).unwrap(), vec![foo_bar_list()]);
    t.job.start_up().unwrap();
    let known = text_file(1, "foo").with_known(KnownState::Known);
    assert_eq!(t.job.process(&known), IngestStatus::TextIndexed);
}

#[test]
fn test_timers_find_hits_without_help() {
    let config = IngestConfig::with_intervals(Duration::from_millis(5), Duration::from_millis(5));
    let t = TestJob::with_config(config, vec![foo_bar_list()]);
    t.job.start_up().unwrap();

    t.job.process(&text_file(1, "foo"));
    // keep the ingest thread polling so the commit-due flag gets taken
    let mut next = 100;
    let found = wait_until(Duration::from_secs(10), || {
        t.job.process(&text_file(next, "filler"));
        next += 1;
        !t.artifacts.is_empty()
    });
    assert!(found);

    t.job.shut_down(false).unwrap();
    let reports = t.job.wait_for_searchers();
    assert!(reports.len() >= 2);
    assert_eq!(new_hits(&reports), 1);
    assert_eq!(t.artifacts.files_for_term("foo"), vec![FileId(1)]);
    assert!(t.index.commit_count() >= 2);
}
