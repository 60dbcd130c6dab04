use schemefs_logger::{LevelFilter, Logger, Rotation};
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn file_output_creates_log_files() {
    let tmp = tempdir().expect("temp dir");
    let log_dir = tmp.path().join("logs");

    let logger = Logger::builder()
        .name("schemefs-file")
        .console(false)
        .level(LevelFilter::DEBUG)
        .file(&log_dir)
        .file_options(Rotation::NEVER, 2, true)
        .init()
        .expect("logger init");
    assert!(logger.writes_files());

    tracing::info!(scheme = "app", "registered");
    std::thread::sleep(Duration::from_millis(20));
    drop(logger);

    let has_log = std::fs::read_dir(&log_dir)
        .expect("log dir exists")
        .flatten()
        .any(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("log"));
    assert!(has_log, "expected a .log file in {}", log_dir.display());
}
