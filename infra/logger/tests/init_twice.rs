use schemefs_logger::{LevelFilter, Logger, LoggerError};

#[test]
fn second_init_is_rejected() {
    let _logger = Logger::builder()
        .name("schemefs-init-twice")
        .level(LevelFilter::INFO)
        .init()
        .expect("first init should succeed");

    let err = Logger::builder()
        .name("schemefs-init-twice-again")
        .init()
        .expect_err("second init should fail");

    assert!(matches!(err, LoggerError::Subscriber { .. }), "got {err:?}");
}
