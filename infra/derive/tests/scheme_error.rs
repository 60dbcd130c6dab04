use schemefs_derive::scheme_error;
use std::borrow::Cow;

#[scheme_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn failing_io() -> Result<(), std::io::Error> {
    Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))
}

#[test]
fn scheme_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/scheme_error_pass.rs");
    t.compile_fail("tests/ui/*_fail.rs");
}

#[test]
fn question_mark_converts_source_errors() {
    fn run() -> Result<(), DemoError> {
        failing_io()?;
        Ok(())
    }

    let err = run().expect_err("io failure should propagate");
    assert!(matches!(err, DemoError::Io { context: None, .. }));
    assert_eq!(err.to_string(), "IO error: gone");
}

#[test]
fn context_annotates_source_and_own_errors() {
    let err = failing_io().context("reading index").expect_err("should fail");
    assert_eq!(err.to_string(), "IO error (reading index): gone");

    let own: Result<(), DemoError> =
        Err(DemoError::Rejected { message: "outside root".into(), context: None });
    let err = own.context("bundle").expect_err("should fail");
    assert_eq!(err.to_string(), "Rejected (bundle): outside root");
}
