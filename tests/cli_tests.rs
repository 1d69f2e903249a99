// tests/cli_tests.rs
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_pipeline_from_arguments() {
    let mut cmd = Command::cargo_bin("terane-run").unwrap();
    cmd.arg("stdin_source")
        .arg("origin='cli'")
        .arg("|")
        .arg("debug_sink")
        .write_stdin("hello\nworld\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("  message = 'hello'"))
        .stdout(predicate::str::contains("  origin = 'cli'"))
        .stdout(predicate::str::contains("  message = 'world'"));
}

#[test]
fn test_pipeline_from_config_file() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(
        config,
        "run:\n  pipeline: 'stdin_source | enrich fieldname=\"env\" fieldtype=\"literal\" value=\"prod\" | debug_sink format=\"json\"'"
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("terane-run").unwrap();
    cmd.arg("-c")
        .arg(config.path())
        .write_stdin("one line\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"name":"env","type":"LITERAL","value":"prod"}"#,
        ));
}

#[test]
fn test_missing_pipeline_is_an_error() {
    let mut cmd = Command::cargo_bin("terane-run").unwrap();
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("terane-run: no pipeline was specified"));
}

#[test]
fn test_build_errors_exit_with_one() {
    let mut cmd = Command::cargo_bin("terane-run").unwrap();
    cmd.arg("stdin_source | nowhere_sink")
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no plugin named 'nowhere_sink'"));

    let mut cmd = Command::cargo_bin("terane-run").unwrap();
    cmd.arg("only_one_node")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("at least one source and one sink"));
}

#[test]
fn test_dropped_events_are_not_errors() {
    let mut cmd = Command::cargo_bin("terane-run").unwrap();
    cmd.arg("stdin_source | syslog_format | debug_sink")
        .write_stdin("this is not syslog\n")
        .assert()
        .success()
        .stdout("");
}
