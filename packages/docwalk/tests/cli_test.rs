//! Tests for the docwalk binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn docwalk() -> Command {
    let mut cmd = Command::cargo_bin("docwalk").unwrap();
    cmd.env_remove("DOCWALK_PLUGIN_DIR").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_formats_lists_builtin_decoders() {
    docwalk()
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("mbox"))
        .stdout(predicate::str::contains("eml, msg822"));
}

#[test]
fn test_extract_to_stdout_with_subject_filter() {
    docwalk()
        .arg("extract")
        .arg(fixture("inbox.mbox"))
        .arg(fixture("notes.txt"))
        .args(["--skip-subject", "^Report$"])
        .assert()
        .success()
        .stdout("Hello A\nHello B\nMeeting notes\nBudget approved.\n");
}

#[test]
fn test_extract_date_window() {
    docwalk()
        .arg("extract")
        .arg(fixture("inbox.mbox"))
        .args(["--after", "2024-01-20"])
        .assert()
        .success()
        .stdout("Hello B\n");
}

#[test]
fn test_max_headers_spans_files() {
    docwalk()
        .arg("extract")
        .arg(fixture("inbox.mbox"))
        .arg(fixture("inbox.mbox"))
        .args(["--skip-subject", "Report", "--max-headers", "3"])
        .assert()
        .success()
        .stdout("Hello A\nHello B\nHello A\n");
}

#[test]
fn test_html_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("inbox.html");

    docwalk()
        .arg("extract")
        .arg(fixture("inbox.mbox"))
        .args(["--format", "html", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved to:"));

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h2>Hello A</h2>"));
    assert!(html.ends_with("</html>\n"));
}

#[test]
fn test_unsupported_file_fails() {
    docwalk()
        .args(["extract", "scan.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Format not supported: 'scan.pdf'"))
        .stderr(predicate::str::contains("text, xml, mail, mbox, zip"));
}

#[test]
fn test_invalid_date_fails() {
    docwalk()
        .arg("extract")
        .arg(fixture("inbox.mbox"))
        .args(["--before", "31-01-2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date format"));
}

#[test]
fn test_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    docwalk()
        .arg("extract")
        .arg(dir.path().join("absent.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}
