//! End-to-end tests for the uls-ingest binary
//!
//! These tests validate:
//! - Schema initialisation
//! - Ingest runs over files and directories
//! - Exit codes for success, failure and usage errors
//! - Stats output as tables and JSON

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const LICENSE_LINE: &str = "HD|1001|||W1AW|A|HA|01/15/2020|01/15/2030";
const ENTITY_LINE: &str = "EN|1001|||W1AW|L|L00100001|ARRL HQ OPERATORS CLUB";

fn uls_ingest(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("uls-ingest").unwrap();
    cmd.current_dir(dir)
        .env_remove("ULS_DATABASE_PATH")
        .env_remove("ULS_BATCH_SIZE")
        .env_remove("ULS_DELIMITER")
        .env("LOG_LEVEL", "warn")
        .arg("--database")
        .arg(dir.join("uls.db"));
    cmd
}

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

// ============================================================================
// init
// ============================================================================

#[test]
fn test_init_creates_database() {
    let dir = TempDir::new().unwrap();

    uls_ingest(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialised"));

    assert!(dir.path().join("uls.db").exists());

    // Idempotent
    uls_ingest(dir.path()).arg("init").assert().success();
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_directory_prints_summary() {
    let dir = TempDir::new().unwrap();
    let extract = dir.path().join("extract");
    std::fs::create_dir(&extract).unwrap();
    write(&extract, "HD.dat", &format!("{LICENSE_LINE}\n{LICENSE_LINE}\n"));
    write(&extract, "EN.dat", &format!("{ENTITY_LINE}\n\n"));

    uls_ingest(dir.path())
        .arg("run")
        .arg(&extract)
        .assert()
        .success()
        .stdout(predicate::str::contains("licenses"))
        .stdout(predicate::str::contains("entities"))
        .stdout(predicate::str::contains("3 row(s) inserted"));
}

#[test]
fn test_run_with_forced_type_and_delimiter() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "extract.txt", "AP\t1\t\t\tW1AW\tNE\n");

    uls_ingest(dir.path())
        .args(["run", "--type", "AP", "--delimiter", "\\t", "extract.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 row(s) inserted"));
}

#[test]
fn test_run_only_missing_files_fails() {
    let dir = TempDir::new().unwrap();

    uls_ingest(dir.path())
        .args(["run", "HD.dat"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no file could be processed"));
}

#[test]
fn test_run_partial_failure_still_succeeds() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "HD.dat", &format!("{LICENSE_LINE}\n"));

    uls_ingest(dir.path())
        .args(["run", "HD.dat", "FR.dat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with warnings"));
}

#[test]
fn test_unclassifiable_file_is_usage_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "extract.dat", "HD|1\n");

    uls_ingest(dir.path())
        .args(["run", "extract.dat"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Cannot classify"));
}

#[test]
fn test_invalid_batch_size_is_usage_error() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "HD.dat", &format!("{LICENSE_LINE}\n"));

    uls_ingest(dir.path())
        .args(["run", "--batch-size", "0", "HD.dat"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("batch size"));
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    Command::cargo_bin("uls-ingest").unwrap().assert().code(2);
}

// ============================================================================
// stats
// ============================================================================

#[test]
fn test_stats_after_run() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "HD.dat", &format!("{LICENSE_LINE}\n"));

    uls_ingest(dir.path()).args(["run", "HD.dat"]).assert().success();

    uls_ingest(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("licenses"))
        .stdout(predicate::str::contains("HD.dat"));

    let output = uls_ingest(dir.path())
        .args(["stats", "--json", "--limit", "5"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let licenses = stats["tables"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["table"] == "licenses")
        .unwrap();
    assert_eq!(licenses["rows"], 1);
    assert_eq!(stats["recent_audits"][0]["file_type"], "HD");
    assert_eq!(stats["recent_audits"][0]["records_processed"], 1);
}

#[test]
fn test_stats_without_database() {
    let dir = TempDir::new().unwrap();

    uls_ingest(dir.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("uls-ingest init"));
}
