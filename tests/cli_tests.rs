//! CLI Integration Tests
//!
//! Runs the `sheetload` binary against a scratch SQLite database.

#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

mod common;

use assert_cmd::Command;
use common::{sales_q1_sheets, sheet, TestWorkspace, SALES_HEADERS};
use predicates::prelude::*;

fn sheetload(ws: &TestWorkspace) -> Command {
    let mut cmd = Command::cargo_bin("sheetload").unwrap();
    cmd.env("SHEETLOAD_DATABASE_URL", ws.database_url())
        .env_remove("SHEETLOAD_CONFIG")
        .env_remove("SHEETLOAD_MAX_UPLOAD_BYTES")
        .env("NO_COLOR", "1");
    cmd
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("sheetload").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sheetload"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("sheetload").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_ingest_requires_a_file() {
    let ws = TestWorkspace::new();
    sheetload(&ws).arg("ingest").assert().failure();
}

#[test]
fn test_server_help() {
    let mut cmd = Command::cargo_bin("sheetload-server").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("/api/v1/upload"));
}

// ═══════════════════════════════════════════════════════════════════════════
// INGEST
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_ingest_success() {
    let ws = TestWorkspace::new();
    let path = ws.write_workbook("Sales_Q1_2025.xlsx", &sales_q1_sheets());

    sheetload(&ws)
        .arg("ingest")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("sales_q1_2025"))
        .stdout(predicate::str::contains("All workbooks ingested"));
}

#[test]
fn test_ingest_mismatch_fails_and_lists_sheet() {
    let ws = TestWorkspace::new();
    let path = ws.write_workbook(
        "Sales_Q1_2025.xlsx",
        &[
            sheet("Q1-Central", SALES_HEADERS, &[&["D1", "1", ""]]),
            sheet("Q1-NW", &["Dealer", "Sales", "Region", "Bonus"], &[&["D2", "2", "", "3"]]),
        ],
    );

    sheetload(&ws)
        .arg("ingest")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Ingestion failed"))
        .stdout(predicate::str::contains("Q1-NW"));
}

#[test]
fn test_ingest_oversized_rejected() {
    let ws = TestWorkspace::new();
    let path = ws.write_workbook("Sales_Q1_2025.xlsx", &sales_q1_sheets());

    sheetload(&ws)
        .args(["--max-upload-bytes", "64", "ingest"])
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Rejected"));
}

// ═══════════════════════════════════════════════════════════════════════════
// CATALOG COMMANDS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_list_describe_export_drop() {
    let ws = TestWorkspace::new();
    let path = ws.write_workbook("Sales_Q1_2025.xlsx", &sales_q1_sheets());
    sheetload(&ws).arg("ingest").arg(&path).assert().success();

    sheetload(&ws)
        .args(["list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"table_name\": \"sales_q1_2025\""));

    sheetload(&ws)
        .args(["describe", "sales_q1_2025"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dealer"))
        .stdout(predicate::str::contains("region"));

    let output = ws.path().join("export.xlsx");
    sheetload(&ws)
        .args(["export", "sales_q1_2025", "-o"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 rows"));
    assert!(output.exists());

    sheetload(&ws)
        .args(["drop", "sales_q1_2025"])
        .assert()
        .success();

    sheetload(&ws)
        .args(["describe", "sales_q1_2025"])
        .assert()
        .failure();
}

#[test]
fn test_list_empty_database() {
    let ws = TestWorkspace::new();
    sheetload(&ws)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No ingested tables"));
}
