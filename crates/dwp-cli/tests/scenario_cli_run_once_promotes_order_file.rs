//! Scenario: `dwp run-once` over a JSON order file
//!
//! GREEN when:
//! - due pending orders are rewritten as processing in the file
//! - --dry-run reports the same promotion but leaves the file untouched
//! - config-hash prints a stable hash line

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const ORDERS: &str = r#"[
  {"id": 1, "status": "pending", "delivery_date": "lundi 01 janvier 2024", "time_slot": "00:00 - 00:30"},
  {"id": 2, "status": "pending", "delivery_date": "jeudi 14 mars 2024", "time_slot": "09:00 - 09:30"},
  {"id": 3, "status": "pending"}
]"#;

const CONFIG: &str = "window:\n  timezone: UTC\n";

fn dwp() -> Command {
    let mut cmd = Command::cargo_bin("dwp").expect("dwp binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_fixture(dir: &tempfile::TempDir) -> (String, String) {
    let orders = dir.path().join("orders.json");
    let config = dir.path().join("promoter.yaml");
    fs::write(&orders, ORDERS).unwrap();
    fs::write(&config, CONFIG).unwrap();
    (
        orders.to_string_lossy().to_string(),
        config.to_string_lossy().to_string(),
    )
}

fn statuses(path: &str) -> Vec<String> {
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    v.as_array()
        .unwrap()
        .iter()
        .map(|o| o["status"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn run_once_rewrites_due_orders() {
    let dir = tempfile::tempdir().unwrap();
    let (orders, config) = write_fixture(&dir);

    dwp()
        .args([
            "run-once",
            "--orders",
            &orders,
            "--now",
            "2024-01-01T00:00:00Z",
            "--config",
            &config,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("inspected=3"))
        .stdout(predicate::str::contains("promoted=1"))
        .stdout(predicate::str::contains("order=1 action=promoted reason=within_window"))
        .stdout(predicate::str::contains("order=3 action=skipped reason=missing_delivery_date"));

    assert_eq!(statuses(&orders), vec!["processing", "pending", "pending"]);
}

#[test]
fn dry_run_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (orders, config) = write_fixture(&dir);
    let before = fs::read_to_string(&orders).unwrap();

    dwp()
        .args([
            "run-once",
            "--orders",
            &orders,
            "--now",
            "2024-01-01T00:00:00Z",
            "--config",
            &config,
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("dry_run=true"))
        .stdout(predicate::str::contains("promoted=1"));

    assert_eq!(fs::read_to_string(&orders).unwrap(), before);
}

#[test]
fn json_report_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let (orders, config) = write_fixture(&dir);

    let out = dwp()
        .args([
            "run-once",
            "--orders",
            &orders,
            "--now",
            "2024-01-01T00:00:00Z",
            "--config",
            &config,
            "--dry-run",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["promoted"], 1);
    assert_eq!(report["failure_policy"], "isolate");
    assert_eq!(report["outcomes"][1]["action"], "not_due");
}

#[test]
fn missing_order_file_fails() {
    dwp()
        .args(["run-once", "--orders", "/nonexistent/orders.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read order file"));
}

#[test]
fn config_hash_prints_hash_line() {
    let dir = tempfile::tempdir().unwrap();
    let (_, config) = write_fixture(&dir);

    dwp()
        .args(["config-hash", &config])
        .assert()
        .success()
        .stdout(predicate::str::is_match("config_hash=[0-9a-f]{64}").unwrap())
        .stdout(predicate::str::contains(r#"{"window":{"timezone":"UTC"}}"#));
}
