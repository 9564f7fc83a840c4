use assert_fs::fixture::{FileWriteStr, PathChild, PathCreateDir};
use assert_fs::TempDir;
use predicates::prelude::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use repostatus::config::ScanConfig;
use repostatus::status::{OriginState, PushState, StatusCollector};
use repostatus::{discover, Scanner};

/// Integration tests: end-to-end scans over real temp trees and real git
/// repositories, plus a few CLI smoke tests against the built binary.

mod common;
use common::{create_git_repo, marker_repo};

fn scan_config(root: &Path) -> ScanConfig {
    let mut config = ScanConfig::new(vec![root.to_path_buf()], 6, 150_000);
    config.quiet = true;
    config
}

#[tokio::test]
async fn test_scan_reports_real_repositories() {
    let temp = TempDir::new().unwrap();
    let clean = temp.path().join("clean");
    let dirty = temp.path().join("dirty");
    create_git_repo(&clean, None);
    create_git_repo(&dirty, None);
    std::fs::write(dirty.join("wip.txt"), "uncommitted").unwrap();

    let report = Scanner::new(scan_config(temp.path())).run().await.unwrap();

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.dirty, 1);

    let clean_row = report.rows.iter().find(|r| r.path == clean).unwrap();
    assert_eq!(clean_row.branch.as_deref(), Some("main"));
    assert_eq!(clean_row.origin, OriginState::Missing);
    assert!(!clean_row.dirty);

    let dirty_row = report.rows.iter().find(|r| r.path == dirty).unwrap();
    assert!(dirty_row.dirty);
}

#[tokio::test]
async fn test_scan_vendored_repo_reports_nested_parent() {
    let temp = TempDir::new().unwrap();
    let outer = temp.path().join("r1");
    let dep = outer.join("third_party/dep");
    create_git_repo(&outer, None);
    create_git_repo(&dep, None);

    let mut config = scan_config(temp.path());
    config.show_nested = true;

    let report = Scanner::new(config).run().await.unwrap();

    let dep_row = report.rows.iter().find(|r| r.path == dep).unwrap();
    assert_eq!(dep_row.nested_parent.as_deref(), Some(outer.as_path()));

    let outer_row = report.rows.iter().find(|r| r.path == outer).unwrap();
    assert!(outer_row.nested_parent.is_none());

    let table = report.render_table(true);
    assert!(predicate::str::contains("Nested").eval(&table));
    assert!(predicate::str::contains(dep.display().to_string().as_str()).eval(&table));
}

#[tokio::test]
async fn test_local_mode_scan_uses_skip_sentinels() {
    let temp = TempDir::new().unwrap();
    let repo = temp.path().join("repo");
    create_git_repo(&repo, Some("https://example.com/user/repo.git"));

    let mut config = scan_config(temp.path());
    config.local_mode = true;

    let report = Scanner::new(config).run().await.unwrap();

    let row = &report.rows[0];
    assert_eq!(row.origin, OriginState::Skipped);
    assert_eq!(row.pushed, PushState::Skipped);
    assert_eq!(row.ahead, 0);
    assert_eq!(row.behind, 0);

    let table = report.render_table(false);
    assert!(predicate::str::contains("Skipped (Local Mode)").eval(&table));
}

#[tokio::test]
async fn test_hanging_repo_does_not_stall_the_run() {
    // A collector with a short timeout degrades the slow query and the
    // overall run still completes.
    let temp = TempDir::new().unwrap();
    let collector = StatusCollector::with_timeout(Duration::from_millis(100), false);
    let status = collector.collect(temp.path()).await;

    assert_eq!(status.branch, None);
    assert_eq!(status.origin, OriginState::Missing);
    assert_eq!(status.pushed, PushState::Unknown);
}

#[test]
fn test_discovery_two_runs_identical() {
    let temp = TempDir::new().unwrap();
    marker_repo(temp.child("projects/a").path());
    marker_repo(temp.child("projects/b/c").path());
    temp.child("projects/plain").create_dir_all().unwrap();

    let config = scan_config(temp.path());
    let first = discover::discover(&config);
    let second = discover::discover(&config);

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_discovery_budget_yields_partial_set() {
    let temp = TempDir::new().unwrap();
    for i in 0..50 {
        marker_repo(temp.child(format!("repo{i:02}")).path());
    }

    let mut config = scan_config(temp.path());
    config.max_dirs = 10;

    let hits = discover::fallback_scan(&config);
    assert!(hits.len() < 50);
    assert!(!hits.is_empty());
}

// CLI smoke tests against the built binary

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_repostatus"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scan"));
    assert!(stdout.contains("doctor"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_repostatus"))
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("repostatus"));
}

#[test]
fn test_cli_scan_and_csv_export() {
    let temp = TempDir::new().unwrap();
    create_git_repo(&temp.path().join("repo"), None);
    let csv_path = temp.path().join("out.csv");

    let output = Command::new(env!("CARGO_BIN_EXE_repostatus"))
        .args([
            "scan",
            "--root",
            temp.path().to_str().unwrap(),
            "--local",
            "--quiet",
            "--csv",
            csv_path.to_str().unwrap(),
        ])
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "scan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RepoRoot"));
    assert!(stdout.contains("Repositories: 1"));

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("RepoRoot,Branch,Origin,Upstream,Ahead,Behind,Pushed,Dirty"));
    assert!(csv.contains("Skipped (Local Mode)"));
}

#[test]
fn test_cli_scan_without_roots_fails() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.child("config.yml");
    config_path.write_str("scan:\n  roots: []\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repostatus"))
        .args(["--config", config_path.path().to_str().unwrap(), "scan"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No scan roots"));
}

#[test]
fn test_cli_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.child("invalid-config.yml");
    config_path.write_str("invalid: yaml: content: [").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_repostatus"))
        .args(["--config", config_path.path().to_str().unwrap(), "doctor"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("parse") || stderr.contains("config"));
}
