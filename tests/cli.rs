//! Integration tests for the zipbench binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn zipbench(metrics: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("zipbench").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("ZIPBENCH_METRICS_DIR", metrics.path());
    cmd
}

/// Test CLI responds to --help
#[test]
fn test_cli_help() {
    Command::cargo_bin("zipbench")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compress"))
        .stdout(predicate::str::contains("decompress"));
}

/// Test compress then decompress through the binary
#[test]
fn test_compress_and_decompress() {
    let root = TempDir::new().unwrap();
    let metrics = TempDir::new().unwrap();
    let dir = root.path().join("docs");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("readme.md"), b"# hello\n".repeat(100)).unwrap();

    zipbench(&metrics)
        .arg("compress")
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("sequential"))
        .stdout(predicate::str::contains("parallel"));
    assert!(root.path().join("docs.zip").is_file());

    fs::remove_dir_all(&dir).unwrap();
    zipbench(&metrics)
        .arg("decompress")
        .arg(root.path().join("docs.zip"))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entries extracted, 0 skipped"));
    assert_eq!(
        fs::read(dir.join("readme.md")).unwrap(),
        b"# hello\n".repeat(100)
    );

    assert!(metrics.path().join("compression_results.csv").is_file());
    assert!(metrics.path().join("decompression_results.csv").is_file());
}

/// Test missing directory exits non-zero with an explanation
#[test]
fn test_missing_directory_fails() {
    let root = TempDir::new().unwrap();
    let metrics = TempDir::new().unwrap();

    zipbench(&metrics)
        .arg("compress")
        .arg(root.path().join("absent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid input"));
}

/// Test corrupt archive exits non-zero
#[test]
fn test_corrupt_archive_fails() {
    let root = TempDir::new().unwrap();
    let metrics = TempDir::new().unwrap();
    let archive = root.path().join("broken.zip");
    fs::write(&archive, b"garbage").unwrap();

    zipbench(&metrics)
        .arg("decompress")
        .arg(&archive)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot extract"));
}

/// Test --no-metrics leaves the metrics directory empty
#[test]
fn test_no_metrics_flag() {
    let root = TempDir::new().unwrap();
    let metrics = TempDir::new().unwrap();
    let dir = root.path().join("data");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.txt"), b"a").unwrap();

    zipbench(&metrics)
        .args(["--no-metrics", "compress"])
        .arg(&dir)
        .assert()
        .success();
    assert_eq!(fs::read_dir(metrics.path()).unwrap().count(), 0);
}
