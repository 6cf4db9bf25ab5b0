//! End-to-end tests for the `tme` binary.
//!
//! Each test writes a model to a temporary directory and drives the binary
//! the way a user would. It focuses on:
//! - `--write` replacing the model file only when the edit succeeds.
//! - Exit codes separating rejected input from failed edits.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;
use tme_test_utils::SAMPLE_MODEL;

fn model_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("model.yaml");
    fs::write(&path, SAMPLE_MODEL).unwrap();
    path
}

fn tme(model: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tme"))
        .arg("--model")
        .arg(model)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

/// Tenet: `--write` stores the edited document in place.
#[test]
fn rename_with_write_updates_model_file() {
    let dir = TempDir::new().unwrap();
    let model = model_file(&dir);

    let out = tme(&model, &["--write", "rename", "data_assets", "customer-data", "customer"]);

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty());
    let written = fs::read_to_string(&model).unwrap();
    assert!(written.contains("  customer: &customer\n"));
    assert!(written.contains("    <<: *customer\n"));
}

/// Tenet: without `--write` the model file is left alone.
#[test]
fn edited_text_goes_to_stdout() {
    let dir = TempDir::new().unwrap();
    let model = model_file(&dir);

    let out = tme(&model, &["delete", "technical_assets", "database"]);

    assert!(out.status.success());
    assert!(!String::from_utf8_lossy(&out.stdout).contains("database:"));
    assert_eq!(fs::read_to_string(&model).unwrap(), SAMPLE_MODEL);
}

/// Tenet: a rejected intent exits 1, a failed edit exits 2; neither writes.
#[test]
fn failures_have_distinct_exit_codes() {
    let dir = TempDir::new().unwrap();
    let model = model_file(&dir);

    let rejected = tme(&model, &["--write", "rename", "technical_assets", "web-server", "database"]);
    assert_eq!(rejected.status.code(), Some(1));

    let aliased = tme(
        &model,
        &["--write", "delete", "data_assets", "customer-data", "--mode", "item-only"],
    );
    assert_eq!(aliased.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&aliased.stderr).contains("session-token"));
    assert_eq!(fs::read_to_string(&model).unwrap(), SAMPLE_MODEL);

    let shared_tags = "data_assets:\n  a:\n    id: da-1\n    tags: &pii [pii]\n  b:\n    id: da-2\n    tags: *pii\n";
    let anchored = dir.path().join("anchored.yaml");
    fs::write(&anchored, shared_tags).unwrap();
    let failed = tme(&anchored, &["--write", "set", "data_assets", "a", "tags", "[x]"]);
    assert_eq!(failed.status.code(), Some(2));
    assert_eq!(fs::read_to_string(&anchored).unwrap(), shared_tags);
}

/// Tenet: a config file changes how ids are cascaded.
#[test]
fn config_file_sets_risk_policy() {
    let dir = TempDir::new().unwrap();
    let model = model_file(&dir);
    let config = dir.path().join("tme.yaml");
    fs::write(&config, "risk_tracking: ignore\n").unwrap();

    let out = tme(
        &model,
        &["--config", config.to_str().unwrap(), "set", "technical_assets", "database", "id", "ta-db"],
    );

    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("sql-injection@ta-2:"));
    assert!(String::from_utf8_lossy(&out.stderr).contains("\"risk_keys_stale\": 2"));
}
