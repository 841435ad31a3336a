use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    path
}

fn offline_config(dir: &Path) -> PathBuf {
    offline_config_with(dir, "")
}

/// Offline settings plus `extra` sections.
fn offline_config_with(dir: &Path, extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[logging]
level = "warn"

[cache]
backend = "memory"

[upstream]
source = "simulated"
simulated_latency_ms = 0
simulated_dividend = 4242

[trading]
dry_run = true

[database]
path = "{}"

{extra}
"#,
        dir.join("taodiv.db").display()
    );
    write_config(dir, &toml)
}

fn taodiv(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taodiv"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run taodiv")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "command failed.\nstdout: {stdout}\nstderr: {stderr}"
    );
    serde_json::from_str(stdout.trim()).unwrap_or_else(|e| {
        panic!("stdout is not JSON ({e}).\nstdout: {stdout}\nstderr: {stderr}")
    })
}

#[test]
fn cli_returns_nonzero_on_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[cache]\nttl_secs = 0\n");

    let output = taodiv(&path, &["check", "config"]);

    assert!(!output.status.success(), "Expected nonzero exit code");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{stdout}{stderr}");
    assert!(
        combined.contains("ttl_secs"),
        "Expected error message about ttl_secs.\nstdout: {stdout}\nstderr: {stderr}"
    );
}

#[test]
fn check_config_reports_valid_file_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config(dir.path());

    let report = stdout_json(&taodiv(&path, &["--json", "check", "config"]));

    assert_eq!(report["command"], "check.config");
    assert_eq!(report["valid"], true);
    assert_eq!(report["upstream"], "simulated");
    assert_eq!(report["dry_run"], true);
}

#[test]
fn query_answers_from_simulated_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config(dir.path());

    let response = stdout_json(&taodiv(
        &path,
        &["--json", "query", "--subnet", "18", "--account", "hk"],
    ));

    assert_eq!(response["subnet_id"], 18);
    assert_eq!(response["account_id"], "hk");
    assert_eq!(response["dividend"]["value"], 4242);
    assert_eq!(response["cached"], false);
    assert_eq!(response["trade_enqueued"], false);
}

#[test]
fn query_with_trade_queues_a_job() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config(dir.path());

    let response = stdout_json(&taodiv(&path, &["--json", "query", "--subnet", "3", "--trade"]));

    assert_eq!(response["subnet_id"], 3);
    assert!(response["dividend"].is_array());
    assert_eq!(response["trade_enqueued"], true);
}

#[test]
fn observations_persist_across_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config(dir.path());

    stdout_json(&taodiv(
        &path,
        &["--json", "query", "--subnet", "18", "--account", "hk"],
    ));
    let history = stdout_json(&taodiv(
        &path,
        &["--json", "history", "dividends", "--subnet", "18"],
    ));

    let records = history["dividends"].as_array().expect("dividend list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["account_id"], "hk");
    assert_eq!(records[0]["value"], 4242);
}

#[test]
fn history_outcomes_is_empty_on_fresh_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config(dir.path());

    let history = stdout_json(&taodiv(&path, &["--json", "history", "outcomes"]));

    assert_eq!(history["command"], "history.outcomes");
    assert_eq!(history["outcomes"].as_array().map(Vec::len), Some(0));
}

#[test]
fn purge_refuses_process_private_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config(dir.path());

    let output = taodiv(&path, &["cache", "purge", "--all"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cache.backend"), "stderr: {stderr}");
}

#[test]
fn trade_refuses_process_private_queue() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config_with(dir.path(), "[dispatcher]\nbackend = \"memory\"\n");

    let output = taodiv(&path, &["query", "--subnet", "3", "--trade"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dispatcher.backend"), "stderr: {stderr}");
}

#[test]
fn worker_refuses_process_private_queue() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config_with(dir.path(), "[dispatcher]\nbackend = \"memory\"\n");

    let output = taodiv(&path, &["worker"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dispatcher.backend"), "stderr: {stderr}");
}

#[test]
fn trade_and_no_cache_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let path = offline_config(dir.path());

    let output = taodiv(&path, &["query", "--trade", "--no-cache"]);
    assert!(!output.status.success());
}
