//! CLI integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn amlkit_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_amlkit"));
    cmd.env_remove("AMLKIT_SNAPSHOT").env_remove("RUST_LOG");
    cmd
}

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/workspace.json")
}

fn run_with_snapshot(args: &[&str]) -> Output {
    amlkit_cmd()
        .arg("--snapshot")
        .arg(fixture())
        .args(args)
        .output()
        .expect("run")
}

#[test]
fn test_cli_workspace() {
    let output = run_with_snapshot(&["workspace"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("distributed_benchmark"));
    assert!(stdout.contains("msdistbenchaml"));
}

#[test]
fn test_cli_runs() {
    let output = run_with_snapshot(&["runs", "tf_bench"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("runId"));
    assert!(stdout.contains("tf_bench_1"));
    assert!(stdout.contains("Running"));
}

#[test]
fn test_cli_runs_json() {
    let output = run_with_snapshot(&["runs", "tf_bench", "--json"]);
    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(records.as_array().map(Vec::len), Some(2));
    assert_eq!(records[1]["status"], "Running");
    assert!(records[1]["endTimeUtc"].is_null());
}

#[test]
fn test_cli_unknown_experiment_fails() {
    let output = run_with_snapshot(&["runs", "nope"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: not found: experiment 'nope'"));
}

#[test]
fn test_cli_experiments() {
    let output = run_with_snapshot(&["experiments"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("pytorch_bench"));
    assert_eq!(stdout.lines().count(), 5);
}

#[test]
fn test_cli_run_and_logs() {
    let output = run_with_snapshot(&["run", "tf_bench", "tf_bench_1"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Run: tf_bench_1 Status: Completed"));
    assert!(stdout.contains("Logs (2):"));

    let output = run_with_snapshot(&["logs", "tf_bench", "tf_bench_1"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("azureml-logs/70_driver_log.txt"));
}

#[test]
fn test_cli_compute() {
    let output = run_with_snapshot(&["compute"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("gpucluster"));
    assert!(stdout.contains("STANDARD_NC24RS_V3"));
}

#[test]
fn test_cli_registry_redacted_by_default() {
    let output = run_with_snapshot(&["registry"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("benchacr.azurecr.io"));
    assert!(!stdout.contains("primary-secret"));

    let output = run_with_snapshot(&["registry", "--show-password"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("primary-secret"));
}

#[test]
fn test_cli_subscriptions() {
    let output = run_with_snapshot(&["subscriptions"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Sandbox"));
}

#[test]
fn test_cli_missing_snapshot() {
    let output = amlkit_cmd().arg("compute").output().expect("run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no workspace snapshot given"));
}

#[test]
fn test_cli_config_from_settings_file() {
    let dir = TempDir::new().expect("temp dir");
    let settings = dir.path().join("amlkit.toml");
    std::fs::write(&settings, "workspace_name = \"gpu_bench\"\nregion = \"westus2\"\n")
        .expect("write settings");

    let output = amlkit_cmd()
        .env_remove("WORKSPACE")
        .env_remove("REGION")
        .env_remove("AML_SP_PASSWORD")
        .args(["--settings", settings.to_str().unwrap(), "config"])
        .output()
        .expect("config");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Workspace:      gpu_bench"));
    assert!(stdout.contains("Region:         westus2"));
    assert!(stdout.contains("Auth:           cli"));
}
