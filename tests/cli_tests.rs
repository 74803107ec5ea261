//! Integration tests for the CLI interface
//!
//! Tests the main entry point and command parsing logic

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn procstream() -> Command {
    let mut cmd = Command::cargo_bin("procstream").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("PROCSTREAM_DEFAULT_TAG")
        .env_remove("PROCSTREAM_LOG_LEVEL")
        .env_remove("PROCSTREAM_STDOUT_FORMAT")
        .env_remove("PROCSTREAM_STDERR_FORMAT");
    cmd
}

#[test]
fn test_cli_help_flag() {
    procstream()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("demo"));
}

#[test]
fn test_invalid_command() {
    procstream()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_run_streams_formatted_stdout() {
    procstream()
        .args(["run", "--stdout-format", "OUT: {}", "--", "printf 'a\\nb\\n'"])
        .assert()
        .success()
        .stdout("OUT: a\nOUT: b\nFinished with status: 0.\n");
}

#[test]
fn test_run_formats_stderr_separately() {
    procstream()
        .args([
            "run",
            "--stderr-format",
            "ERR: {}",
            "--",
            "sh",
            "-c",
            "echo visible; echo oops >&2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("visible\n"))
        .stderr(predicate::str::contains("ERR: oops\n"));
}

#[test]
fn test_run_exits_with_child_status() {
    procstream()
        .args(["run", "--", "sh -c 'exit 3'"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Finished with status: 3."));
}

#[test]
fn test_run_logs_process_lifecycle() {
    procstream()
        .args(["run", "--tag", "lifecycle", "--", "true"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Process 'lifecycle' created with pid"))
        .stderr(predicate::str::contains("exited with status 0."));
}

#[test]
fn test_run_missing_executable_fails() {
    procstream()
        .args(["run", "--", "no-such-executable-procstream-test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Command not found"));
}

#[test]
fn test_run_rejects_bad_template() {
    procstream()
        .args(["run", "--stdout-format", "no placeholder", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid output format"));
}

#[test]
fn test_config_file_sets_formats_and_tag() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("procstream.toml");
    std::fs::write(
        &config,
        "default_tag = \"configured\"\n[stdout]\nformat = \"[cfg] {}\"\n",
    )
    .unwrap();

    procstream()
        .arg("--config")
        .arg(&config)
        .args(["run", "--", "echo hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[cfg] hello\n"))
        .stderr(predicate::str::contains("Process 'configured'"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    procstream()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .args(["run", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_demo_help() {
    procstream()
        .args(["demo", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("simple"))
        .stdout(predicate::str::contains("chained"));
}
