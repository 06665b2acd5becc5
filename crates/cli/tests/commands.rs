//! End-to-end tests of the `lcu` binary that need no running client.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

fn lcu_binary() -> PathBuf {
	PathBuf::from(env!("CARGO_BIN_EXE_lcu"))
}

/// Runs `lcu` against a config path inside `dir` so the user's own config is never read.
fn run_lcu(dir: &Path, args: &[&str]) -> Output {
	Command::new(lcu_binary())
		.arg("--config")
		.arg(dir.join("config.json"))
		.args(args)
		.env_remove("RUST_LOG")
		.output()
		.expect("failed to execute lcu")
}

fn stdout_json(output: &Output) -> Value {
	let stdout = String::from_utf8_lossy(&output.stdout);
	serde_json::from_str(stdout.trim()).unwrap_or_else(|e| panic!("expected one JSON line, got {stdout:?}: {e}"))
}

#[test]
fn credentials_come_from_lockfile_with_token_redacted() {
	let dir = TempDir::new().unwrap();
	std::fs::write(dir.path().join("lockfile"), "LeagueClient:4242:54321:s3cret-token:https").unwrap();
	let install_dir = dir.path().to_string_lossy().into_owned();

	let output = run_lcu(
		dir.path(),
		&[
			"credentials",
			"--install-dir",
			&install_dir,
			"--ux-process-name",
			"lcu-test-no-such-process",
		],
	);

	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	let json = stdout_json(&output);
	assert_eq!(json["port"], 54321);
	assert_eq!(json["pid"], 4242);
	assert_eq!(json["username"], "riot");
	assert_eq!(json["token"], "<redacted>");
	assert_eq!(json["tls"], true);
	assert_eq!(json["httpBase"], "https://127.0.0.1:54321");
	assert!(!String::from_utf8_lossy(&output.stdout).contains("s3cret-token"));
}

#[test]
fn credentials_fail_cleanly_without_sources() {
	let dir = TempDir::new().unwrap();
	let install_dir = dir.path().to_string_lossy().into_owned();

	let output = run_lcu(
		dir.path(),
		&[
			"credentials",
			"--install-dir",
			&install_dir,
			"--ux-process-name",
			"lcu-test-no-such-process",
		],
	);

	assert!(!output.status.success());
	assert!(output.stdout.is_empty());
	let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
	assert!(stderr.contains("credentials"), "unexpected stderr: {stderr}");
}

#[test]
fn malformed_config_is_reported() {
	let dir = TempDir::new().unwrap();
	std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

	let output = run_lcu(dir.path(), &["probe"]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("invalid config"), "unexpected stderr: {stderr}");
}

#[test]
fn probe_reports_absent_process() {
	let dir = TempDir::new().unwrap();

	let output = run_lcu(dir.path(), &["probe", "--process-name", "lcu-test-no-such-process"]);

	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	let json = stdout_json(&output);
	assert_eq!(json["process"], "lcu-test-no-such-process");
	assert_eq!(json["running"], false);
}

#[test]
fn init_writes_effective_config_once() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("config.json");

	let output = run_lcu(dir.path(), &["init", "--lobby-server", "http://localhost:3000", "--poll-interval-ms", "750"]);
	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	assert_eq!(stdout_json(&output)["path"], path.to_string_lossy().as_ref());
	let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
	assert_eq!(written["lobbyServer"], "http://localhost:3000");
	assert_eq!(written["pollIntervalMs"], 750);

	let output = run_lcu(dir.path(), &["init", "--poll-interval-ms", "100"]);
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));

	// The existing file is the base the overrides apply to.
	let output = run_lcu(dir.path(), &["init", "--force", "--poll-interval-ms", "100"]);
	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
	assert_eq!(written["lobbyServer"], "http://localhost:3000");
	assert_eq!(written["pollIntervalMs"], 100);
}

#[test]
fn zero_poll_interval_flag_is_a_usage_error() {
	let dir = TempDir::new().unwrap();

	let output = run_lcu(dir.path(), &["run", "--poll-interval-ms", "0"]);

	assert_eq!(output.status.code(), Some(2));
	assert!(output.stdout.is_empty());
	assert!(String::from_utf8_lossy(&output.stderr).contains("--poll-interval-ms"));
}

#[test]
fn zero_poll_interval_in_config_is_reported() {
	let dir = TempDir::new().unwrap();
	std::fs::write(dir.path().join("config.json"), r#"{"pollIntervalMs": 0}"#).unwrap();

	let output = run_lcu(dir.path(), &["run"]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("pollIntervalMs"), "unexpected stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn run_exits_cleanly_on_interrupt() {
	use std::io::{BufRead, BufReader};
	use std::process::Stdio;
	use std::sync::mpsc;

	let dir = TempDir::new().unwrap();
	let mut child = Command::new(lcu_binary())
		.arg("--config")
		.arg(dir.path().join("config.json"))
		.args(["-v", "run", "--process-name", "lcu-test-no-such-process", "--poll-interval-ms", "50"])
		.env_remove("RUST_LOG")
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("failed to spawn lcu");

	let stderr = child.stderr.take().unwrap();
	let (ready_tx, ready_rx) = mpsc::channel();
	std::thread::spawn(move || {
		for line in BufReader::new(stderr).lines().map_while(Result::ok) {
			if line.contains("watching for the client") {
				let _ = ready_tx.send(());
			}
		}
	});
	ready_rx.recv_timeout(Duration::from_secs(30)).expect("lcu never started watching");
	// Give the select loop time to install the signal handler.
	std::thread::sleep(Duration::from_millis(500));

	let status = Command::new("kill").args(["-INT", &child.id().to_string()]).status().unwrap();
	assert!(status.success());
	let output = child.wait_with_output().unwrap();
	assert!(output.status.success(), "lcu exited with {:?}", output.status);
}
