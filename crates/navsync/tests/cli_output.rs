//! Integration tests for CLI output behavior
//!
//! The default behavior is quiet (no logs). Use -v/--verbose to enable logs.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

const LOOP_TRACE: &str = r#"{
    "initial": "/portal?tab=time-off",
    "resources": ["messages"],
    "steps": [
        { "at": 0, "op": "navigate", "location": "/portal?tab=messages" },
        { "at": 400, "op": "navigate", "location": "/portal?tab=training" },
        { "at": 800, "op": "navigate", "location": "/portal?tab=messages" },
        { "at": 1200, "op": "navigate", "location": "/portal?tab=training" },
        { "at": 1600, "op": "navigate", "location": "/portal?tab=messages" },
        { "at": 2000, "op": "navigate", "location": "/portal?tab=training" },
        { "at": 2400, "op": "navigate", "location": "/portal?tab=messages" },
        { "at": 14000, "op": "tick" }
    ]
}"#;

fn write_temp(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

/// Empty config file so the user's own config never leaks into a test.
fn empty_config() -> NamedTempFile {
    write_temp("", ".toml")
}

fn run_navsync(args: &[&str], config: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_navsync"))
        .args(args)
        .arg("--config")
        .arg(config)
        .output()
        .expect("Failed to execute navsync")
}

#[test]
fn test_replay_stdout_is_clean() {
    let trace = write_temp(LOOP_TRACE, ".json");
    let config = empty_config();
    let output = run_navsync(&["replay", trace.path().to_str().unwrap()], config.path());

    assert!(
        output.status.success(),
        "navsync replay failed with exit code {:?}. stderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        !stdout.contains(r#""event":"#),
        "stdout should not contain JSON logs, got: {}",
        stdout
    );
    assert!(
        stderr.is_empty(),
        "Default quiet mode should have empty stderr, got: {}",
        stderr
    );
    assert!(stdout.contains("recovery started, navigating to time-off"));
    assert!(stdout.contains("recovery finished"));
    assert!(stdout.contains("Phase:       normal"));
}

#[test]
fn test_replay_verbose_logs_to_stderr() {
    let trace = write_temp(LOOP_TRACE, ".json");
    let config = empty_config();
    let output = run_navsync(
        &["-v", "replay", trace.path().to_str().unwrap()],
        config.path(),
    );
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("core.loop.phase_changed"),
        "verbose mode should emit structured logs, got: {}",
        stderr
    );
    assert!(stderr.contains("cli.replay_completed"));
}

#[test]
fn test_replay_json_output_parses() {
    let trace = write_temp(LOOP_TRACE, ".json");
    let config = empty_config();
    let output = run_navsync(
        &["replay", trace.path().to_str().unwrap(), "--json"],
        config.path(),
    );
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert!(json["generated_at"].is_string());
    let steps = json["report"]["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 8);
    assert!(
        steps[6]["events"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e["type"] == "recovery_started")
    );
    assert_eq!(json["report"]["status"]["phase"], "normal");
}

#[test]
fn test_replay_missing_trace_fails() {
    let config = empty_config();
    let output = run_navsync(&["replay", "/nonexistent/navsync-trace.json"], config.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Could not read trace"),
        "expected a read error, got: {}",
        stderr
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let trace = write_temp(LOOP_TRACE, ".json");
    let config = write_temp(
        "[loop_detection]\nwarning_threshold = 7\nemergency_threshold = 5\n",
        ".toml",
    );
    let output = run_navsync(&["replay", trace.path().to_str().unwrap()], config.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("emergency_threshold"));
}

#[test]
fn test_config_defaults_output() {
    let config = write_temp("[tabs]\ndefault_view = \"messages\"\n", ".toml");
    let output = run_navsync(&["config", "--defaults"], config.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("capacity = 20"));
    assert!(stdout.contains("default_view = \"messages\""));
    assert!(stdout.contains("safe_view = \"messages\""));
}
