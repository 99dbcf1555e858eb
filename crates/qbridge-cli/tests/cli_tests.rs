//! End-to-end tests of the `qbridge` binary.
//!
//! Every test runs in a scratch directory with the token variable removed,
//! so nothing here reaches the network.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn qbridge(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_qbridge"))
        .args(args)
        .current_dir(dir)
        .env_remove("IBM_QUANTUM_TOKEN")
        .env_remove("QBRIDGE_CONFIG")
        .env_remove("QBRIDGE_ENDPOINT")
        .env_remove("IBM_SERVICE_CRN")
        .output()
        .expect("failed to spawn qbridge")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn read_report(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = qbridge(dir.path(), &["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("qbridge"));
}

#[test]
fn test_local_only_run_writes_report() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("summary.json");
    let output = qbridge(
        dir.path(),
        &[
            "run",
            "--local-only",
            "--seed",
            "7",
            "--report",
            report.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json = read_report(&report);
    assert_eq!(json["remote_connected"], false);
    assert_eq!(json["connect_outcome"], "local-only mode");
    assert_eq!(json["runs"][0]["circuit"], "bell");
    assert_eq!(json["runs"][0]["path"], "local");
    assert_eq!(json["runs"][0]["result"]["shots"], 1000);
    assert_eq!(json["runs"][0]["verdict"]["passed"], true);
}

#[test]
fn test_missing_credential_falls_back_to_simulator() {
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("summary.json");
    let output = qbridge(
        dir.path(),
        &["run", "-c", "bell", "-c", "ghz3", "--report", report.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json = read_report(&report);
    assert_eq!(json["credential"], "none");
    assert!(
        json["connect_outcome"]
            .as_str()
            .unwrap()
            .contains("No credential")
    );
    assert_eq!(json["runs"].as_array().unwrap().len(), 2);
    assert_eq!(json["runs"][1]["circuit"], "ghz_3");
}

#[test]
fn test_config_file_and_flag_precedence() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("qbridge.yaml");
    std::fs::write(&config, "shots: 200\nlocal_only: true\n").unwrap();
    let report = dir.path().join("summary.json");

    let output = Command::new(env!("CARGO_BIN_EXE_qbridge"))
        .args(["run", "--report", report.to_str().unwrap()])
        .current_dir(dir.path())
        .env_remove("IBM_QUANTUM_TOKEN")
        .env("QBRIDGE_CONFIG", &config)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(read_report(&report)["runs"][0]["result"]["shots"], 200);

    let output = qbridge(
        dir.path(),
        &[
            "run",
            "--config",
            config.to_str().unwrap(),
            "--shots",
            "50",
            "--report",
            report.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(read_report(&report)["runs"][0]["result"]["shots"], 50);
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.yaml");
    std::fs::write(&config, "shots: 0\n").unwrap();

    let output = qbridge(dir.path(), &["run", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error:"));
}

#[test]
fn test_unknown_circuit_fails() {
    let dir = TempDir::new().unwrap();
    let output = qbridge(dir.path(), &["run", "--local-only", "-c", "ghz1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown circuit"));
}

#[test]
fn test_oversized_circuit_has_no_viable_path() {
    let dir = TempDir::new().unwrap();
    let output = qbridge(dir.path(), &["run", "--local-only", "-c", "ghz25"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("ghz_25"));
}

#[test]
fn test_compile_for_heron_prints_qasm() {
    let dir = TempDir::new().unwrap();
    let output = qbridge(dir.path(), &["compile", "--circuit", "bell", "--target", "heron"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let qasm = stdout(&output);
    assert!(qasm.starts_with("OPENQASM 3.0;"));
    assert!(qasm.contains("cz "));
    assert!(!qasm.contains("cx "));
    assert!(!qasm.contains("h "));
}

#[test]
fn test_compile_for_eagle_uses_ecr() {
    let dir = TempDir::new().unwrap();
    let output = qbridge(dir.path(), &["compile", "--circuit", "bell", "--target", "eagle"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let qasm = stdout(&output);
    assert!(qasm.contains("ecr q[0], q[1];"));
    assert!(!qasm.contains("cx "));
}

#[test]
fn test_compile_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("bell.qasm");
    let output = qbridge(
        dir.path(),
        &["compile", "-t", "ibm", "-o", out.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(std::fs::read_to_string(&out).unwrap().contains("cx "));
}

#[test]
fn test_auth_status_reports_sources() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".env"), "IBM_QUANTUM_TOKEN=your_token_here\n").unwrap();

    let output = qbridge(dir.path(), &["auth", "status"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("env:IBM_QUANTUM_TOKEN"));
    assert!(text.contains("placeholder value"));
    assert!(text.contains("No credential"));
}

#[test]
fn test_auth_status_never_prints_token() {
    let dir = TempDir::new().unwrap();
    let output = qbridge(dir.path(), &["auth", "status", "--token", "s3cret-value"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Using credential"));
    assert!(!text.contains("s3cret-value"));
}
