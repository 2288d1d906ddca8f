#![cfg(feature = "cli")]

use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_frost-risk");

/// Stump on TT_lag_6h: cold nights score ~0.99995, mild ones exactly 0.5.
const STUMP_MODEL: &str = r#"{
    "model_id": "frost-stump",
    "n_features": 12,
    "learning_rate": 1.0,
    "init_score": 0.0,
    "trees": [{"nodes": [
        {"type": "split", "feature": 10, "threshold": 2.0, "left": 1, "right": 2},
        {"type": "leaf", "value": 10.0},
        {"type": "leaf", "value": 0.0}
    ]}]
}"#;

const MILD: &str = r#"{"vector":[60,2,1012,5,0.3,0,1,0.5,0.87,1,9.5,62]}"#;
const COLD: &str = r#"{"vector":[92,0.5,1020,-2,-1.1,0,1,0.5,0.87,1,0.5,90]}"#;

fn model_dir() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tmpdir");
    let path = dir.path().join("frost.json");
    std::fs::write(&path, STUMP_MODEL).expect("write model");
    (dir, path)
}

fn frost_risk(model: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .env_remove("FROST_MODEL_PATH")
        .env_remove("RUST_LOG")
        .arg("--model")
        .arg(model)
        .args(args)
        .output()
        .expect("run frost-risk")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1, "expected one line, got {stdout:?}");
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

#[test]
fn test_mild_vector_prints_single_json_line() {
    let (_dir, model) = model_dir();
    let output = frost_risk(&model, &[MILD]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\"risk\":0.5,\"risk_level\":\"medio\",\"threshold\":0.9}\n"
    );
}

#[test]
fn test_cold_vector_is_alto() {
    let (_dir, model) = model_dir();
    let output = frost_risk(&model, &[COLD]);

    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["risk_level"], "alto");
    assert!(json["risk"].as_f64().unwrap() > 0.999);
    assert_eq!(json["threshold"], 0.9);
}

#[test]
fn test_threshold_from_payload() {
    let (_dir, model) = model_dir();
    let payload = r#"{"vector":[60,2,1012,5,0.3,0,1,0.5,0.87,1,9.5,62],"threshold":0.4}"#;
    let json = stdout_json(&frost_risk(&model, &[payload]));
    assert_eq!(json["risk_level"], "alto");
    assert_eq!(json["threshold"], 0.4);
}

#[test]
fn test_short_vector_fails_without_stdout() {
    let (_dir, model) = model_dir();
    let output = frost_risk(&model, &[r#"{"vector":[60,2,1012]}"#]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("model expects 12"));
}

#[test]
fn test_malformed_payload_fails() {
    let (_dir, model) = model_dir();
    for payload in ["{vector:", r#"{"threshold":0.9}"#] {
        let output = frost_risk(&model, &[payload]);
        assert!(!output.status.success(), "payload {payload:?} succeeded");
        assert!(output.stdout.is_empty());
    }
}

#[test]
fn test_missing_model_fails() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let output = frost_risk(&dir.path().join("absent.onnx"), &[COLD]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.onnx"));
}

#[test]
fn test_missing_model_with_heuristic_fallback() {
    let dir = tempfile::tempdir().expect("tmpdir");
    let output = frost_risk(
        &dir.path().join("absent.onnx"),
        &["--heuristic-fallback", COLD],
    );

    assert!(output.status.success());
    let json = stdout_json(&output);
    // 0.1 base + cold + critical + humid + dew point below zero, clamped
    assert_eq!(json["risk"], 1.0);
    assert_eq!(json["risk_level"], "alto");
    assert_eq!(json["mock"], true);
    assert_eq!(json["fallback"], true);
    assert!(json["error"].as_str().unwrap().contains("absent.onnx"));
}

#[test]
fn test_payload_from_stdin() {
    let (_dir, model) = model_dir();
    let mut child = Command::new(BIN)
        .env_remove("FROST_MODEL_PATH")
        .arg("--model")
        .arg(&model)
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn frost-risk");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(MILD.as_bytes())
        .expect("write payload");
    let output = child.wait_with_output().expect("wait");

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["risk_level"], "medio");
}

#[test]
fn test_model_path_from_env() {
    let (_dir, model) = model_dir();
    let output = Command::new(BIN)
        .env("FROST_MODEL_PATH", &model)
        .arg(COLD)
        .output()
        .expect("run frost-risk");

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["risk_level"], "alto");
}
