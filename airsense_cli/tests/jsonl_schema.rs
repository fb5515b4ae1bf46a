use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[calibration]
stabilization_secs = 1
sample_interval_ms = 50
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn status_json(args: &[&str]) -> serde_json::Value {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("airsense").unwrap();
    cmd.arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg);
    for a in args {
        cmd.arg(a);
    }
    let out = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8_lossy(&out);
    let line = stdout
        .lines()
        .find(|l| l.contains("\"status\""))
        .unwrap_or("")
        .to_string();
    assert!(!line.is_empty(), "no JSON line found; stdout was: {stdout}");
    serde_json::from_str(&line).expect("valid JSON")
}

/// Before calibration the score is null and the status says why.
#[rstest]
fn status_schema_before_calibration() {
    let v = status_json(&["status"]);
    assert_eq!(v["status"], "not_stabilized");
    for key in ["temperature", "pressure", "humidity"] {
        assert!(v.get(key).and_then(|x| x.as_f64()).is_some(), "{key}");
    }
    assert!(v.get("air_quality").is_some());
    assert!(v["air_quality"].is_null());
    assert!(
        v["text"]
            .as_str()
            .unwrap()
            .ends_with("Gas sensor not stabilized, no air quality data.")
    );
}

#[rstest]
fn status_schema_after_calibration() {
    let v = status_json(&["status", "--calibrate"]);
    assert_eq!(v["status"], "ok");
    let score = v["air_quality"].as_f64().expect("numeric score");
    assert!(score.is_finite());
    assert!(v["text"].as_str().unwrap().contains("Air Quality score:"));
}

#[rstest]
fn self_check_schema() {
    let v = status_json(&["self-check"]);
    assert_eq!(v["status"], "ok");
    assert!(v["gas_resistance"].as_f64().is_some());
    assert!(v["heat_stable"].is_boolean());
}
