//! Exit-code and output tests for the `textcleaner` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use textcleaner::PipelineConfig;

fn textcleaner() -> Command {
    let mut cmd = Command::cargo_bin("textcleaner").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("TEXTCLEANER_CONFIG")
        .env_remove("TEXTCLEANER_LOG_FILE");
    cmd
}

#[test]
fn per_file_failures_still_exit_zero() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fs::write(input.path().join("good.txt"), "A perfectly fine file.\n").unwrap();
    fs::write(input.path().join("bad.docx"), "not a zip archive").unwrap();

    textcleaner()
        .arg("process")
        .arg(input.path())
        .arg(output.path())
        .arg("--no-progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 files"))
        .stdout(predicate::str::contains("1 successful, 1 failed"))
        .stderr(predicate::str::contains("bad.docx"));

    assert!(output.path().join("good.md").exists());
}

#[test]
fn missing_input_root_exits_one() {
    let dir = TempDir::new().unwrap();
    textcleaner()
        .arg("process")
        .arg(dir.path().join("does-not-exist"))
        .arg(dir.path().join("out"))
        .arg("--no-progress")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn unknown_config_key_exits_one() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.yaml");
    fs::write(&config, "processing:\n  enable_content_cleaner: true\n  bogus_key: 1\n").unwrap();
    fs::write(dir.path().join("a.txt"), "Hello.\n").unwrap();

    textcleaner()
        .arg("process")
        .arg(dir.path().join("a.txt"))
        .arg(dir.path().join("out"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn config_with_no_stages_exits_one() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("empty.yaml");
    fs::write(
        &config,
        "processing:\n  enable_content_cleaner: false\n  enable_structure_processor: false\n  enable_ocr_postprocessing: false\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("in")).unwrap();

    textcleaner()
        .arg("process")
        .arg(dir.path().join("in"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn single_file_with_format_flag() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "Due to the fact that it is late, we stop.\n").unwrap();
    let out_dir = dir.path().join("out");

    textcleaner()
        .arg("process")
        .arg(&input)
        .arg(&out_dir)
        .args(["--format", "json", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 successful, 0 failed"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("notes.json")).unwrap()).unwrap();
    assert!(json["content"].as_str().unwrap().starts_with("Because it is late"));
}

#[test]
fn generate_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf").join("aggressive.yaml");

    textcleaner()
        .arg("generate-config")
        .arg(&path)
        .args(["--config-type", "aggressive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("aggressive"));

    let loaded = PipelineConfig::from_file(&path).unwrap();
    assert_eq!(loaded, PipelineConfig::preset("aggressive".parse().unwrap()));
}

#[test]
fn log_file_receives_logs() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("a.txt");
    fs::write(&input, "Hello there.\n").unwrap();
    let log = dir.path().join("run.log");

    textcleaner()
        .arg("process")
        .arg(&input)
        .arg(dir.path().join("out"))
        .arg("--log-file")
        .arg(&log)
        .assert()
        .success();

    let logged = fs::read_to_string(&log).unwrap();
    assert!(logged.contains("Processing"), "{logged}");
}
