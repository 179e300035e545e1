use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        let json = serde_json::json!({
            "registry": { "path": dir.path().join("registry.json") },
            "notify": { "outbox": dir.path().join("outbox.jsonl") },
        });
        fs::write(&config, json.to_string()).unwrap();
        Self { dir, config }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("platewatch").unwrap();
        cmd.arg("--config").arg(&self.config);
        cmd
    }

    fn outbox(&self) -> Vec<serde_json::Value> {
        let path = self.dir.path().join("outbox.jsonl");
        if !path.exists() {
            return Vec::new();
        }
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn registry_file(&self) -> &Path {
        self.dir.path()
    }

    fn add_owner_with_car(&self) {
        self.cmd()
            .args([
                "registry",
                "add-person",
                "--name",
                "Ana Torres",
                "--age",
                "22",
                "--control-number",
                "20210001",
                "--email",
                "ana@campus.edu",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Registered person 1"));

        self.cmd()
            .args([
                "registry",
                "add-vehicle",
                "--owner",
                "1",
                "--plate",
                "abc-123",
                "--make",
                "Nissan",
                "--model",
                "Sentra",
                "--color",
                "white",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Registered vehicle 1"));
    }

    fn record(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([
                "incident",
                "record",
                "--person",
                "1",
                "--vehicle",
                "1",
                "--description",
                "Parked on the sidewalk",
                "--date",
                "2024-04-01",
            ])
            .assert()
    }
}

#[test]
fn test_register_and_lookup() {
    let ws = Workspace::new();
    ws.add_owner_with_car();

    assert!(ws.registry_file().join("registry.json").exists());

    ws.cmd()
        .args(["registry", "lookup", "ABC 123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"plate\": \"abc-123\""))
        .stdout(predicate::str::contains("Ana Torres"));

    ws.cmd()
        .args(["registry", "lookup", "ABC124"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ABC124 is not registered"));
}

#[test]
fn test_duplicate_plate_rejected() {
    let ws = Workspace::new();
    ws.add_owner_with_car();

    ws.cmd()
        .args([
            "registry",
            "add-vehicle",
            "--owner",
            "1",
            "--plate",
            "ABC 123",
            "--make",
            "Kia",
            "--model",
            "Rio",
            "--color",
            "black",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already registered"));

    ws.cmd()
        .args(["registry", "list", "vehicles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sentra"))
        .stdout(predicate::str::contains("Rio").not());
}

#[test]
fn test_incidents_escalate_to_blocked() {
    let ws = Workspace::new();
    ws.add_owner_with_car();

    ws.record()
        .success()
        .stdout(predicate::str::contains("1 of 3 incident(s), status authorized"));
    ws.record()
        .success()
        .stdout(predicate::str::contains("2 of 3 incident(s), status authorized"));
    ws.record()
        .success()
        .stdout(predicate::str::contains("3 of 3 incident(s), status blocked"))
        .stdout(predicate::str::contains("blocked notification for ana@campus.edu"));

    let outbox = ws.outbox();
    assert_eq!(outbox.len(), 3);
    assert_eq!(outbox[0]["to"], "ana@campus.edu");
    assert!(outbox[2]["subject"].as_str().unwrap().contains("BLOCKED"));
}

#[test]
fn test_report_then_reject() {
    let ws = Workspace::new();
    ws.add_owner_with_car();

    ws.cmd()
        .args([
            "incident",
            "report",
            "--person",
            "1",
            "--vehicle",
            "1",
            "--description",
            "Took two spots",
            "--reporter",
            "guard@campus.edu",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reported incident 1 (pending review)"));

    ws.cmd()
        .args(["incident", "decide", "1", "--reject"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Incident 1 rejected"))
        .stdout(predicate::str::contains("rejected notification for guard@campus.edu"));

    ws.cmd()
        .args(["incident", "decide", "1", "--approve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already been decided"));

    ws.cmd()
        .args(["registry", "list", "persons"])
        .assert()
        .success()
        .stdout(predicate::str::contains("authorized,0"));

    assert_eq!(ws.outbox().len(), 1);
}

#[test]
fn test_decide_requires_a_verdict() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["incident", "decide", "1"])
        .assert()
        .failure();
}

#[test]
fn test_config_get_and_set() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["config", "get", "escalation.block_threshold"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3"));

    ws.cmd()
        .args(["config", "set", "plate.max_len", "8"])
        .assert()
        .success();

    ws.cmd()
        .args(["config", "get", "plate.max_len"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8"));

    ws.cmd()
        .args(["config", "set", "plate.max_len", "eight"])
        .assert()
        .failure();
}

#[test]
fn test_recognize_missing_input() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["recognize", "does-not-exist.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_concurrent_records_from_separate_processes() {
    const N: usize = 6;
    let ws = Workspace::new();
    ws.add_owner_with_car();

    let children: Vec<_> = (0..N)
        .map(|_| {
            std::process::Command::new(assert_cmd::cargo::cargo_bin("platewatch"))
                .arg("--config")
                .arg(&ws.config)
                .args([
                    "incident",
                    "record",
                    "--person",
                    "1",
                    "--vehicle",
                    "1",
                    "--description",
                    "Double parked",
                ])
                .stdout(std::process::Stdio::null())
                .spawn()
                .unwrap()
        })
        .collect();

    for mut child in children {
        assert!(child.wait().unwrap().success());
    }

    ws.cmd()
        .args(["registry", "list", "persons"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("blocked,{}", N)));

    ws.cmd()
        .args(["registry", "list", "incidents"])
        .assert()
        .success()
        .stdout(predicate::function(|out: &str| out.lines().count() == N + 1));
}
