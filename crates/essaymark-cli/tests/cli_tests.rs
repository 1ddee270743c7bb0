//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn essaymark() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("essaymark").unwrap();
    cmd.env_remove("ESSAYMARK_USER")
        .env_remove("ESSAYMARK_OPENAI_KEY");
    cmd
}

/// A workspace with an offline mock config, storing under `data/`.
fn mock_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("essaymark.toml"),
        r#"
default_provider = "mock"
store_dir = "data"
initial_credits = 2

[providers.mock]
type = "mock"
"#,
    )
    .unwrap();
    dir
}

fn submit(dir: &Path, user: &str) -> String {
    let output = essaymark()
        .current_dir(dir)
        .args(["submit", "--question", "Is homework useful?"])
        .args(["--essay", "Homework builds discipline, but too much of it..."])
        .args(["--user", user, "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "submit failed: {output:?}");
    let submission: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    submission["id"].as_str().unwrap().to_string()
}

#[test]
fn help_output() {
    essaymark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rubric-based essay assessment"));
}

#[test]
fn version_output() {
    essaymark()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("essaymark"));
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    essaymark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created essaymark.toml"));

    assert!(dir.path().join("essaymark.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    essaymark().current_dir(dir.path()).arg("init").assert().success();

    essaymark()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn submit_prints_scored_assessment() {
    let dir = mock_workspace();

    essaymark()
        .current_dir(dir.path())
        .args(["submit", "--question", "Should uniforms be mandatory?"])
        .args(["--essay", "No. Uniforms limit self-expression..."])
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall score: 5.4 / 6 (high)"))
        .stdout(predicate::str::contains("excellent"))
        .stdout(predicate::str::contains("Suggestions:"))
        .stderr(predicate::str::contains("Remaining credits: 1"));

    assert!(dir.path().join("data").join("history.json").exists());
}

#[test]
fn submit_reads_essay_file() {
    let dir = mock_workspace();
    std::fs::write(dir.path().join("essay.txt"), "An essay read from disk.").unwrap();

    essaymark()
        .current_dir(dir.path())
        .args(["submit", "--question", "Q?", "--essay-file", "essay.txt"])
        .assert()
        .success();
}

#[test]
fn submit_requires_an_essay() {
    let dir = mock_workspace();

    essaymark()
        .current_dir(dir.path())
        .args(["submit", "--question", "Q?"])
        .assert()
        .failure();
}

#[test]
fn submit_with_unconfigured_provider_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("essaymark.toml"),
        "default_provider = \"missing\"\nstore_dir = \"data\"\n",
    )
    .unwrap();

    essaymark()
        .current_dir(dir.path())
        .args(["submit", "--question", "Q?", "--essay", "E."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'missing' is not configured"));

    assert!(!dir.path().join("data").join("history.json").exists());
}

#[test]
fn read_commands_work_without_a_provider() {
    let dir = mock_workspace();
    let id = submit(dir.path(), "alice");
    std::fs::write(
        dir.path().join("essaymark.toml"),
        "default_provider = \"missing\"\nstore_dir = \"data\"\n",
    )
    .unwrap();

    essaymark()
        .current_dir(dir.path())
        .args(["history", "--user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 essays"));
    essaymark()
        .current_dir(dir.path())
        .args(["show", "--id", &id])
        .assert()
        .success();
    essaymark()
        .current_dir(dir.path())
        .args(["quota", "--user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice: 1 credits remaining"));
}

#[test]
fn history_summarizes_submissions() {
    let dir = mock_workspace();
    submit(dir.path(), "alice");
    submit(dir.path(), "alice");
    submit(dir.path(), "bob");

    essaymark()
        .current_dir(dir.path())
        .args(["history", "--user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2 essays, average 5.4, best 5.4, trend steady",
        ));
}

#[test]
fn history_for_new_user_is_empty() {
    let dir = mock_workspace();

    essaymark()
        .current_dir(dir.path())
        .args(["history", "--user", "nobody"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 essays, average 0.0, best 0.0, trend steady"))
        .stdout(predicate::str::contains("No essays assessed yet."));
}

#[test]
fn history_json_and_html_outputs() {
    let dir = mock_workspace();
    let id = submit(dir.path(), "alice");

    let output = essaymark()
        .current_dir(dir.path())
        .args(["history", "--user", "alice", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_essays"], 1);
    assert_eq!(report["rows"][0]["id"], id.as_str());
    assert_eq!(report["rows"][0]["band"], "high");
    assert_eq!(report["summary"]["trend"], "none");

    essaymark()
        .current_dir(dir.path())
        .args(["history", "--user", "alice", "--format", "html"])
        .args(["--output", "out/history.html"])
        .assert()
        .success();
    let html = std::fs::read_to_string(dir.path().join("out/history.html")).unwrap();
    assert!(html.contains("Essay history for alice"));
}

#[test]
fn history_markdown_output() {
    let dir = mock_workspace();
    submit(dir.path(), "alice");

    essaymark()
        .current_dir(dir.path())
        .args(["history", "--user", "alice", "--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Summary:** 1 essays"))
        .stdout(predicate::str::contains("| Date | Question | Score | Band | Trend |"));
}

#[test]
fn show_entry_by_id() {
    let dir = mock_workspace();
    let id = submit(dir.path(), "alice");

    essaymark()
        .current_dir(dir.path())
        .args(["show", "--id", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Assessment {id}")))
        .stdout(predicate::str::contains("Is homework useful?"));
}

#[test]
fn show_unknown_id_is_not_found() {
    let dir = mock_workspace();

    essaymark()
        .current_dir(dir.path())
        .args(["show", "--id", "00000000-0000-0000-0000-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn show_invalid_id() {
    let dir = mock_workspace();

    essaymark()
        .current_dir(dir.path())
        .args(["show", "--id", "not-a-uuid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid assessment id"));
}

#[test]
fn quota_counts_down_and_stops_at_zero() {
    let dir = mock_workspace();

    essaymark()
        .current_dir(dir.path())
        .args(["quota", "--user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice: 2 credits remaining"));

    for _ in 0..3 {
        submit(dir.path(), "alice");
    }

    essaymark()
        .current_dir(dir.path())
        .args(["quota", "--user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice: 0 credits remaining"));
}

#[test]
fn missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();

    essaymark()
        .current_dir(dir.path())
        .args(["quota", "--config", "nope.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
