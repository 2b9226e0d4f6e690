use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn companion() -> Command {
    let mut cmd = Command::cargo_bin("companion").unwrap();
    cmd.env_remove("ANTHROPIC_API_KEY").env_remove("COMPANION_MODEL");
    cmd
}

#[test]
fn test_files_lists_discovered_and_skips_ignored() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
    fs::write(dir.path().join("src/x.rs"), "fn x() {}").unwrap();
    fs::write(dir.path().join("node_modules/pkg/index.js"), "module.exports = 1;").unwrap();

    companion()
        .arg("--workspace")
        .arg(dir.path())
        .arg("files")
        .assert()
        .success()
        .stdout(predicate::str::contains("src/x.rs"))
        .stdout(predicate::str::contains("node_modules").not());
}

#[test]
fn test_files_rank_orders_by_relevance() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "export const a = 1;").unwrap();
    fs::write(dir.path().join("auth.ts"), "export function login() {}").unwrap();

    let output = companion()
        .arg("--workspace")
        .arg(dir.path())
        .args(["files", "--rank", "auth login"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    let auth = lines.iter().position(|l| l.contains("auth.ts")).unwrap();
    let other = lines
        .iter()
        .position(|l| l.contains("a.ts") && !l.contains("auth.ts"))
        .unwrap();
    assert!(auth < other);
}

#[test]
fn test_ask_without_key_reports_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[ai]\napi_key_env = \"COMPANION_TEST_NO_SUCH_KEY\"\n").unwrap();

    companion()
        .arg("--config")
        .arg(&config)
        .arg("--workspace")
        .arg(dir.path())
        .args(["ask", "what does this do?"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("COMPANION_TEST_NO_SUCH_KEY"));
}

#[test]
fn test_ask_rejects_unknown_mode() {
    companion()
        .args(["ask", "hi", "--mode", "everything"])
        .assert()
        .failure();
}
