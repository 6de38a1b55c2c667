// CLI surface tests
// Everything here runs without a judge backend

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn flux(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("flux").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_no_command_shows_getting_started() {
    let dir = tempfile::tempdir().unwrap();
    flux(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("flux create plan.toml --dry-run"))
        .stdout(predicate::str::contains("flux locks search"));
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    flux(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("locks"))
        .stdout(predicate::str::contains("problems"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_locks_search_help_shows_views() {
    let dir = tempfile::tempdir().unwrap();
    flux(&dir)
        .args(["locks", "search", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("active-timer"));
}

#[test]
fn test_config_show_reads_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[api]\nbase_url = \"https://judge.example.org/api\"").unwrap();

    flux(&dir)
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("https://judge.example.org/api"))
        .stdout(predicate::str::contains("bridge_settle_ms = 200"));
}

#[test]
fn test_environment_overrides_configuration() {
    let dir = tempfile::tempdir().unwrap();
    flux(&dir)
        .args(["config", "show"])
        .env("FLUX__WIZARD__BRIDGE_ENABLED", "false")
        .assert()
        .success()
        .stdout(predicate::str::contains("bridge_enabled = false"));
}

#[test]
fn test_create_with_missing_plan_fails() {
    let dir = tempfile::tempdir().unwrap();
    flux(&dir)
        .args(["create", "missing.toml", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read plan"));
}

#[test]
fn test_timer_lock_create_requires_timeout() {
    let dir = tempfile::tempdir().unwrap();
    flux(&dir)
        .args(["locks", "create", "--name", "Finals", "--type", "timer"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Timer locks need an unlock time"));
}

#[test]
fn test_timer_lock_create_rejects_past_timeout() {
    let dir = tempfile::tempdir().unwrap();
    flux(&dir)
        .args(["locks", "create", "--name", "Finals", "--type", "timer"])
        .args(["--timeout", "2001-01-01T00:00:00Z"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unlock time must be in the future"));
}

#[test]
fn test_config_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();
    flux(&dir)
        .args(["config", "show"])
        .env("FLUX__API__USERNAME", "admin")
        .env("FLUX__API__PASSWORD", "hunter2")
        .assert()
        .success()
        .stdout(predicate::str::contains("username = \"admin\""))
        .stdout(predicate::str::contains("hunter2").not());
}
