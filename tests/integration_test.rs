
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use test_utils::*;

/// Helper to get the binary command
fn oneclick_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_oneclick"))
}

/// Point the CLI at an isolated config directory
fn with_test_config(cmd: &mut Command, config_dir: &Path) {
    cmd.env("ONECLICK_CONFIG_DIR", config_dir)
        .env_remove("ONECLICK_SLUG")
        .env_remove("RUST_LOG");
}

fn write_config(config_dir: &Path, content: &str) {
    fs::create_dir_all(config_dir).expect("Failed to create config dir");
    fs::write(config_dir.join("config.toml"), content).expect("Failed to write config");
}

#[test]
fn test_help_lists_commands() {
    oneclick_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_completions() {
    oneclick_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("oneclick"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_path_honors_env() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, temp_dir.path());

    cmd.args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            temp_dir.path().join("config.toml").display().to_string(),
        ));
}

#[test]
fn test_config_set_then_show() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, temp_dir.path());
    cmd.args(["config", "set", "modpack.slug", "dragonhowl"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration saved"));

    let saved = fs::read_to_string(temp_dir.path().join("config.toml")).unwrap();
    assert!(saved.contains("slug = \"dragonhowl\""));

    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, temp_dir.path());
    cmd.args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dragonhowl"))
        .stdout(predicate::str::contains("https://api.modrinth.com/v2"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, temp_dir.path());

    cmd.args(["config", "set", "cache.dir", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"))
        .stderr(predicate::str::contains("modpack.slug"));

    assert!(!temp_dir.path().join("config.toml").exists());
}

// ============================================================================
// install / info
// ============================================================================

#[test]
fn test_install_without_slug_fails() {
    let config_dir = TempDir::new().unwrap();
    let game_dir = game_dir();

    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, config_dir.path());
    cmd.arg("install")
        .arg("--dir")
        .arg(game_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No modpack configured"));
}

#[test]
fn test_install_into_missing_dir_fails() {
    let config_dir = TempDir::new().unwrap();
    let missing = config_dir.path().join("nowhere");

    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, config_dir.path());
    cmd.args(["install", "--slug", "dragonhowl", "--dir"])
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Game directory does not exist"));
}

#[test]
fn test_install_end_to_end() {
    let mut hosts = TestHosts::new();
    let _mocks = hosts.mock_standard_install();
    let config_dir = TempDir::new().unwrap();
    write_config(config_dir.path(), &hosts.config_toml());
    let game_dir = game_dir();

    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, config_dir.path());
    cmd.arg("install")
        .arg("--dir")
        .arg(game_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Dragonhowl 1.0.0 is ready"))
        .stdout(predicate::str::contains("2 mod file(s) downloaded, 1 server-only skipped"));

    assert!(game_dir.path().join("mods/sodium.jar").exists());
    assert!(game_dir.path().join("config/a.txt").exists());
    let document = read_launcher_profiles(game_dir.path());
    assert_eq!(document["profiles"][PACK_NAME]["type"], "custom");
}

#[test]
fn test_install_failure_names_stage() {
    let mut hosts = TestHosts::new();
    let _mocks = hosts.mock_standard_install();
    let config_dir = TempDir::new().unwrap();
    write_config(config_dir.path(), &hosts.config_toml());
    let game_dir = TempDir::new().unwrap();

    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, config_dir.path());
    cmd.arg("install")
        .arg("--dir")
        .arg(game_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed while registering the launcher profile",
        ));
}

#[test]
fn test_info_prints_latest_release() {
    let mut hosts = TestHosts::new();
    let _project = hosts.mock_project();
    let _loader = hosts.mock_loader();
    let config_dir = TempDir::new().unwrap();
    write_config(config_dir.path(), &hosts.config_toml());

    let mut cmd = oneclick_cmd();
    with_test_config(&mut cmd, config_dir.path());
    cmd.arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dragonhowl Pack"))
        .stdout(predicate::str::contains("v100"))
        .stdout(predicate::str::contains(BUNDLE_NAME))
        .stdout(predicate::str::contains(format!(
            "fabric-loader-{}-{}",
            LOADER_VERSION, GAME_VERSION
        )));
}
