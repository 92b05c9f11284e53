//! CLI surface integration tests
//!
//! These cover argument parsing, help/version output, and the fatal
//! preconditions (`NotInstalled`, missing runtime) that must fail before any
//! privileged mutation happens. All external paths are redirected into temp
//! directories via MINER_* environment overrides.

use assert_cmd::Command;
use predicates::str as pred_str;
use tempfile::TempDir;

fn miner() -> Command {
    Command::cargo_bin("miner").unwrap()
}

#[test]
fn help_lists_subcommands() {
    miner()
        .arg("--help")
        .assert()
        .success()
        .stdout(pred_str::contains("install"))
        .stdout(pred_str::contains("daemon"))
        .stdout(pred_str::contains("uninstall"))
        .stdout(pred_str::contains("version"));
}

#[test]
fn version_subcommand_prints_version() {
    miner()
        .arg("version")
        .assert()
        .success()
        .stdout(pred_str::contains(format!(
            "Miner v{}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn version_flag_works() {
    miner().arg("--version").assert().success();
}

#[test]
fn daemon_without_install_fails_with_not_installed() {
    let tmp = TempDir::new().unwrap();
    let hosts = tmp.path().join("hosts");
    std::fs::write(&hosts, "127.0.0.1 localhost\n").unwrap();

    miner()
        .arg("daemon")
        .env("MINER_HOSTS_PATH", &hosts)
        .assert()
        .failure()
        .code(1)
        .stderr(pred_str::contains("not installed"))
        .stderr(pred_str::contains("miner install"));

    // No mutation happened: the hosts file is untouched
    let content = std::fs::read_to_string(&hosts).unwrap();
    assert_eq!(content, "127.0.0.1 localhost\n");
}

#[test]
fn daemon_with_missing_hosts_file_fails_with_not_installed() {
    let tmp = TempDir::new().unwrap();
    let hosts = tmp.path().join("hosts");

    miner()
        .arg("daemon")
        .env("MINER_HOSTS_PATH", &hosts)
        .assert()
        .failure()
        .code(1)
        .stderr(pred_str::contains("not installed"));
    assert!(!hosts.exists());
}

#[test]
fn daemon_with_missing_runtime_reports_dependency() {
    let tmp = TempDir::new().unwrap();
    let hosts = tmp.path().join("hosts");
    std::fs::write(&hosts, "127.0.0.1 miner.local\n").unwrap();

    miner()
        .arg("daemon")
        .env("MINER_HOSTS_PATH", &hosts)
        .env("MINER_RUNTIME", "definitely-not-a-real-program-xyz")
        .assert()
        .failure()
        .code(1)
        .stderr(pred_str::contains("not found on PATH"));
}

#[cfg(unix)]
#[test]
fn daemon_exits_nonzero_when_server_dies() {
    use std::os::unix::fs::PermissionsExt;
    let tmp = TempDir::new().unwrap();
    let hosts = tmp.path().join("hosts");
    std::fs::write(&hosts, "127.0.0.1 miner.local\n").unwrap();
    let assets = tmp.path().join("assets");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::write(assets.join("adminer.php"), "<?php\n").unwrap();

    // A runtime stub that dies right after launch, like a crashing server
    let runtime = tmp.path().join("fake-server");
    std::fs::write(&runtime, "#!/bin/sh\nexit 7\n").unwrap();
    std::fs::set_permissions(&runtime, std::fs::Permissions::from_mode(0o755)).unwrap();

    // Non-zero exit lets Restart=on-failure bring the service back
    miner()
        .arg("daemon")
        .env("MINER_HOSTS_PATH", &hosts)
        .env("MINER_ASSETS_DIR", &assets)
        .env("MINER_RUNTIME", &runtime)
        .assert()
        .failure()
        .code(1)
        .stderr(pred_str::contains("exited unexpectedly"));
}

#[test]
fn hosts_match_is_token_exact() {
    let tmp = TempDir::new().unwrap();
    let hosts = tmp.path().join("hosts");
    // miner.local appears only as a substring and inside a comment
    std::fs::write(
        &hosts,
        "# miner.local mentioned in a comment\n127.0.0.1 notminer.local.example\n",
    )
    .unwrap();

    miner()
        .arg("daemon")
        .env("MINER_HOSTS_PATH", &hosts)
        .assert()
        .failure()
        .stderr(pred_str::contains("not installed"));
}

#[test]
fn invalid_port_override_is_a_config_error() {
    miner()
        .arg("daemon")
        .env("MINER_PORT", "eighty-eight")
        .assert()
        .failure()
        .code(1)
        .stderr(pred_str::contains("MINER_PORT"));
}

#[test]
fn unknown_subcommand_is_rejected() {
    miner().arg("frobnicate").assert().failure();
}
