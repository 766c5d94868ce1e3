//! Integration tests for the `doorbird` CLI binary.
//!
//! Argument parsing, help, completions, and config handling run without a
//! device; the device commands run against a wiremock Doorbird.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `doorbird` binary with env isolation.
///
/// Clears all `DOORBIRD_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn doorbird_cmd(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("doorbird");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("RUST_LOG")
        .env_remove("DOORBIRD_PROFILE")
        .env_remove("DOORBIRD_ADDRESS")
        .env_remove("DOORBIRD_USERNAME")
        .env_remove("DOORBIRD_PASSWORD")
        .env_remove("DOORBIRD_INSECURE")
        .env_remove("DOORBIRD_CA_CERT")
        .env_remove("DOORBIRD_TIMEOUT")
        .env_remove("DOORBIRD_OUTPUT");
    cmd
}

fn isolated_cmd() -> (tempfile::TempDir, assert_cmd::Command) {
    let home = tempfile::tempdir().unwrap();
    let cmd = doorbird_cmd(home.path());
    (home, cmd)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary against `server` off the async runtime.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let uri = server.uri();
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    tokio::task::spawn_blocking(move || {
        let (_home, mut cmd) = isolated_cmd();
        cmd.args(["--address", &uri, "--user", "ghost", "--password", "s3cret"])
            .args(&args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

async fn mount_info(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/bha-api/info.cgi"))
        .and(query_param("http-user", "ghost"))
        .and(query_param("http-password", "s3cret"))
        .respond_with(template)
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_home, mut cmd) = isolated_cmd();
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    let (_home, mut cmd) = isolated_cmd();
    cmd.arg("--help").assert().success().stdout(
        predicate::str::contains("Doorbird")
            .and(predicate::str::contains("info"))
            .and(predicate::str::contains("open-door"))
            .and(predicate::str::contains("light-on"))
            .and(predicate::str::contains("monitor")),
    );
}

#[test]
fn test_version_flag() {
    let (_home, mut cmd) = isolated_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("doorbird"));
}

#[test]
fn test_completions_zsh() {
    let (_home, mut cmd) = isolated_cmd();
    cmd.args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_info_without_device_is_usage_error() {
    let (_home, mut cmd) = isolated_cmd();
    cmd.arg("info")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No device configured"));
}

#[test]
fn test_unknown_profile_is_reported() {
    let (_home, mut cmd) = isolated_cmd();
    cmd.args(["--profile", "garage", "info"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("garage"));
}

#[test]
fn test_address_without_credentials_is_auth_error() {
    let (_home, mut cmd) = isolated_cmd();
    cmd.args(["--address", "127.0.0.1:9", "info"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials"));
}

#[test]
fn test_invalid_output_format() {
    let (_home, mut cmd) = isolated_cmd();
    let output = cmd.args(["--output", "yaml", "info"]).output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_set_then_show_masks_nothing_it_did_not_store() {
    let home = tempfile::tempdir().unwrap();

    doorbird_cmd(home.path())
        .args(["--profile", "front", "config", "set", "address", "192.168.1.40"])
        .assert()
        .success();
    doorbird_cmd(home.path())
        .args(["--profile", "front", "config", "set", "username", "ghxxxx0001"])
        .assert()
        .success();

    doorbird_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("192.168.1.40")
                .and(predicate::str::contains("ghxxxx0001"))
                .and(predicate::str::contains("[profiles.front]")),
        );

    doorbird_cmd(home.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("front"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let (_home, mut cmd) = isolated_cmd();
    cmd.args(["config", "set", "colour", "blue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_use_missing_profile() {
    let (_home, mut cmd) = isolated_cmd();
    cmd.args(["config", "use", "nowhere"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nowhere"));
}

// ── Device commands ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_info_prints_identity_json() {
    let server = MockServer::start().await;
    mount_info(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "BHA": { "VERSION": [{
                "PRIMARY_MAC_ADDR": "1CCAE3700000",
                "DEVICE-TYPE": "DoorBird D2101V",
                "FIRMWARE": "000125",
                "RELAYS": ["1", "gggaaa@1"]
            }]}
        })),
    )
    .await;

    let output = run_against(&server, &["--output", "json", "info"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let identity: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(identity["mac"], "1CCAE3700000");
    assert_eq!(identity["device_type"], "DoorBird D2101V");
    assert_eq!(identity["relays"], json!(["1", "gggaaa@1"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_info_rejected_credentials_exit_code() {
    let server = MockServer::start().await;
    mount_info(&server, ResponseTemplate::new(401)).await;

    let output = run_against(&server, &["info"]).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("rejected the credentials"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_open_door_hits_relay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bha-api/open-door.cgi"))
        .and(query_param("r", "gggaaa@1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &["open-door", "gggaaa@1"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_light_on_failure_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bha-api/light-on.cgi"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let output = run_against(&server, &["light-on"]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("light-on"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_urls_embed_credentials() {
    let server = MockServer::start().await;

    let output = run_against(&server, &["urls"]).await;
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/bha-api/image.cgi?http-user=ghost&http-password=s3cret"));
    assert!(stdout.contains("/bha-api/video.cgi"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
