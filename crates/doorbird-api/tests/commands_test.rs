#![allow(clippy::unwrap_used)]
// Integration tests for the `DoorbirdClient` command operations using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doorbird_api::{DeviceConfig, DoorbirdClient, Error, MonitorState, Timing};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DoorbirdClient) {
    let server = MockServer::start().await;
    let mut config = DeviceConfig::new(server.uri(), "ghost", SecretString::from("s3cret"));
    config.timing = Timing {
        response_timeout: Duration::from_secs(2),
        heartbeat_interval: Duration::from_secs(5),
        reboot_cooldown: Duration::from_secs(5),
    };
    let client = DoorbirdClient::with_client(reqwest::Client::new(), config);
    (server, client)
}

fn info_body(primary_mac: Option<&str>) -> serde_json::Value {
    let mut version = json!({
        "FIRMWARE": "000125",
        "BUILD_NUMBER": "15870439",
        "WIFI_MAC_ADDR": "1CCAE3799999",
        "RELAYS": ["1", "gggaaa@1"],
        "DEVICE-TYPE": "DoorBird D2101V"
    });
    if let Some(mac) = primary_mac {
        version["PRIMARY_MAC_ADDR"] = json!(mac);
    }
    json!({ "BHA": { "RETURNCODE": "1", "VERSION": [version] } })
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

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_populates_identity() {
    let (server, client) = setup().await;
    mount_info(
        &server,
        ResponseTemplate::new(200).set_body_json(info_body(Some("1CCAE3700000"))),
    )
    .await;

    assert!(client.identity().is_none());
    assert!(client.login().await);

    let identity = client.identity().unwrap();
    assert_eq!(identity.mac.as_deref(), Some("1CCAE3700000"));
    assert_eq!(identity.device_type.as_deref(), Some("DoorBird D2101V"));
    assert_eq!(identity.firmware.as_deref(), Some("000125"));
    assert_eq!(identity.relays, vec!["1", "gggaaa@1"]);

    // Login is the trigger for the monitor.
    assert!(client.monitor_stats().is_some());
    client.shutdown();
}

#[tokio::test]
async fn test_login_falls_back_to_wifi_mac() {
    let (server, client) = setup().await;
    mount_info(&server, ResponseTemplate::new(200).set_body_json(info_body(None))).await;

    assert!(client.login().await);
    assert_eq!(client.identity().unwrap().mac.as_deref(), Some("1CCAE3799999"));
    client.shutdown();
}

#[tokio::test]
async fn test_label_uses_device_type_after_login() {
    let (server, client) = setup().await;
    mount_info(&server, ResponseTemplate::new(200).set_body_json(info_body(None))).await;

    let address = server.uri();
    assert_eq!(client.label(), address);

    assert!(client.login().await);
    assert_eq!(client.label(), format!("DoorBird D2101V@{address}"));
    client.shutdown();
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let (server, client) = setup().await;
    mount_info(&server, ResponseTemplate::new(401)).await;

    assert!(!client.login().await);
    assert!(client.identity().is_none());
    assert!(client.monitor_stats().is_none());
    assert_eq!(client.monitor_state(), MonitorState::Idle);

    let result = client.identify().await;
    assert!(
        matches!(result, Err(Error::InvalidCredentials)),
        "expected InvalidCredentials, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_malformed_body() {
    let (server, client) = setup().await;
    mount_info(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "NOT_BHA": {} })),
    )
    .await;

    assert!(!client.login().await);
    assert!(client.identity().is_none());
    assert!(client.monitor_stats().is_none());
    assert!(matches!(client.identify().await, Err(Error::MalformedBody { .. })));
}

#[tokio::test]
async fn test_login_non_json_body() {
    let (server, client) = setup().await;
    mount_info(&server, ResponseTemplate::new(200).set_body_string("<html></html>")).await;

    assert!(!client.login().await);
}

// ── Relays ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_trigger_actuator_success() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bha-api/open-door.cgi"))
        .and(query_param("r", "gggaaa@1"))
        .and(query_param("http-user", "ghost"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.trigger_actuator("gggaaa@1").await);
}

#[tokio::test]
async fn test_trigger_actuator_unknown_relay() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bha-api/open-door.cgi"))
        .and(query_param("r", "1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    // Anything that isn't mocked answers 404 from wiremock.
    assert!(!client.trigger_actuator("99").await);
}

// ── Night vision ────────────────────────────────────────────────────

#[tokio::test]
async fn test_activate_auxiliary_feature() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bha-api/light-on.cgi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.activate_auxiliary_feature().await);
}

#[tokio::test]
async fn test_activate_auxiliary_feature_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/bha-api/light-on.cgi"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!client.activate_auxiliary_feature().await);
}
