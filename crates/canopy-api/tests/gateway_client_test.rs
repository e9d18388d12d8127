#![allow(clippy::unwrap_used)]
// Integration tests for `GatewayClient` using wiremock.
//
// Call-count assertions (`expect(n)`) are the point here: the login
// throttle, the single-retry protocol, and the discovery cache are all
// specified in terms of how many network calls may happen.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use canopy_api::{Credentials, Error, GatewayClient, ProductKind, TransportConfig};

const LOGIN: &str = "/ulogin/mailLogin/v1";
const DEVICE_LIST: &str = "/udm/getDeviceList/v1";
const LAMP_SWITCH: &str = "/udm/lampSwitch/v1";
const ADJUST_LIGHT: &str = "/udm/adjustLight/v1";

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, GatewayClient) {
    let server = MockServer::start().await;
    let config = TransportConfig {
        base_url: Url::parse(&server.uri()).unwrap(),
        timeout: Duration::from_secs(5),
    };
    let credentials = Credentials::new("grower@example.com", SecretString::from("hunter2"));
    let client = GatewayClient::new(credentials, &config).unwrap();
    (server, client)
}

fn login_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": "000",
        "data": { "token": "tok-1" }
    }))
}

fn device_page(records: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": "000",
        "data": { "list": records }
    }))
}

fn reply(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "code": code, "msg": "mock" }))
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn login_success_then_query_logs_in_once() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .and(header_exists("systemData"))
        .respond_with(device_page(json!([{
            "id": "L1",
            "deviceName": "SP-3000",
            "deviceLightRate": 80,
            "isClose": false
        }])))
        .mount(&server)
        .await;

    client.login().await.unwrap();

    // The token is fresh: no second login for the query.
    let snapshot = client.light_data().await.unwrap();
    assert_eq!(snapshot.device_name, "SP-3000");
    assert_eq!(snapshot.brightness_percent, 80);
    assert!(!snapshot.is_closed);
}

#[tokio::test]
async fn login_failure_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let result = client.login().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn login_reply_without_token_is_authentication_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": "100", "msg": "password incorrect" })),
        )
        .mount(&server)
        .await;

    let result = client.login().await;
    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(
                message.contains("password incorrect"),
                "expected server message, got: {message}"
            );
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_login_burst_hits_network_once() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .expect(1)
        .mount(&server)
        .await;

    // The gate serializes the three calls; the throttle turns the second
    // and third into no-ops against the still-fresh token.
    let (a, b, c) = tokio::join!(client.login(), client.login(), client.login());
    a.unwrap();
    b.unwrap();
    c.unwrap();
}

// ── Discovery ───────────────────────────────────────────────────────

#[tokio::test]
async fn list_devices_parses_records() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .and(body_partial_json(json!({ "productType": "WIND", "currentPage": 0 })))
        .respond_with(device_page(json!([{
            "id": 42,
            "deviceName": "FC-E6000",
            "deviceLightRate": "55",
            "isClose": false,
            "humidity": "61.5",
            "temperature": 78.2
        }])))
        .mount(&server)
        .await;

    let records = client.list_devices(ProductKind::Fan).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "42");
    assert_eq!(records[0].device_light_rate, Some(55));
}

#[tokio::test]
async fn discovery_business_failure_yields_empty_list() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .respond_with(reply("500"))
        .mount(&server)
        .await;

    // Discovery failure is routine: empty list, not an error.
    let records = client.list_devices(ProductKind::Light).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn light_data_on_empty_list_is_none() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .respond_with(device_page(json!([])))
        .mount(&server)
        .await;

    assert_eq!(client.light_data().await, None);
}

#[tokio::test]
async fn fan_data_maps_snapshot_fields() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .respond_with(device_page(json!([{
            "id": "F7",
            "deviceName": "FC-E4000",
            "deviceLightRate": 40,
            "isClose": true,
            "humidity": 58,
            "temperature": "77.4",
            "deviceImg": "https://cdn.example/fan.png"
        }])))
        .mount(&server)
        .await;

    let snapshot = client.fan_data().await.unwrap();
    assert_eq!(snapshot.device_name, "FC-E4000");
    assert_eq!(snapshot.speed_percent, 40);
    assert_eq!(snapshot.humidity, Some(58.0));
    assert_eq!(snapshot.temperature_f, Some(77.4));
    assert!(snapshot.is_closed);
    assert_eq!(snapshot.image.as_deref(), Some("https://cdn.example/fan.png"));
}

#[tokio::test]
async fn malformed_json_is_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway error</html>"))
        .mount(&server)
        .await;

    let result = client.list_devices(ProductKind::Light).await;
    assert!(
        matches!(result, Err(Error::Decode { .. })),
        "expected Decode error, got: {result:?}"
    );
}

#[tokio::test]
async fn first_discovered_device_becomes_current() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .respond_with(device_page(json!([
            { "id": "A1", "deviceName": "SP-3000", "deviceLightRate": 60, "isClose": false },
            { "id": "B2", "deviceName": "SP-6500", "deviceLightRate": 90, "isClose": false }
        ])))
        .mount(&server)
        .await;

    // Only the first record's id may reach the command endpoint.
    Mock::given(method("POST"))
        .and(path(ADJUST_LIGHT))
        .and(body_partial_json(json!({ "deviceId": "A1" })))
        .respond_with(reply("000"))
        .expect(1)
        .mount(&server)
        .await;

    let records = client.list_devices(ProductKind::Light).await.unwrap();
    assert_eq!(records.len(), 2);

    let result = client.set_brightness(75).await.unwrap();
    assert!(result.is_success());
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn set_brightness_sends_exact_percent() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .respond_with(device_page(json!([
            { "id": "L1", "deviceName": "SP-3000", "deviceLightRate": 10, "isClose": false }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(ADJUST_LIGHT))
        .and(body_partial_json(json!({ "light": 57, "deviceId": "L1", "groupId": null })))
        .respond_with(reply("000"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.set_brightness(57).await.unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn set_fan_speed_does_not_clamp_below_adapter_floor() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    // 10% is below the host adapters' floor of 25%, but range policy is
    // the adapters' job: the core must pass the value through untouched.
    Mock::given(method("POST"))
        .and(path(ADJUST_LIGHT))
        .and(body_partial_json(json!({ "light": 10, "deviceId": "F9" })))
        .respond_with(reply("000"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.set_fan_speed(10, Some("F9")).await.unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn toggle_self_heals_missing_device_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(DEVICE_LIST))
        .and(body_partial_json(json!({ "productType": "LIGHT" })))
        .respond_with(device_page(json!([
            { "id": "L5", "deviceName": "SP-3000", "deviceLightRate": 50, "isClose": false }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LAMP_SWITCH))
        .and(body_partial_json(json!({ "isClose": true, "deviceId": "L5" })))
        .respond_with(reply("000"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.toggle(true, None).await.unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn business_failure_is_returned_as_data() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LAMP_SWITCH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": "201", "msg": "device offline" })),
        )
        .mount(&server)
        .await;

    let result = client.toggle(false, Some("L1")).await.unwrap();
    assert!(!result.is_success());
    assert_eq!(result.code, "201");
    assert_eq!(result.msg.as_deref(), Some("device offline"));
}

// ── Token-expiry retry protocol ─────────────────────────────────────

#[tokio::test]
async fn toggle_retries_exactly_once_after_token_expiry() {
    let (server, client) = setup().await;

    // Two logins total: the initial one and the forced re-login.
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .expect(2)
        .mount(&server)
        .await;

    // First toggle attempt: token expired.
    Mock::given(method("POST"))
        .and(path(LAMP_SWITCH))
        .respond_with(reply("102"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    // Retry after the forced re-login: success.
    Mock::given(method("POST"))
        .and(path(LAMP_SWITCH))
        .and(body_partial_json(json!({ "isClose": true, "deviceId": "X" })))
        .respond_with(reply("000"))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let result = client.toggle(true, Some("X")).await.unwrap();
    assert!(result.is_success());
}

#[tokio::test]
async fn second_token_expiry_is_returned_without_retry() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .expect(2)
        .mount(&server)
        .await;

    // Every attempt reports an expired token: exactly two command calls
    // (original + single retry), then the stale reply goes to the caller.
    Mock::given(method("POST"))
        .and(path(LAMP_SWITCH))
        .respond_with(reply("102"))
        .expect(2)
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let result = client.toggle(false, Some("X")).await.unwrap();
    assert!(result.is_token_expired());
}

// ── Gate helper ─────────────────────────────────────────────────────

#[tokio::test]
async fn serialized_runs_the_future_under_the_gate() {
    let (_server, client) = setup().await;

    let value = client.serialized(|| async { 21 * 2 }).await;
    assert_eq!(value, 42);
}

#[tokio::test]
async fn failed_forced_relogin_propagates() {
    let (server, client) = setup().await;

    // Initial login succeeds; the forced re-login is rejected.
    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(login_ok())
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LOGIN))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(LAMP_SWITCH))
        .respond_with(reply("102"))
        .expect(1)
        .mount(&server)
        .await;

    client.login().await.unwrap();
    let result = client.toggle(true, Some("X")).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}
