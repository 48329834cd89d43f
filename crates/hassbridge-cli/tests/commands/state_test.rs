//! Tests for the operation commands against a mock Home Assistant server.

use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::hassbridge;

fn living_room() -> serde_json::Value {
    json!({
        "entity_id": "light.living_room",
        "state": "on",
        "attributes": {"friendly_name": "Living Room", "brightness": 180},
        "last_changed": "2024-05-01T10:00:00+00:00",
        "last_updated": "2024-05-01T10:00:00+00:00"
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_human_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/light.living_room"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(living_room()))
        .expect(1)
        .mount(&server)
        .await;

    hassbridge()
        .env("HA_URL", server.uri())
        .env("HA_TOKEN", "tok")
        .args(["state", "light.living_room"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ get_state (HTTP 200"))
        .stdout(predicate::str::contains("light.living_room: on"))
        .stdout(predicate::str::contains("friendly_name: Living Room"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_state_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/light.living_room"))
        .respond_with(ResponseTemplate::new(200).set_body_json(living_room()))
        .mount(&server)
        .await;

    let output = hassbridge()
        .args(["--url", &server.uri(), "--token", "tok", "--json"])
        .args(["state", "light.living_room"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["ok"], true);
    assert_eq!(envelope["status"], 200);
    assert_eq!(envelope["data"]["state"], "on");
    assert!(envelope["latencyMs"].is_u64());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_output_keeps_upstream_fields() {
    let server = MockServer::start().await;
    let mut body = living_room();
    body["last_reported"] = json!("2024-05-01T10:05:00+00:00");
    body["context"] = json!({"id": "01HX", "parent_id": null, "user_id": null});
    Mock::given(method("GET"))
        .and(path("/api/states/light.living_room"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&server)
        .await;

    let output = hassbridge()
        .args(["--url", &server.uri(), "--token", "tok", "--json"])
        .args(["state", "light.living_room"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["data"], body);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_call_service_posts_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(body_json(json!({"entity_id": "light.living_room"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([living_room()])))
        .expect(1)
        .mount(&server)
        .await;

    hassbridge()
        .env("HA_URL", server.uri())
        .env("HA_TOKEN", "tok")
        .args([
            "call",
            "light",
            "turn_on",
            "--data",
            r#"{"entity_id":"light.living_room"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ call_service"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_template_prints_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/template"))
        .and(body_json(json!({"template": "{{ 1 + 1 }}"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw("2", "text/plain"))
        .mount(&server)
        .await;

    hassbridge()
        .env("HA_URL", server.uri())
        .env("HA_TOKEN", "tok")
        .args(["template", "{{ 1 + 1 }}"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("\n2\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_http_error_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/sensor.nope"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("Entity not found.", "text/plain"))
        .mount(&server)
        .await;

    hassbridge()
        .env("HA_URL", server.uri())
        .env("HA_TOKEN", "tok")
        .args(["state", "sensor.nope"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("HTTP 404: Entity not found."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_timeout_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "API running."}))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    hassbridge()
        .args(["--url", &server.uri(), "--token", "tok", "--timeout-ms", "50"])
        .arg("status")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("timed out after 50ms"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_states_domain_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            living_room(),
            {"entity_id": "sensor.temp", "state": "21", "attributes": {}}
        ])))
        .mount(&server)
        .await;

    hassbridge()
        .env("HA_URL", server.uri())
        .env("HA_TOKEN", "tok")
        .args(["states", "--domain", "light"])
        .assert()
        .success()
        .stdout(predicate::str::contains("light.living_room"))
        .stdout(predicate::str::contains("sensor.temp").not());
}
