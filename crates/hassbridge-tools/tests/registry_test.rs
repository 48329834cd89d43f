//! Registry tests with the Home Assistant tools against a mock server.
//!
//! Tests include:
//! - Tool registration and discovery
//! - Execution through the registry
//! - Argument errors that never reach the network
//! - Parallel execution

use std::sync::Arc;

use hassbridge_core::{ConnectionConfig, HassClient, MapSource, OperationKind};
use hassbridge_tools::{
    MUTATING_NOTE, Tool, ToolCall, ToolRegistry, ToolRegistryBuilder, format_for_llm,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry_for(server: &MockServer) -> ToolRegistry {
    let client = HassClient::with_config(ConnectionConfig::new(server.uri(), "tok"));
    ToolRegistryBuilder::new().with_hass_tools(client).build()
}

#[tokio::test]
async fn test_registry_has_every_operation() {
    let server = MockServer::start().await;
    let registry = registry_for(&server);

    assert_eq!(registry.len(), OperationKind::ALL.len());
    assert!(registry.has("ha_status"));
    assert!(registry.has("ha_get_calendar_events"));
    assert!(!registry.has("ha_reboot"));

    let names = registry.list();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let defs = registry.definitions_json().unwrap();
    assert_eq!(defs["tools"].as_array().unwrap().len(), OperationKind::ALL.len());
}

#[tokio::test]
async fn test_search_by_keyword() {
    let server = MockServer::start().await;
    let registry = registry_for(&server);

    let found = registry.search("calendar");
    let names: Vec<&str> = found.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["ha_get_calendar_events", "ha_list_calendars"]);
}

#[tokio::test]
async fn test_state_changing_tools_are_flagged() {
    let server = MockServer::start().await;
    let registry = registry_for(&server);

    let found = registry.search(MUTATING_NOTE);
    let names: Vec<&str> = found.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ha_call_service",
            "ha_delete_state",
            "ha_fire_event",
            "ha_handle_intent",
            "ha_set_state",
        ]
    );

    let status = registry.get("ha_status").unwrap();
    assert!(!status.description().contains(MUTATING_NOTE));
}

#[tokio::test]
async fn test_get_state_tool() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/light.living_room"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": "light.living_room",
            "state": "on",
            "attributes": {},
            "last_changed": "t1",
            "last_updated": "t1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = registry_for(&server)
        .execute("ha_get_state", json!({"entity_id": "light.living_room"}))
        .await
        .unwrap();

    assert!(output.success);
    assert_eq!(output.data["state"], "on");
    let metadata = output.metadata.unwrap();
    assert_eq!(metadata["status"], 200);
    assert!(metadata["latencyMs"].is_u64());
}

#[tokio::test]
async fn test_call_service_with_json_string_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(body_json(json!({"entity_id": "light.living_room"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let output = registry_for(&server)
        .execute(
            "ha_call_service",
            json!({
                "domain": "light",
                "service": "turn_on",
                "data": "{\"entity_id\": \"light.living_room\"}"
            }),
        )
        .await
        .unwrap();

    assert!(output.success);
    assert_eq!(output.data, json!([]));
}

#[tokio::test]
async fn test_malformed_json_never_reaches_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = registry_for(&server)
        .execute(
            "ha_call_service",
            json!({"domain": "light", "service": "turn_on", "data": "{\"entity_id\": "}),
        )
        .await
        .unwrap();

    assert!(!output.success);
    assert!(output.error.unwrap().contains("Invalid JSON in 'data'"));
    assert_eq!(output.metadata.unwrap()["status"], 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_http_failure_is_output_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/states/sensor.nope"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("Entity not found.", "text/plain"))
        .mount(&server)
        .await;

    let output = registry_for(&server)
        .execute("ha_get_state", json!({"entity_id": "sensor.nope"}))
        .await
        .unwrap();

    assert!(!output.success);
    assert!(output.error.unwrap().contains("404"));
}

#[tokio::test]
async fn test_unconfigured_client_fails_without_request() {
    let server = MockServer::start().await;
    let client = HassClient::with_source(Arc::new(MapSource::new()));
    let registry = ToolRegistryBuilder::new()
        .with_hass_tool(OperationKind::Status, client)
        .build();

    let output = registry.execute("ha_status", json!({})).await.unwrap();

    assert!(!output.success);
    assert!(output.error.unwrap().contains("HA_URL"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_parallel_execution() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "API running."})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/components"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["light", "http"])))
        .mount(&server)
        .await;

    let results = registry_for(&server)
        .execute_parallel(vec![
            ToolCall::new("ha_status", json!({})),
            ToolCall::new("ha_list_components", json!({})),
            ToolCall::new("ha_unknown", json!({})),
        ])
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].result.as_ref().unwrap().data["message"],
        "API running."
    );
    assert_eq!(
        results[1].result.as_ref().unwrap().data,
        json!(["light", "http"])
    );
    assert!(results[2].result.is_err());
}

#[tokio::test]
async fn test_format_for_llm_lists_parameters() {
    let server = MockServer::start().await;
    let registry = registry_for(&server);

    let text = format_for_llm(&registry.definitions());
    assert!(text.contains("`ha_call_service`"));
    assert!(text.contains("`domain`"));
    assert!(text.contains("object|string"));
}
