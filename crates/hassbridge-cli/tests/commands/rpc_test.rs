//! Tests for the `rpc` command.

use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::hassbridge;

/// Test that rpc command can be invoked.
#[test]
fn test_rpc_command_exists() {
    hassbridge()
        .args(["rpc", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("JSON-RPC"));
}

#[test]
fn test_rpc_empty_input_exits_cleanly() {
    hassbridge().arg("rpc").write_stdin("").assert().success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rpc_over_stdio() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "API running."})))
        .mount(&server)
        .await;

    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"homeassistant.status"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"homeassistant.unknown"}"#,
        "\n",
    );

    let output = hassbridge()
        .env("HA_URL", server.uri())
        .env("HA_TOKEN", "tok")
        .arg("rpc")
        .write_stdin(input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let responses: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[0]["result"]["ok"], true);
    assert_eq!(responses[0]["result"]["data"]["message"], "API running.");
    assert_eq!(responses[1]["error"]["code"], -32601);
}
