//! Dispatch of JSON-RPC requests to Home Assistant operations.

use hassbridge_core::{HassClient, OperationKind};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, METHOD_LIST, method_name,
    operation_for,
};

/// Routes `homeassistant.*` methods to a [`HassClient`].
///
/// Upstream failures come back as a Result Envelope with `ok: false` in
/// `result`. JSON-RPC errors are only used for malformed requests.
#[derive(Debug, Clone)]
pub struct RpcRouter {
    client: HassClient,
}

impl RpcRouter {
    pub fn new(client: HassClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &HassClient {
        &self.client
    }

    /// Handle one decoded request.
    pub async fn handle(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id;
        if request.jsonrpc != JSONRPC_VERSION {
            return JsonRpcResponse::error(
                JsonRpcError::invalid_request(format!(
                    "Unsupported jsonrpc version: {}",
                    request.jsonrpc
                )),
                id,
            );
        }

        if request.method == METHOD_LIST {
            return JsonRpcResponse::success(method_catalogue(), id);
        }

        let Some(kind) = operation_for(&request.method) else {
            return JsonRpcResponse::error(JsonRpcError::method_not_found(request.method), id);
        };

        let params = match request.params {
            None | Some(Value::Null) => Value::Null,
            Some(params @ Value::Object(_)) => params,
            Some(_) => {
                return JsonRpcResponse::error(
                    JsonRpcError::invalid_params("params must be an object"),
                    id,
                );
            }
        };

        tracing::debug!(method = %request.method, "Dispatching RPC request");
        let envelope = self.client.invoke(kind, &params).await;
        JsonRpcResponse::success(envelope.to_json(), id)
    }

    /// Handle one line of JSON text and return the serialized response.
    pub async fn handle_line(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Value>(line) {
            Err(e) => JsonRpcResponse::error(
                JsonRpcError::parse_error(format!("Parse error: {}", e)),
                Value::Null,
            ),
            Ok(value) => {
                let id = value.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value::<JsonRpcRequest>(value) {
                    Ok(request) => self.handle(request).await,
                    Err(e) => JsonRpcResponse::error(
                        JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
                        id,
                    ),
                }
            }
        };

        serde_json::to_string(&response).unwrap_or_else(|e| {
            json!({
                "jsonrpc": JSONRPC_VERSION,
                "error": {"code": crate::protocol::INTERNAL_ERROR, "message": e.to_string()},
                "id": Value::Null,
            })
            .to_string()
        })
    }

    /// Serve newline-delimited requests until `reader` reaches EOF.
    ///
    /// Each non-blank line gets exactly one response line.
    pub async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let response = self.handle_line(line).await;
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        tracing::debug!("RPC input closed");
        Ok(())
    }
}

/// `[{method, description}]` for every operation.
pub fn method_catalogue() -> Value {
    Value::Array(
        OperationKind::ALL
            .into_iter()
            .map(|kind| {
                json!({
                    "method": method_name(kind),
                    "description": kind.description(),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hassbridge_core::MapSource;
    use std::sync::Arc;

    fn unconfigured() -> RpcRouter {
        RpcRouter::new(HassClient::with_source(Arc::new(MapSource::new())))
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let line = unconfigured().handle_line("{not json").await;
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_missing_method_is_invalid_request() {
        let line = unconfigured().handle_line(r#"{"jsonrpc":"2.0","id":4}"#).await;
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["error"]["code"], -32600);
        assert_eq!(value["id"], 4);
    }

    #[tokio::test]
    async fn test_wrong_version() {
        let request = JsonRpcRequest {
            jsonrpc: "1.0".to_string(),
            method: "homeassistant.status".to_string(),
            params: None,
            id: json!(1),
        };
        let response = unconfigured().handle(request).await;
        assert_eq!(response.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let request = JsonRpcRequest::with_numeric_id("homeassistant.reboot", None, 2);
        let response = unconfigured().handle(request).await;
        assert_eq!(response.error.unwrap().code, -32601);
        assert_eq!(response.id, json!(2));
    }

    #[tokio::test]
    async fn test_non_object_params() {
        let request =
            JsonRpcRequest::with_numeric_id("homeassistant.get_state", Some(json!(["x"])), 3);
        let response = unconfigured().handle(request).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_method_list() {
        let request = JsonRpcRequest::with_numeric_id(METHOD_LIST, None, 1);
        let response = unconfigured().handle(request).await;
        let methods = response.result.unwrap();
        assert_eq!(methods.as_array().unwrap().len(), OperationKind::ALL.len());
        assert_eq!(methods[0]["method"], "homeassistant.status");
    }

    #[tokio::test]
    async fn test_unconfigured_returns_envelope() {
        let request = JsonRpcRequest::with_numeric_id("homeassistant.status", None, 9);
        let response = unconfigured().handle(request).await;

        assert!(response.is_success());
        let result = response.result.unwrap();
        assert_eq!(result["ok"], false);
        assert_eq!(result["status"], 0);
        assert!(result["error"].as_str().unwrap().contains("HA_URL"));
    }
}
