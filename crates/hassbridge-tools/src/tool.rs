//! Core tool trait and types for function calling.

use std::sync::Arc;

use async_trait::async_trait;
use hassbridge_core::ResultEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{Result, ToolError};

/// Tool execution result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the execution was successful
    pub success: bool,
    /// The result data
    pub data: Value,
    /// Optional error message if success is false
    pub error: Option<String>,
    /// Optional metadata
    pub metadata: Option<Value>,
}

impl ToolOutput {
    /// Create a successful output.
    pub fn success(data: impl Into<Value>) -> Self {
        Self {
            success: true,
            data: data.into(),
            error: None,
            metadata: None,
        }
    }

    /// Create a successful output with metadata.
    pub fn success_with_metadata(data: impl Into<Value>, metadata: Value) -> Self {
        Self {
            success: true,
            data: data.into(),
            error: None,
            metadata: Some(metadata),
        }
    }

    /// Create a failed output.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
            metadata: None,
        }
    }

    /// Create a failed output with metadata.
    pub fn error_with_metadata(error: impl Into<String>, metadata: Value) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
            metadata: Some(metadata),
        }
    }
}

impl From<ResultEnvelope<Value>> for ToolOutput {
    fn from(envelope: ResultEnvelope<Value>) -> Self {
        let metadata = serde_json::json!({
            "status": envelope.status,
            "latencyMs": envelope.latency_ms,
        });
        if envelope.ok {
            ToolOutput::success_with_metadata(envelope.data.unwrap_or(Value::Null), metadata)
        } else {
            let error = envelope
                .error
                .unwrap_or_else(|| format!("Request failed with status {}", envelope.status));
            ToolOutput::error_with_metadata(error, metadata)
        }
    }
}

/// Tool definition for LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Parameters as JSON Schema.
    pub parameters: Value,
    /// Grouping namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Tool trait for function calling.
///
/// Tools are callable functions that LLM agents can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get the tool description.
    fn description(&self) -> &str;

    /// Get the parameters as JSON Schema.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: Value) -> Result<ToolOutput>;

    /// Get the tool's namespace (optional, for grouping related tools).
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Get the full tool definition.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
            namespace: self.namespace().map(|s| s.to_string()),
        }
    }

    /// Validate arguments before execution.
    fn validate_args(&self, args: &Value) -> Result<()> {
        let params = self.parameters();
        let required = match params.get("required").and_then(|r| r.as_array()) {
            Some(required) if !required.is_empty() => required,
            _ => return Ok(()),
        };

        let args_obj = args
            .as_object()
            .ok_or_else(|| ToolError::InvalidArguments("Expected object".to_string()))?;

        for req in required.iter().filter_map(|r| r.as_str()) {
            if !args_obj.get(req).is_some_and(|v| !v.is_null()) {
                return Err(ToolError::InvalidArguments(format!(
                    "Missing required parameter: {}",
                    req
                )));
            }
        }
        Ok(())
    }
}

/// Dynamic tool wrapper for trait objects.
pub type DynTool = Arc<dyn Tool>;

/// Helper function to create a JSON object schema for parameters.
pub fn object_schema(properties: Value, required: Vec<String>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Helper function to create a simple property definition.
pub fn property(prop_type: &str, description: &str) -> Value {
    serde_json::json!({
        "type": prop_type,
        "description": description
    })
}

/// Helper function to create a string property.
pub fn string_property(description: &str) -> Value {
    property("string", description)
}

/// Helper function to create a number property.
pub fn number_property(description: &str) -> Value {
    property("number", description)
}

/// Helper function to create a boolean property.
pub fn boolean_property(description: &str) -> Value {
    property("boolean", description)
}

/// Helper function to create an array property.
pub fn array_property(item_type: &str, description: &str) -> Value {
    serde_json::json!({
        "type": "array",
        "items": {
            "type": item_type
        },
        "description": description
    })
}

/// A field that takes a JSON object or a string holding JSON text.
pub fn json_property(description: &str) -> Value {
    serde_json::json!({
        "type": ["object", "string"],
        "description": description
    })
}
