//! Tool registry for managing available tools.

use std::collections::HashMap;
use std::sync::Arc;

use hassbridge_core::{HassClient, OperationKind};
use serde_json::Value;

use super::error::{Result, ToolError};
use super::hass_tools::{self, HassTool};
use super::tool::{DynTool, ToolDefinition, ToolOutput};

/// Tool registry for managing available tools.
pub struct ToolRegistry {
    tools: HashMap<String, DynTool>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: DynTool) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Register multiple tools.
    pub fn register_all(&mut self, tools: Vec<DynTool>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&DynTool> {
        self.tools.get(name)
    }

    /// Check if a tool exists.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Get tool definitions as JSON (for LLM).
    pub fn definitions_json(&self) -> Result<Value> {
        let defs = self
            .definitions()
            .into_iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        Ok(serde_json::json!({ "tools": defs }))
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, args: Value) -> Result<ToolOutput> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.execute(args).await
    }

    /// Execute multiple tools concurrently. Results keep the order of `calls`.
    pub async fn execute_parallel(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        let tasks = calls.into_iter().map(|call| async move {
            let result = match self.get(&call.name) {
                Some(tool) => tool.execute(call.args).await,
                None => Err(ToolError::NotFound(call.name.clone())),
            };
            ToolResult {
                name: call.name,
                id: call.id,
                result,
            }
        });
        futures::future::join_all(tasks).await
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Search for tools by keyword.
    ///
    /// Searches tool names and descriptions for the given keyword.
    pub fn search(&self, keyword: &str) -> Vec<ToolDefinition> {
        let keyword_lower = keyword.to_lowercase();
        let mut found: Vec<ToolDefinition> = self
            .tools
            .values()
            .filter(|tool| {
                tool.name().to_lowercase().contains(&keyword_lower)
                    || tool.description().to_lowercase().contains(&keyword_lower)
            })
            .map(|t| t.definition())
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A tool call request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolCall {
    /// Tool name
    pub name: String,
    /// Tool arguments
    pub args: Value,
    /// Optional call ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ToolCall {
    /// Create a new tool call.
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
            id: None,
        }
    }

    /// Set the call ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Result of a tool execution.
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Tool name
    pub name: String,
    /// Call ID, copied from the request
    pub id: Option<String>,
    /// Execution result
    pub result: Result<ToolOutput>,
}

/// Builder for creating a tool registry.
///
/// # Example
///
/// ```rust,no_run
/// use hassbridge_core::HassClient;
/// use hassbridge_tools::ToolRegistryBuilder;
///
/// let registry = ToolRegistryBuilder::new()
///     .with_hass_tools(HassClient::from_env())
///     .build();
/// assert!(registry.has("ha_call_service"));
/// ```
pub struct ToolRegistryBuilder {
    registry: ToolRegistry,
}

impl ToolRegistryBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::new(),
        }
    }

    /// Add a custom tool.
    pub fn with_tool(mut self, tool: DynTool) -> Self {
        self.registry.register(tool);
        self
    }

    /// Add one tool per Home Assistant operation.
    pub fn with_hass_tools(mut self, client: HassClient) -> Self {
        self.registry.register_all(hass_tools::all_tools(&client));
        self
    }

    /// Add the tool for a single Home Assistant operation.
    pub fn with_hass_tool(self, kind: OperationKind, client: HassClient) -> Self {
        self.with_tool(Arc::new(HassTool::new(kind, client)))
    }

    /// Build the registry.
    pub fn build(self) -> ToolRegistry {
        self.registry
    }
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render tool definitions as a plain-text catalogue for a prompt.
pub fn format_for_llm(definitions: &[ToolDefinition]) -> String {
    let mut result = String::from("Available tools\n");
    result.push_str(&"=".repeat(40));
    result.push_str("\n\n");

    for def in definitions {
        result.push_str(&format!("**Tool**: `{}`\n", def.name));
        result.push_str(&format!("**Description**: {}\n", def.description));

        let required: Vec<&str> = def
            .parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        match def.parameters.get("properties").and_then(|p| p.as_object()) {
            Some(props) if !props.is_empty() => {
                result.push_str("**Parameters**:\n");
                for (name, prop) in props {
                    let desc = prop
                        .get("description")
                        .and_then(|d| d.as_str())
                        .unwrap_or("No description");
                    let type_name = match prop.get("type") {
                        Some(Value::String(t)) => t.clone(),
                        Some(Value::Array(types)) => types
                            .iter()
                            .filter_map(|t| t.as_str())
                            .collect::<Vec<_>>()
                            .join("|"),
                        _ => "unknown".to_string(),
                    };
                    result.push_str(&format!("  - `{}`: {} ({})", name, desc, type_name));
                    if required.contains(&name.as_str()) {
                        result.push_str(" **[required]**");
                    }
                    result.push('\n');
                }
            }
            _ => result.push_str("**Parameters**: none\n"),
        }

        result.push('\n');
    }

    result
}
