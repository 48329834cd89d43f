//! Home Assistant tools for agent function calling.
//!
//! - **Tool Trait**: unified interface for tool implementation
//! - **Home Assistant Tools**: one `ha_<operation>` tool per REST operation
//! - **Tool Registry**: register, look up and execute tools
//! - **LLM Integration**: tool definitions as JSON or prompt text
//!
//! ## Example
//!
//! ```rust,no_run
//! use hassbridge_core::HassClient;
//! use hassbridge_tools::ToolRegistryBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ToolRegistryBuilder::new()
//!         .with_hass_tools(HassClient::from_env())
//!         .build();
//!
//!     let output = registry
//!         .execute(
//!             "ha_call_service",
//!             serde_json::json!({
//!                 "domain": "light",
//!                 "service": "turn_on",
//!                 "data": {"entity_id": "light.kitchen"}
//!             }),
//!         )
//!         .await?;
//!
//!     println!("{:?}", output);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod hass_tools;
pub mod registry;
pub mod tool;

pub use error::{Result, ToolError};
pub use hass_tools::{
    HassTool, MUTATING_NOTE, NAMESPACE, TOOL_PREFIX, parameters_for, tool_description, tool_name,
};
pub use registry::{ToolCall, ToolRegistry, ToolRegistryBuilder, ToolResult, format_for_llm};
pub use tool::{
    DynTool, Tool, ToolDefinition, ToolOutput, array_property, boolean_property, json_property,
    number_property, object_schema, property, string_property,
};
