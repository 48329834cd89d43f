//! One agent tool per Home Assistant operation.

use async_trait::async_trait;
use hassbridge_core::{HassClient, OperationKind};
use serde_json::{Map, Value, json};

use super::error::Result;
use super::tool::{
    DynTool, Tool, ToolOutput, array_property, boolean_property, json_property, number_property,
    object_schema, string_property,
};

/// Prefix shared by every Home Assistant tool name.
pub const TOOL_PREFIX: &str = "ha_";

/// Namespace reported in tool definitions.
pub const NAMESPACE: &str = "homeassistant";

/// Appended to the description of tools that change state.
pub const MUTATING_NOTE: &str = "[changes Home Assistant state]";

/// Tool wrapping a single [`OperationKind`].
#[derive(Debug, Clone)]
pub struct HassTool {
    kind: OperationKind,
    name: String,
    description: String,
    client: HassClient,
}

impl HassTool {
    pub fn new(kind: OperationKind, client: HassClient) -> Self {
        Self {
            kind,
            name: tool_name(kind),
            description: tool_description(kind),
            client,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

/// `ha_<operation>`
pub fn tool_name(kind: OperationKind) -> String {
    format!("{}{}", TOOL_PREFIX, kind.name())
}

/// Operation description, flagged when the call changes Home Assistant.
pub fn tool_description(kind: OperationKind) -> String {
    if kind.is_mutating() {
        format!("{} {}", kind.description(), MUTATING_NOTE)
    } else {
        kind.description().to_string()
    }
}

/// Tools for every operation, sharing one client.
pub fn all_tools(client: &HassClient) -> Vec<DynTool> {
    OperationKind::ALL
        .into_iter()
        .map(|kind| std::sync::Arc::new(HassTool::new(kind, client.clone())) as DynTool)
        .collect()
}

#[async_trait]
impl Tool for HassTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        parameters_for(self.kind)
    }

    fn namespace(&self) -> Option<&str> {
        Some(NAMESPACE)
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput> {
        tracing::debug!(tool = %self.name, "Executing Home Assistant tool");
        let envelope = self.client.invoke(self.kind, &args).await;
        if !envelope.ok {
            tracing::warn!(
                tool = %self.name,
                status = envelope.status,
                error = envelope.error.as_deref().unwrap_or(""),
                "Home Assistant tool failed"
            );
        }
        Ok(envelope.into())
    }
}

fn req(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn window_properties() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert(
        "start_time".to_string(),
        string_property("ISO 8601 start of the window. Defaults to one day ago."),
    );
    props.insert(
        "end_time".to_string(),
        string_property("ISO 8601 end of the window."),
    );
    props.insert(
        "hours".to_string(),
        number_property("Window start as hours before now, used when start_time is absent."),
    );
    props
}

/// JSON Schema of the arguments accepted by `kind`.
pub fn parameters_for(kind: OperationKind) -> Value {
    match kind {
        OperationKind::Status
        | OperationKind::GetConfig
        | OperationKind::ListComponents
        | OperationKind::ListEvents
        | OperationKind::GetErrorLog
        | OperationKind::ListCalendars
        | OperationKind::CheckConfig => object_schema(json!({}), vec![]),
        OperationKind::ListStates => object_schema(
            json!({"domain": string_property("Only entities of this domain, e.g. 'light' or 'sensor'.")}),
            vec![],
        ),
        OperationKind::GetState | OperationKind::DeleteState => object_schema(
            json!({"entity_id": string_property("Entity ID, e.g. 'light.living_room'.")}),
            req(&["entity_id"]),
        ),
        OperationKind::SetState => object_schema(
            json!({
                "entity_id": string_property("Entity ID, e.g. 'sensor.kitchen_temperature'."),
                "state": string_property("New state value."),
                "attributes": json_property("Attributes object, or a JSON string of one."),
            }),
            req(&["entity_id", "state"]),
        ),
        OperationKind::FireEvent => object_schema(
            json!({
                "event_type": string_property("Event type, e.g. 'my_custom_event'."),
                "data": json_property("Event data object, or a JSON string of one."),
            }),
            req(&["event_type"]),
        ),
        OperationKind::ListServices => object_schema(
            json!({"domain": string_property("Only services of this domain.")}),
            vec![],
        ),
        OperationKind::CallService => object_schema(
            json!({
                "domain": string_property("Service domain, e.g. 'light'."),
                "service": string_property("Service name, e.g. 'turn_on'."),
                "data": json_property("Service data such as {\"entity_id\": \"light.kitchen\"}, or a JSON string of it."),
                "return_response": boolean_property("Ask the service to return its response data."),
            }),
            req(&["domain", "service"]),
        ),
        OperationKind::GetHistory => {
            let mut props = window_properties();
            props.insert(
                "entity_ids".to_string(),
                array_property("string", "Entity IDs to include. A comma-separated string also works."),
            );
            props.insert(
                "minimal_response".to_string(),
                boolean_property("Only return last_changed and state for intermediate states."),
            );
            props.insert(
                "no_attributes".to_string(),
                boolean_property("Skip attributes for faster responses."),
            );
            props.insert(
                "significant_changes_only".to_string(),
                boolean_property("Only return significant state changes."),
            );
            object_schema(Value::Object(props), vec![])
        }
        OperationKind::GetLogbook => {
            let mut props = window_properties();
            props.insert(
                "entity_id".to_string(),
                string_property("Only entries for this entity."),
            );
            object_schema(Value::Object(props), vec![])
        }
        OperationKind::GetCalendarEvents => object_schema(
            json!({
                "calendar_id": string_property("Calendar entity ID, e.g. 'calendar.family'."),
                "start": string_property("ISO 8601 start. Defaults to now."),
                "end": string_property("ISO 8601 end. Defaults to seven days from now."),
            }),
            req(&["calendar_id"]),
        ),
        OperationKind::RenderTemplate => object_schema(
            json!({"template": string_property("Jinja2 template, e.g. \"{{ states('sun.sun') }}\".")}),
            req(&["template"]),
        ),
        OperationKind::HandleIntent => object_schema(
            json!({
                "name": string_property("Intent name, e.g. 'HassTurnOn'."),
                "data": json_property("Intent slot data object, or a JSON string of one."),
            }),
            req(&["name"]),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hassbridge_core::ConnectionConfig;

    fn client() -> HassClient {
        HassClient::with_config(ConnectionConfig::new("http://127.0.0.1:9", "tok"))
    }

    #[test]
    fn test_tool_names() {
        let tool = HassTool::new(OperationKind::GetState, client());
        assert_eq!(tool.name(), "ha_get_state");
        assert_eq!(tool.namespace(), Some("homeassistant"));
        assert_eq!(tool.definition().namespace.as_deref(), Some("homeassistant"));
    }

    #[test]
    fn test_every_schema_is_an_object() {
        for kind in OperationKind::ALL {
            let schema = parameters_for(kind);
            assert_eq!(schema["type"], "object", "{}", kind);
            assert!(schema["properties"].is_object(), "{}", kind);
            for required in schema["required"].as_array().unwrap() {
                let name = required.as_str().unwrap();
                assert!(schema["properties"].get(name).is_some(), "{}: {}", kind, name);
            }
        }
    }

    #[test]
    fn test_history_schema_fields() {
        let schema = parameters_for(OperationKind::GetHistory);
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("entity_ids"));
        assert!(props.contains_key("hours"));
        assert!(!props.contains_key("entity_id"));
    }

    #[test]
    fn test_all_tools_unique() {
        let tools = all_tools(&client());
        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), OperationKind::ALL.len());
    }
}
