//! Home Assistant REST types.
//!
//! Only fixed-shape responses are typed here. Service data, event payloads,
//! history and logbook stay `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{"message": "..."}` replies (API status, fired events).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

/// Server information from `/api/config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub location_name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub time_zone: String,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub elevation: Option<f64>,

    /// Unit system (length, mass, temperature, volume...)
    #[serde(default)]
    pub unit_system: Map<String, Value>,

    /// Loaded components
    #[serde(default)]
    pub components: Vec<String>,

    /// Startup state (e.g. `RUNNING`)
    #[serde(default)]
    pub state: Option<String>,

    /// All other fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entity state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Entity ID (e.g., light.living_room)
    pub entity_id: String,

    /// Current state value
    pub state: String,

    /// Entity attributes
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// Last changed timestamp
    #[serde(default)]
    pub last_changed: String,

    /// Last updated timestamp
    #[serde(default)]
    pub last_updated: String,

    /// Context of the last change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<StateContext>,
}

impl EntityState {
    /// Domain part of the entity ID (`light` for `light.kitchen`).
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map(|(domain, _)| domain)
            .unwrap_or(&self.entity_id)
    }

    /// `friendly_name` attribute, if set.
    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(|v| v.as_str())
    }

    /// `unit_of_measurement` attribute, if set.
    pub fn unit(&self) -> Option<&str> {
        self.attributes
            .get("unit_of_measurement")
            .and_then(|v| v.as_str())
    }
}

/// Context for tracking entity changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateContext {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Body for creating or updating a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
}

impl StateUpdate {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: None,
        }
    }

    pub fn with_attributes(mut self, attributes: Value) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Entry of `/api/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListener {
    pub event: String,
    #[serde(default)]
    pub listener_count: u64,
}

/// Entry of `/api/services`: a domain and its services keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDomain {
    pub domain: String,
    #[serde(default)]
    pub services: Map<String, Value>,
}

impl ServiceDomain {
    /// Service names, sorted.
    pub fn service_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Entry of `/api/calendars`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub entity_id: String,
    #[serde(default)]
    pub name: String,
}

/// Calendar event. `start`/`end` are `{"dateTime": ..}` or `{"date": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub start: Value,
    #[serde(default)]
    pub end: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrule: Option<String>,
}

impl CalendarEvent {
    /// Start as a display string (`dateTime`, else `date`).
    pub fn start_str(&self) -> Option<&str> {
        time_field(&self.start)
    }

    /// End as a display string (`dateTime`, else `date`).
    pub fn end_str(&self) -> Option<&str> {
        time_field(&self.end)
    }
}

fn time_field(value: &Value) -> Option<&str> {
    value
        .get("dateTime")
        .or_else(|| value.get("date"))
        .and_then(|v| v.as_str())
        .or_else(|| value.as_str())
}

/// Result of `/api/config/core/check_config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigCheck {
    /// `valid` or `invalid`
    pub result: String,
    #[serde(default)]
    pub errors: Option<String>,
    #[serde(default)]
    pub warnings: Option<String>,
}

impl ConfigCheck {
    pub fn is_valid(&self) -> bool {
        self.result == "valid"
    }
}

/// Body for `/api/template`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRequest {
    pub template: String,
}

/// Body for `/api/intent/handle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl IntentRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_state_parsing() {
        let state: EntityState = serde_json::from_value(json!({
            "entity_id": "sensor.outside_temperature",
            "state": "21.5",
            "attributes": {
                "friendly_name": "Outside Temperature",
                "unit_of_measurement": "°C"
            },
            "last_changed": "2024-05-01T10:00:00+00:00",
            "last_updated": "2024-05-01T10:00:00+00:00",
            "context": {"id": "01HX", "user_id": null, "parent_id": null}
        }))
        .unwrap();

        assert_eq!(state.domain(), "sensor");
        assert_eq!(state.friendly_name(), Some("Outside Temperature"));
        assert_eq!(state.unit(), Some("°C"));
        assert_eq!(state.context.unwrap().id, "01HX");
    }

    #[test]
    fn test_domain_without_dot() {
        let state: EntityState =
            serde_json::from_value(json!({"entity_id": "weird", "state": "x"})).unwrap();
        assert_eq!(state.domain(), "weird");
        assert!(state.friendly_name().is_none());
    }

    #[test]
    fn test_server_config_keeps_extra_fields() {
        let config: ServerConfig = serde_json::from_value(json!({
            "location_name": "Home",
            "version": "2024.5.0",
            "time_zone": "Europe/Berlin",
            "components": ["light", "http"],
            "unit_system": {"temperature": "°C"},
            "currency": "EUR"
        }))
        .unwrap();

        assert_eq!(config.version, "2024.5.0");
        assert_eq!(config.components.len(), 2);
        assert_eq!(config.extra.get("currency"), Some(&json!("EUR")));
    }

    #[test]
    fn test_calendar_event_times() {
        let timed: CalendarEvent = serde_json::from_value(json!({
            "summary": "Dentist",
            "start": {"dateTime": "2024-05-02T09:00:00+02:00"},
            "end": {"dateTime": "2024-05-02T10:00:00+02:00"}
        }))
        .unwrap();
        assert_eq!(timed.start_str(), Some("2024-05-02T09:00:00+02:00"));

        let all_day: CalendarEvent = serde_json::from_value(json!({
            "summary": "Holiday",
            "start": {"date": "2024-05-09"},
            "end": {"date": "2024-05-10"}
        }))
        .unwrap();
        assert_eq!(all_day.end_str(), Some("2024-05-10"));
    }

    #[test]
    fn test_service_names_sorted() {
        let domain: ServiceDomain = serde_json::from_value(json!({
            "domain": "light",
            "services": {"turn_on": {}, "toggle": {}, "turn_off": {}}
        }))
        .unwrap();
        assert_eq!(domain.service_names(), vec!["toggle", "turn_off", "turn_on"]);
    }

    #[test]
    fn test_request_bodies_skip_empty_fields() {
        let update = serde_json::to_value(StateUpdate::new("on")).unwrap();
        assert_eq!(update, json!({"state": "on"}));

        let intent = IntentRequest::new("SetTimer").with_data(json!({"seconds": 30}));
        assert_eq!(
            serde_json::to_value(intent).unwrap(),
            json!({"name": "SetTimer", "data": {"seconds": 30}})
        );
    }
}
