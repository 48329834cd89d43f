//! Request descriptors for each Home Assistant endpoint.
//!
//! Shared by the typed [`HassClient`](crate::HassClient) methods and the
//! dynamic operation catalogue, so both hit exactly the same requests.

use serde_json::{Value, json};

use crate::entities::{IntentRequest, StateUpdate, TemplateRequest};
use crate::error::Result;
use crate::http::RequestDescriptor;
use crate::query::{self, CalendarQuery, HistoryQuery, LogbookQuery};

pub fn status() -> RequestDescriptor {
    RequestDescriptor::get("/api/")
}

pub fn config() -> RequestDescriptor {
    RequestDescriptor::get("/api/config")
}

pub fn components() -> RequestDescriptor {
    RequestDescriptor::get("/api/components")
}

pub fn check_config() -> RequestDescriptor {
    RequestDescriptor::post("/api/config/core/check_config").with_body(json!({}))
}

pub fn error_log() -> RequestDescriptor {
    RequestDescriptor::get("/api/error_log")
}

pub fn states() -> RequestDescriptor {
    RequestDescriptor::get("/api/states")
}

pub fn state(entity_id: &str) -> RequestDescriptor {
    RequestDescriptor::get(query::state_path(entity_id))
}

pub fn set_state(entity_id: &str, update: &StateUpdate) -> Result<RequestDescriptor> {
    let body = serde_json::to_value(update)?;
    Ok(RequestDescriptor::post(query::state_path(entity_id)).with_body(body))
}

pub fn delete_state(entity_id: &str) -> RequestDescriptor {
    RequestDescriptor::delete(query::state_path(entity_id))
}

pub fn events() -> RequestDescriptor {
    RequestDescriptor::get("/api/events")
}

/// Without data an empty object is sent.
pub fn fire_event(event_type: &str, data: Option<Value>) -> RequestDescriptor {
    RequestDescriptor::post(query::event_path(event_type))
        .with_body(data.unwrap_or_else(|| json!({})))
}

pub fn services() -> RequestDescriptor {
    RequestDescriptor::get("/api/services")
}

/// Without data an empty object is sent.
pub fn call_service(
    domain: &str,
    service: &str,
    data: Option<Value>,
    return_response: bool,
) -> RequestDescriptor {
    RequestDescriptor::post(query::service_path(domain, service, return_response))
        .with_body(data.unwrap_or_else(|| json!({})))
}

pub fn history(query: &HistoryQuery) -> RequestDescriptor {
    RequestDescriptor::get(query.path())
}

pub fn logbook(query: &LogbookQuery) -> RequestDescriptor {
    RequestDescriptor::get(query.path())
}

pub fn calendars() -> RequestDescriptor {
    RequestDescriptor::get("/api/calendars")
}

pub fn calendar_events(query: &CalendarQuery) -> RequestDescriptor {
    RequestDescriptor::get(query.path())
}

pub fn render_template(template: &str) -> Result<RequestDescriptor> {
    let body = serde_json::to_value(TemplateRequest {
        template: template.to_string(),
    })?;
    Ok(RequestDescriptor::post("/api/template").with_body(body))
}

pub fn handle_intent(intent: &IntentRequest) -> Result<RequestDescriptor> {
    let body = serde_json::to_value(intent)?;
    Ok(RequestDescriptor::post("/api/intent/handle").with_body(body))
}
