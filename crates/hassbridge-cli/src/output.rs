//! Human-readable rendering of result envelopes.

use hassbridge_core::{
    ApiMessage, CalendarEvent, CalendarInfo, ConfigCheck, EntityState, EventListener,
    OperationKind, ResultEnvelope, ServiceDomain,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Status line followed by the rendered data.
pub fn render(kind: OperationKind, envelope: &ResultEnvelope<Value>) -> String {
    if !envelope.ok {
        let status = if envelope.status == 0 {
            "no response".to_string()
        } else {
            format!("HTTP {}", envelope.status)
        };
        return format!(
            "✗ {} failed ({}, {}ms): {}",
            kind,
            status,
            envelope.latency_ms,
            envelope.error.as_deref().unwrap_or("unknown error")
        );
    }

    let header = format!(
        "✓ {} (HTTP {}, {}ms)",
        kind, envelope.status, envelope.latency_ms
    );
    match envelope.data.as_ref() {
        None | Some(Value::Null) => header,
        Some(data) => format!("{}\n{}", header, render_data(kind, data)),
    }
}

fn render_data(kind: OperationKind, data: &Value) -> String {
    let rendered = match kind {
        OperationKind::Status | OperationKind::FireEvent => {
            typed::<ApiMessage>(data).map(|m| m.message)
        }
        OperationKind::ListComponents => typed::<Vec<String>>(data).map(|mut names| {
            names.sort();
            names.join("\n")
        }),
        OperationKind::ListStates => typed::<Vec<EntityState>>(data).map(|s| states_table(&s)),
        OperationKind::GetState | OperationKind::SetState => {
            typed::<EntityState>(data).map(|s| entity_details(&s))
        }
        OperationKind::ListEvents => typed::<Vec<EventListener>>(data).map(|events| {
            events
                .iter()
                .map(|e| format!("{} ({} listeners)", e.event, e.listener_count))
                .collect::<Vec<_>>()
                .join("\n")
        }),
        OperationKind::ListServices => typed::<Vec<ServiceDomain>>(data).map(|domains| {
            domains
                .iter()
                .map(|d| format!("{}: {}", d.domain, d.service_names().join(", ")))
                .collect::<Vec<_>>()
                .join("\n")
        }),
        OperationKind::ListCalendars => typed::<Vec<CalendarInfo>>(data).map(|calendars| {
            calendars
                .iter()
                .map(|c| format!("{}  {}", c.entity_id, c.name))
                .collect::<Vec<_>>()
                .join("\n")
        }),
        OperationKind::GetCalendarEvents => typed::<Vec<CalendarEvent>>(data).map(|events| {
            events
                .iter()
                .map(|e| {
                    format!(
                        "{} → {}  {}",
                        e.start_str().unwrap_or("?"),
                        e.end_str().unwrap_or("?"),
                        e.summary
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }),
        OperationKind::CheckConfig => typed::<ConfigCheck>(data).map(|check| {
            let mut lines = vec![format!("result: {}", check.result)];
            if let Some(errors) = check.errors.filter(|e| !e.is_empty()) {
                lines.push(format!("errors: {}", errors));
            }
            if let Some(warnings) = check.warnings.filter(|w| !w.is_empty()) {
                lines.push(format!("warnings: {}", warnings));
            }
            lines.join("\n")
        }),
        _ => None,
    };

    rendered.unwrap_or_else(|| match data {
        // Text bodies (templates, error log) verbatim.
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    })
}

fn typed<T: DeserializeOwned>(data: &Value) -> Option<T> {
    serde_json::from_value(data.clone()).ok()
}

fn states_table(states: &[EntityState]) -> String {
    if states.is_empty() {
        return "(no entities)".to_string();
    }
    let id_width = states
        .iter()
        .map(|s| s.entity_id.chars().count())
        .max()
        .unwrap_or(0);
    let state_width = states
        .iter()
        .map(|s| state_with_unit(s).chars().count())
        .max()
        .unwrap_or(0);

    states
        .iter()
        .map(|s| {
            let line = format!(
                "{:<id_width$}  {:<state_width$}  {}",
                s.entity_id,
                state_with_unit(s),
                s.friendly_name().unwrap_or(""),
            );
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn state_with_unit(state: &EntityState) -> String {
    match state.unit() {
        Some(unit) => format!("{} {}", state.state, unit),
        None => state.state.clone(),
    }
}

fn entity_details(state: &EntityState) -> String {
    let mut lines = vec![
        format!("{}: {}", state.entity_id, state_with_unit(state)),
        format!("last changed: {}", state.last_changed),
    ];
    let mut keys: Vec<&String> = state.attributes.keys().collect();
    keys.sort();
    for key in keys {
        let value = &state.attributes[key.as_str()];
        let shown = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        lines.push(format!("  {}: {}", key, shown));
    }
    lines.join("\n")
}
