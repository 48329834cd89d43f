//! Operation catalogue shared by the tool, RPC and CLI surfaces.
//!
//! Arguments arrive as a JSON object whose JSON-typed fields may be either a
//! JSON value or a JSON string. Argument problems are reported as a
//! validation failure before any request is built.

use serde_json::{Map, Value};

use crate::client::HassClient;
use crate::entities::{IntentRequest, StateUpdate};
use crate::envelope::ResultEnvelope;
use crate::error::{Error, Result};
use crate::http::RequestDescriptor;
use crate::query::{self, CalendarQuery, HistoryQuery, LogbookQuery};
use crate::requests;

/// Default calendar window when no bounds are given.
pub const DEFAULT_CALENDAR_DAYS: i64 = 7;

/// Every Home Assistant operation exposed by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Status,
    GetConfig,
    ListComponents,
    ListStates,
    GetState,
    SetState,
    DeleteState,
    ListEvents,
    FireEvent,
    ListServices,
    CallService,
    GetHistory,
    GetLogbook,
    GetErrorLog,
    ListCalendars,
    GetCalendarEvents,
    RenderTemplate,
    CheckConfig,
    HandleIntent,
}

impl OperationKind {
    pub const ALL: [OperationKind; 19] = [
        OperationKind::Status,
        OperationKind::GetConfig,
        OperationKind::ListComponents,
        OperationKind::ListStates,
        OperationKind::GetState,
        OperationKind::SetState,
        OperationKind::DeleteState,
        OperationKind::ListEvents,
        OperationKind::FireEvent,
        OperationKind::ListServices,
        OperationKind::CallService,
        OperationKind::GetHistory,
        OperationKind::GetLogbook,
        OperationKind::GetErrorLog,
        OperationKind::ListCalendars,
        OperationKind::GetCalendarEvents,
        OperationKind::RenderTemplate,
        OperationKind::CheckConfig,
        OperationKind::HandleIntent,
    ];

    /// Stable snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Status => "status",
            OperationKind::GetConfig => "get_config",
            OperationKind::ListComponents => "list_components",
            OperationKind::ListStates => "list_states",
            OperationKind::GetState => "get_state",
            OperationKind::SetState => "set_state",
            OperationKind::DeleteState => "delete_state",
            OperationKind::ListEvents => "list_events",
            OperationKind::FireEvent => "fire_event",
            OperationKind::ListServices => "list_services",
            OperationKind::CallService => "call_service",
            OperationKind::GetHistory => "get_history",
            OperationKind::GetLogbook => "get_logbook",
            OperationKind::GetErrorLog => "get_error_log",
            OperationKind::ListCalendars => "list_calendars",
            OperationKind::GetCalendarEvents => "get_calendar_events",
            OperationKind::RenderTemplate => "render_template",
            OperationKind::CheckConfig => "check_config",
            OperationKind::HandleIntent => "handle_intent",
        }
    }

    /// Look up a kind by its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// One-line description.
    pub fn description(&self) -> &'static str {
        match self {
            OperationKind::Status => "Check that the Home Assistant API is reachable and running.",
            OperationKind::GetConfig => {
                "Get Home Assistant server configuration (version, location, time zone, units)."
            }
            OperationKind::ListComponents => "List the integrations currently loaded.",
            OperationKind::ListStates => {
                "List entity states, optionally only those of one domain (e.g. light)."
            }
            OperationKind::GetState => "Get the current state and attributes of one entity.",
            OperationKind::SetState => {
                "Create or update the state representation of an entity. Does not control the device."
            }
            OperationKind::DeleteState => "Remove an entity state from Home Assistant.",
            OperationKind::ListEvents => "List event types and their listener counts.",
            OperationKind::FireEvent => "Fire an event on the Home Assistant event bus.",
            OperationKind::ListServices => {
                "List available services per domain, optionally only one domain."
            }
            OperationKind::CallService => {
                "Call a service such as light.turn_on with optional service data."
            }
            OperationKind::GetHistory => "Get state history for a time window.",
            OperationKind::GetLogbook => "Get logbook entries for a time window.",
            OperationKind::GetErrorLog => "Get the Home Assistant error log as plain text.",
            OperationKind::ListCalendars => "List calendar entities.",
            OperationKind::GetCalendarEvents => {
                "Get events of a calendar between two timestamps (defaults to the next 7 days)."
            }
            OperationKind::RenderTemplate => "Render a Jinja2 template and return the text result.",
            OperationKind::CheckConfig => "Validate the Home Assistant configuration files.",
            OperationKind::HandleIntent => "Dispatch an intent by name with optional slot data.",
        }
    }

    /// Whether the operation changes Home Assistant state.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            OperationKind::SetState
                | OperationKind::DeleteState
                | OperationKind::FireEvent
                | OperationKind::CallService
                | OperationKind::HandleIntent
        )
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully parsed operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Status,
    GetConfig,
    ListComponents,
    ListStates {
        domain: Option<String>,
    },
    GetState {
        entity_id: String,
    },
    SetState {
        entity_id: String,
        update: StateUpdate,
    },
    DeleteState {
        entity_id: String,
    },
    ListEvents,
    FireEvent {
        event_type: String,
        data: Option<Value>,
    },
    ListServices {
        domain: Option<String>,
    },
    CallService {
        domain: String,
        service: String,
        data: Option<Value>,
        return_response: bool,
    },
    GetHistory(HistoryQuery),
    GetLogbook(LogbookQuery),
    GetErrorLog,
    ListCalendars,
    GetCalendarEvents(CalendarQuery),
    RenderTemplate {
        template: String,
    },
    CheckConfig,
    HandleIntent(IntentRequest),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Status => OperationKind::Status,
            Operation::GetConfig => OperationKind::GetConfig,
            Operation::ListComponents => OperationKind::ListComponents,
            Operation::ListStates { .. } => OperationKind::ListStates,
            Operation::GetState { .. } => OperationKind::GetState,
            Operation::SetState { .. } => OperationKind::SetState,
            Operation::DeleteState { .. } => OperationKind::DeleteState,
            Operation::ListEvents => OperationKind::ListEvents,
            Operation::FireEvent { .. } => OperationKind::FireEvent,
            Operation::ListServices { .. } => OperationKind::ListServices,
            Operation::CallService { .. } => OperationKind::CallService,
            Operation::GetHistory(_) => OperationKind::GetHistory,
            Operation::GetLogbook(_) => OperationKind::GetLogbook,
            Operation::GetErrorLog => OperationKind::GetErrorLog,
            Operation::ListCalendars => OperationKind::ListCalendars,
            Operation::GetCalendarEvents(_) => OperationKind::GetCalendarEvents,
            Operation::RenderTemplate { .. } => OperationKind::RenderTemplate,
            Operation::CheckConfig => OperationKind::CheckConfig,
            Operation::HandleIntent(_) => OperationKind::HandleIntent,
        }
    }

    /// Parse arguments for `kind`. `Value::Null` counts as no arguments.
    pub fn from_args(kind: OperationKind, args: &Value) -> Result<Self> {
        let empty = Map::new();
        let args = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(Error::Validation(format!(
                    "Arguments for '{}' must be a JSON object, got {}",
                    kind,
                    json_type(other)
                )));
            }
        };
        let args = Args(args);

        let op = match kind {
            OperationKind::Status => Operation::Status,
            OperationKind::GetConfig => Operation::GetConfig,
            OperationKind::ListComponents => Operation::ListComponents,
            OperationKind::ListStates => Operation::ListStates {
                domain: args.opt_str("domain")?,
            },
            OperationKind::GetState => Operation::GetState {
                entity_id: args.req_str("entity_id")?,
            },
            OperationKind::SetState => {
                let entity_id = args.req_str("entity_id")?;
                let mut update = StateUpdate::new(args.req_str("state")?);
                update.attributes = args.json("attributes")?;
                Operation::SetState { entity_id, update }
            }
            OperationKind::DeleteState => Operation::DeleteState {
                entity_id: args.req_str("entity_id")?,
            },
            OperationKind::ListEvents => Operation::ListEvents,
            OperationKind::FireEvent => Operation::FireEvent {
                event_type: args.req_str("event_type")?,
                data: args.json("data")?,
            },
            OperationKind::ListServices => Operation::ListServices {
                domain: args.opt_str("domain")?,
            },
            OperationKind::CallService => Operation::CallService {
                domain: args.req_str("domain")?,
                service: args.req_str("service")?,
                data: args.json("data")?,
                return_response: args.flag("return_response")?,
            },
            OperationKind::GetHistory => Operation::GetHistory(HistoryQuery {
                start: args.window_start()?,
                end: args.opt_str("end_time")?,
                entity_ids: args.str_list("entity_ids")?,
                minimal_response: args.flag("minimal_response")?,
                no_attributes: args.flag("no_attributes")?,
                significant_changes_only: args.flag("significant_changes_only")?,
            }),
            OperationKind::GetLogbook => Operation::GetLogbook(LogbookQuery {
                start: args.window_start()?,
                end: args.opt_str("end_time")?,
                entity: args.opt_str("entity_id")?,
            }),
            OperationKind::GetErrorLog => Operation::GetErrorLog,
            OperationKind::ListCalendars => Operation::ListCalendars,
            OperationKind::GetCalendarEvents => {
                let mut query = CalendarQuery::new(args.req_str("calendar_id")?);
                query.start = args.opt_str("start")?;
                query.end = args.opt_str("end")?;
                if query.start.is_none() && query.end.is_none() {
                    query = query.between(query::now(), query::in_days(DEFAULT_CALENDAR_DAYS));
                }
                Operation::GetCalendarEvents(query)
            }
            OperationKind::RenderTemplate => Operation::RenderTemplate {
                template: args.req_str("template")?,
            },
            OperationKind::CheckConfig => Operation::CheckConfig,
            OperationKind::HandleIntent => {
                let mut intent = IntentRequest::new(args.req_str("name")?);
                intent.data = args.json("data")?;
                Operation::HandleIntent(intent)
            }
        };
        Ok(op)
    }

    /// The request this operation sends.
    pub fn request(&self) -> Result<RequestDescriptor> {
        let request = match self {
            Operation::Status => requests::status(),
            Operation::GetConfig => requests::config(),
            Operation::ListComponents => requests::components(),
            Operation::ListStates { .. } => requests::states(),
            Operation::GetState { entity_id } => requests::state(entity_id),
            Operation::SetState { entity_id, update } => requests::set_state(entity_id, update)?,
            Operation::DeleteState { entity_id } => requests::delete_state(entity_id),
            Operation::ListEvents => requests::events(),
            Operation::FireEvent { event_type, data } => {
                requests::fire_event(event_type, data.clone())
            }
            Operation::ListServices { .. } => requests::services(),
            Operation::CallService {
                domain,
                service,
                data,
                return_response,
            } => requests::call_service(domain, service, data.clone(), *return_response),
            Operation::GetHistory(query) => requests::history(query),
            Operation::GetLogbook(query) => requests::logbook(query),
            Operation::GetErrorLog => requests::error_log(),
            Operation::ListCalendars => requests::calendars(),
            Operation::GetCalendarEvents(query) => requests::calendar_events(query),
            Operation::RenderTemplate { template } => requests::render_template(template)?,
            Operation::CheckConfig => requests::check_config(),
            Operation::HandleIntent(intent) => requests::handle_intent(intent)?,
        };
        Ok(request)
    }

    /// Run the operation. The upstream body is passed through as decoded,
    /// apart from the local domain filters.
    pub async fn run(&self, client: &HassClient) -> ResultEnvelope<Value> {
        let request = match self.request() {
            Ok(request) => request,
            Err(err) => return ResultEnvelope::failure(&err, 0),
        };
        let envelope = client.request(request).await.value();

        match self {
            Operation::ListStates {
                domain: Some(domain),
            } => envelope.map(|states| {
                retain_items(states, |item| {
                    item.get("entity_id")
                        .and_then(Value::as_str)
                        .map(|id| id.split_once('.').map(|(d, _)| d).unwrap_or(id))
                        == Some(domain.as_str())
                })
            }),
            Operation::ListServices {
                domain: Some(domain),
            } => envelope.map(|services| {
                retain_items(services, |item| {
                    item.get("domain").and_then(Value::as_str) == Some(domain.as_str())
                })
            }),
            _ => envelope,
        }
    }
}

/// Keep the array items matching `keep`. Anything else passes unchanged.
fn retain_items(value: Value, keep: impl Fn(&Value) -> bool) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().filter(|item| keep(item)).collect()),
        other => other,
    }
}

impl HassClient {
    /// Parse `args` for `kind` and run it.
    ///
    /// Argument errors come back as a failed envelope without any network
    /// call.
    pub async fn invoke(&self, kind: OperationKind, args: &Value) -> ResultEnvelope<Value> {
        match Operation::from_args(kind, args) {
            Ok(op) => op.run(self).await,
            Err(err) => {
                tracing::debug!(operation = %kind, "Rejected arguments: {}", err);
                ResultEnvelope::failure(&err, 0)
            }
        }
    }
}

/// Parse JSON text supplied for a JSON-typed field.
pub fn parse_json_arg(field: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text)
        .map_err(|e| Error::Validation(format!("Invalid JSON in '{}': {}", field, e)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Typed accessors over an argument object.
struct Args<'a>(&'a Map<String, Value>);

impl Args<'_> {
    fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn opt_str(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(other) => Err(Error::Validation(format!(
                "'{}' must be a string, got {}",
                key,
                json_type(other)
            ))),
        }
    }

    fn req_str(&self, key: &str) -> Result<String> {
        self.opt_str(key)?
            .ok_or_else(|| Error::Validation(format!("Missing required parameter: {}", key)))
    }

    fn flag(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" | "" => Ok(false),
                _ => Err(Error::Validation(format!("'{}' must be a boolean", key))),
            },
            Some(other) => Err(Error::Validation(format!(
                "'{}' must be a boolean, got {}",
                key,
                json_type(other)
            ))),
        }
    }

    fn number(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| Error::Validation(format!("'{}' must be a number", key))),
            Some(other) => Err(Error::Validation(format!(
                "'{}' must be a number, got {}",
                key,
                json_type(other)
            ))),
        }
    }

    /// JSON-typed field: a JSON value, or a string holding JSON text.
    fn json(&self, key: &str) -> Result<Option<Value>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_json_arg(key, s).map(Some),
            Some(other) => Ok(Some(other.clone())),
        }
    }

    /// Array of strings, or one comma-separated string.
    fn str_list(&self, key: &str) -> Result<Vec<String>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(String::from).ok_or_else(|| {
                        Error::Validation(format!("'{}' must contain only strings", key))
                    })
                })
                .collect(),
            Some(other) => Err(Error::Validation(format!(
                "'{}' must be a string or an array of strings, got {}",
                key,
                json_type(other)
            ))),
        }
    }

    /// `start_time`, or `hours` before now.
    fn window_start(&self) -> Result<Option<String>> {
        if let Some(start) = self.opt_str("start_time")? {
            return Ok(Some(start));
        }
        match self.number("hours")? {
            Some(hours) if !hours.is_finite() => {
                Err(Error::Validation("'hours' is out of range".to_string()))
            }
            Some(hours) if hours > 0.0 => query::since_hours(hours)
                .map(Some)
                .ok_or_else(|| Error::Validation("'hours' is out of range".to_string())),
            Some(_) => Err(Error::Validation("'hours' must be positive".to_string())),
            None => Ok(None),
        }
    }
}
