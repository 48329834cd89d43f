//! Request path builders.
//!
//! Query values are percent-encoded here; the HTTP wrapper appends the
//! resulting path verbatim.

use chrono::{SecondsFormat, TimeDelta, Utc};

/// Accumulates `key=value` and bare flag parameters.
#[derive(Debug, Default)]
struct QueryString {
    parts: Vec<String>,
}

impl QueryString {
    fn value(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.parts
                .push(format!("{}={}", key, urlencoding::encode(value)));
        }
        self
    }

    fn flag(&mut self, key: &str, enabled: bool) -> &mut Self {
        if enabled {
            self.parts.push(key.to_string());
        }
        self
    }

    fn append_to(&self, path: String) -> String {
        if self.parts.is_empty() {
            path
        } else {
            format!("{}?{}", path, self.parts.join("&"))
        }
    }
}

fn with_start(base: &str, start: Option<&str>) -> String {
    match start {
        Some(start) => format!("{}/{}", base, urlencoding::encode(start)),
        None => base.to_string(),
    }
}

/// Timestamp `hours` before now, RFC 3339 in UTC.
///
/// `None` when `hours` is not finite or reaches outside the representable
/// date range.
pub fn since_hours(hours: f64) -> Option<String> {
    let millis = (hours * 3_600_000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds(millis as i64)?;
    Utc::now()
        .checked_sub_signed(delta)
        .map(|start| start.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Timestamp `days` after now, RFC 3339 in UTC.
pub fn in_days(days: i64) -> String {
    (Utc::now() + TimeDelta::days(days)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time, RFC 3339 in UTC.
pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `/api/states/<id>`
pub fn state_path(entity_id: &str) -> String {
    format!("/api/states/{}", entity_id)
}

/// `/api/events/<type>`
pub fn event_path(event_type: &str) -> String {
    format!("/api/events/{}", event_type)
}

/// `/api/services/<domain>/<service>[?return_response]`
pub fn service_path(domain: &str, service: &str, return_response: bool) -> String {
    let mut query = QueryString::default();
    query.flag("return_response", return_response);
    query.append_to(format!("/api/services/{}/{}", domain, service))
}

/// Parameters for `/api/history/period`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    /// Start of the window; HA defaults to one day before now.
    pub start: Option<String>,
    pub end: Option<String>,
    pub entity_ids: Vec<String>,
    pub minimal_response: bool,
    pub no_attributes: bool,
    pub significant_changes_only: bool,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_ids.push(entity_id.into());
        self
    }

    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn path(&self) -> String {
        let filter = (!self.entity_ids.is_empty()).then(|| self.entity_ids.join(","));
        let mut query = QueryString::default();
        query
            .value("filter_entity_id", filter.as_deref())
            .value("end_time", self.end.as_deref())
            .flag("minimal_response", self.minimal_response)
            .flag("no_attributes", self.no_attributes)
            .flag("significant_changes_only", self.significant_changes_only);
        query.append_to(with_start("/api/history/period", self.start.as_deref()))
    }
}

/// Parameters for `/api/logbook`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogbookQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub entity: Option<String>,
}

impl LogbookQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> String {
        let mut query = QueryString::default();
        query
            .value("entity", self.entity.as_deref())
            .value("end_time", self.end.as_deref());
        query.append_to(with_start("/api/logbook", self.start.as_deref()))
    }
}

/// Parameters for `/api/calendars/<id>`.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarQuery {
    pub calendar_id: String,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl CalendarQuery {
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            start: None,
            end: None,
        }
    }

    pub fn between(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self.end = Some(end.into());
        self
    }

    pub fn path(&self) -> String {
        let mut query = QueryString::default();
        query
            .value("start", self.start.as_deref())
            .value("end", self.end.as_deref());
        query.append_to(format!("/api/calendars/{}", self.calendar_id))
    }
}
