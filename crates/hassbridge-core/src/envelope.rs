//! Uniform result shape returned by every Home Assistant operation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Result Envelope.
///
/// `ok` is true iff the upstream status was 2xx and nothing failed while
/// sending or decoding. A failed envelope never carries `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope<T> {
    pub ok: bool,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ResultEnvelope<T> {
    /// Successful envelope.
    pub fn success(status: u16, data: T, latency_ms: u64) -> Self {
        Self {
            ok: true,
            status,
            data: Some(data),
            latency_ms,
            error: None,
        }
    }

    /// Failed envelope. The status comes from the error.
    pub fn failure(error: &Error, latency_ms: u64) -> Self {
        Self {
            ok: false,
            status: error.status(),
            data: None,
            latency_ms,
            error: Some(error.to_string()),
        }
    }

    /// Immediate failure for missing configuration.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::failure(&Error::Config(message.into()), 0)
    }

    /// Immediate failure for malformed caller input.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::failure(&Error::Validation(message.into()), 0)
    }

    /// Transform the payload of a successful envelope.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResultEnvelope<U> {
        ResultEnvelope {
            ok: self.ok,
            status: self.status,
            data: self.data.map(f),
            latency_ms: self.latency_ms,
            error: self.error,
        }
    }

    /// Transform the payload. A conversion failure is a parse error like a
    /// malformed body, so the envelope reports status 0.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U, String>) -> ResultEnvelope<U> {
        let Self {
            ok,
            status,
            data,
            latency_ms,
            error,
        } = self;

        match data {
            Some(data) if ok => match f(data) {
                Ok(mapped) => ResultEnvelope::success(status, mapped, latency_ms),
                Err(e) => ResultEnvelope::failure(&Error::Decode(e), latency_ms),
            },
            _ => ResultEnvelope {
                ok: false,
                status,
                data: None,
                latency_ms,
                error,
            },
        }
    }

    /// Convert into a plain `Result`, dropping the timing information.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match (self.ok, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .unwrap_or_else(|| format!("Request failed with status {}", self.status))),
        }
    }
}

impl<T: Serialize> ResultEnvelope<T> {
    /// The envelope itself as a JSON value.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "ok": false,
                "status": self.status,
                "latencyMs": self.latency_ms,
                "error": format!("Failed to serialize result: {}", e),
            })
        })
    }
}

/// Decoded response body: JSON when the upstream declared it, text otherwise.
///
/// Serializes untagged, so it is output only; a text body and a JSON string
/// look the same on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// The body as a JSON value; text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
        }
    }

    /// The text body, if the upstream sent text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Json(_) => None,
        }
    }
}

impl ResultEnvelope<Payload> {
    /// Decode a JSON payload into a typed response.
    pub fn decode<T: DeserializeOwned>(self) -> ResultEnvelope<T> {
        self.try_map(|payload| match payload {
            Payload::Json(value) => serde_json::from_value(value).map_err(|e| e.to_string()),
            Payload::Text(text) => Err(format!(
                "expected JSON, got text: {}",
                text.chars().take(200).collect::<String>()
            )),
        })
    }

    /// Accept the payload as text. A JSON string is unwrapped, any other
    /// JSON value is rendered compactly.
    pub fn text(self) -> ResultEnvelope<String> {
        self.map(|payload| match payload {
            Payload::Text(text) => text,
            Payload::Json(Value::String(s)) => s,
            Payload::Json(other) => other.to_string(),
        })
    }

    /// Accept the payload as a dynamic JSON value.
    pub fn value(self) -> ResultEnvelope<Value> {
        self.map(Payload::into_value)
    }
}
