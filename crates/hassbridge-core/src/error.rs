//! Error taxonomy for Home Assistant calls.
//!
//! Every variant is surfaced through a [`ResultEnvelope`](crate::ResultEnvelope)
//! rather than returned to callers as an `Err`.

/// Error type for a single Home Assistant request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Base URL or token missing. Detected before any I/O.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed caller input, detected before the request is built.
    #[error("{0}")]
    Validation(String),

    /// Upstream answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The configured wait elapsed before the exchange completed.
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// DNS, connect or any other failure before a response arrived.
    #[error("{0}")]
    Transport(String),

    /// A 2xx body that could not be decoded.
    #[error("Invalid response from Home Assistant: {0}")]
    Decode(String),
}

impl Error {
    /// Status code reported in the envelope for this error.
    ///
    /// Only HTTP errors carry the upstream status here; everything else
    /// reports 0.
    pub fn status(&self) -> u16 {
        match self {
            Error::Http { status, .. } => *status,
            _ => 0,
        }
    }
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(format!("Invalid JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = Error::Http {
            status: 404,
            message: "Entity not found.".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Entity not found.");
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_timeout_display_names_duration() {
        let err = Error::Timeout(1500);
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("1500ms"));
        assert_eq!(err.status(), 0);
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("Invalid JSON"));
    }
}
