//! Connection configuration and its resolution.
//!
//! Settings are read through an injected [`ConfigSource`] at call time, so the
//! environment is consulted fresh on every request and never cached.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default values.
pub mod defaults {
    /// Request timeout in milliseconds.
    pub const TIMEOUT_MS: u64 = 10_000;
    /// User agent sent with every request.
    pub const USER_AGENT: &str = concat!("hassbridge/", env!("CARGO_PKG_VERSION"));
}

/// Environment variable names.
pub mod env_vars {
    pub const URL: &str = "HA_URL";
    pub const TOKEN: &str = "HA_TOKEN";
    pub const TIMEOUT_MS: &str = "HA_TIMEOUT_MS";
}

/// Home Assistant connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL without trailing slashes (e.g. `http://homeassistant.local:8123`)
    pub base_url: String,

    /// Long-lived access token
    pub token: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    defaults::TIMEOUT_MS
}

impl ConnectionConfig {
    /// Create a new connection config with the default timeout.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            token: token.into(),
            timeout_ms: defaults::TIMEOUT_MS,
        }
    }

    /// Override the request timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full URL for a path relative to the base URL.
    ///
    /// The path is appended verbatim; callers pre-encode query strings.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `Authorization` header value.
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Strip trailing slashes from a base URL.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Process-wide settings lookup.
pub trait ConfigSource: Send + Sync {
    /// Look up a setting. Empty values are treated as absent by [`resolve`].
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads settings from the process environment at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory settings, for embedders and tests.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

fn lookup(source: &dyn ConfigSource, key: &str) -> Option<String> {
    source
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the configuration for one call.
///
/// An explicit override wins. Otherwise URL and token come from `source`;
/// if either is missing the call must fail without touching the network.
pub fn resolve(
    override_config: Option<&ConnectionConfig>,
    source: &dyn ConfigSource,
) -> Result<ConnectionConfig> {
    if let Some(config) = override_config {
        return Ok(config.clone());
    }

    let url = lookup(source, env_vars::URL);
    let token = lookup(source, env_vars::TOKEN);

    let (url, token) = match (url, token) {
        (Some(url), Some(token)) => (url, token),
        (url, token) => {
            let missing: Vec<&str> = [
                url.is_none().then_some(env_vars::URL),
                token.is_none().then_some(env_vars::TOKEN),
            ]
            .into_iter()
            .flatten()
            .collect();
            return Err(Error::Config(format!(
                "Home Assistant is not configured; set {}",
                missing.join(" and ")
            )));
        }
    };

    let timeout_ms = match lookup(source, env_vars::TIMEOUT_MS) {
        None => defaults::TIMEOUT_MS,
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => ms,
            _ => {
                tracing::warn!(
                    value = %raw,
                    "Ignoring invalid {}; using {}ms",
                    env_vars::TIMEOUT_MS,
                    defaults::TIMEOUT_MS
                );
                defaults::TIMEOUT_MS
            }
        },
    };

    Ok(ConnectionConfig::new(url, token).with_timeout_ms(timeout_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_stripped() {
        let config = ConnectionConfig::new("http://ha.local:8123///", "tok");
        assert_eq!(config.base_url, "http://ha.local:8123");
        assert_eq!(config.timeout_ms, defaults::TIMEOUT_MS);
        assert_eq!(
            config.url_for("/api/states"),
            "http://ha.local:8123/api/states"
        );
        assert_eq!(config.auth_header(), "Bearer tok");
    }

    #[test]
    fn test_override_wins() {
        let explicit = ConnectionConfig::new("http://a:1", "x").with_timeout_ms(5);
        let source = MapSource::new()
            .with(env_vars::URL, "http://b:2")
            .with(env_vars::TOKEN, "y");

        let resolved = resolve(Some(&explicit), &source).unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn test_resolve_from_source() {
        let source = MapSource::new()
            .with(env_vars::URL, "http://ha.local:8123/")
            .with(env_vars::TOKEN, "tok")
            .with(env_vars::TIMEOUT_MS, "2500");

        let resolved = resolve(None, &source).unwrap();
        assert_eq!(resolved.base_url, "http://ha.local:8123");
        assert_eq!(resolved.token, "tok");
        assert_eq!(resolved.timeout_ms, 2500);
    }

    #[test]
    fn test_missing_values_reported() {
        let err = resolve(None, &MapSource::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let msg = err.to_string();
        assert!(msg.contains(env_vars::URL));
        assert!(msg.contains(env_vars::TOKEN));

        let source = MapSource::new().with(env_vars::URL, "http://ha.local:8123");
        let msg = resolve(None, &source).unwrap_err().to_string();
        assert!(msg.contains(env_vars::TOKEN));
        assert!(!msg.contains(env_vars::URL));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let source = MapSource::new()
            .with(env_vars::URL, "   ")
            .with(env_vars::TOKEN, "tok");
        assert!(resolve(None, &source).is_err());
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        let source = MapSource::new()
            .with(env_vars::URL, "http://ha.local:8123")
            .with(env_vars::TOKEN, "tok")
            .with(env_vars::TIMEOUT_MS, "soon");
        assert_eq!(
            resolve(None, &source).unwrap().timeout_ms,
            defaults::TIMEOUT_MS
        );
    }
}
