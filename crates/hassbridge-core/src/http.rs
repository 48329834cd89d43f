//! HTTP request wrapper.
//!
//! Issues exactly one authenticated request, bounded by the configured
//! timeout, and folds every outcome into a [`ResultEnvelope`].

use std::fmt;
use std::time::Instant;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::config::{ConnectionConfig, defaults};
use crate::envelope::{Payload, ResultEnvelope};
use crate::error::Error;

/// HTTP methods used against the Home Assistant REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Path relative to the base URL, query string already encoded.
    pub path: String,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Outcome of the raw exchange, before timing is attached.
type Exchange = std::result::Result<(u16, Payload), Error>;

/// Request wrapper around a `reqwest::Client`.
///
/// Idle connections are not kept, so no connection state is shared between
/// calls.
#[derive(Debug, Clone)]
pub struct HttpWrapper {
    client: reqwest::Client,
}

impl HttpWrapper {
    /// Create a new wrapper.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(defaults::USER_AGENT)
            .pool_max_idle_per_host(0)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self { client }
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Execute a request and normalize the outcome.
    ///
    /// Never fails: HTTP errors, transport errors and timeouts all come back
    /// as a failed envelope.
    pub async fn execute(
        &self,
        request: &RequestDescriptor,
        config: &ConnectionConfig,
    ) -> ResultEnvelope<Payload> {
        let url = config.url_for(&request.path);
        tracing::debug!(method = %request.method, path = %request.path, "Home Assistant request");

        let started = Instant::now();
        // Dropping the losing future aborts the in-flight request; no timer
        // survives any exit path.
        let exchange = self.exchange(&url, request, config);
        let outcome = match tokio::time::timeout(config.timeout(), exchange).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(config.timeout_ms)),
        };
        let latency_ms = elapsed_ms(started);

        match outcome {
            Ok((status, payload)) => {
                tracing::debug!(status, latency_ms, path = %request.path, "Home Assistant response");
                ResultEnvelope::success(status, payload, latency_ms)
            }
            Err(err) => {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    latency_ms,
                    "Home Assistant request failed: {}",
                    err
                );
                ResultEnvelope::failure(&err, latency_ms)
            }
        }
    }

    async fn exchange(
        &self,
        url: &str,
        request: &RequestDescriptor,
        config: &ConnectionConfig,
    ) -> Exchange {
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), url)
            .header(AUTHORIZATION, config.auth_header())
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = &request.body {
            let text = serde_json::to_string(body)?;
            builder = builder.body(text);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            // A body that cannot be read is reported as empty.
            let text = response.text().await.unwrap_or_default();
            let message = if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                text
            };
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        let text = response.text().await.map_err(transport_error)?;
        let payload = if is_json {
            let value = serde_json::from_str(&text).map_err(|e| Error::Decode(e.to_string()))?;
            Payload::Json(value)
        } else {
            Payload::Text(text)
        };

        Ok((status.as_u16(), payload))
    }
}

impl Default for HttpWrapper {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
