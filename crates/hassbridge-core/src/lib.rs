//! Home Assistant REST bridge core.
//!
//! ## Modules
//!
//! - **config**: connection settings resolved per call from an injected source
//! - **error**: error taxonomy used inside the crate
//! - **envelope**: the uniform `ResultEnvelope` every operation returns
//! - **http**: request wrapper with timeout, auth headers and body decoding
//! - **entities**: typed fixed-shape Home Assistant responses
//! - **query**: request path and query-string builders
//! - **requests**: one request descriptor per REST endpoint
//! - **client**: one method per REST endpoint
//! - **ops**: operation catalogue shared by tools, RPC and CLI
//!
//! ## Example
//!
//! ```rust,no_run
//! use hassbridge_core::{ConnectionConfig, HassClient};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HassClient::with_config(ConnectionConfig::new(
//!         "http://homeassistant.local:8123",
//!         "long-lived-token",
//!     ));
//!
//!     let result = client.state("light.living_room").await;
//!     println!("{}", result.to_json());
//! }
//! ```

pub mod client;
pub mod config;
pub mod entities;
pub mod envelope;
pub mod error;
pub mod http;
pub mod ops;
pub mod query;
pub mod requests;

pub use client::HassClient;
pub use config::{ConfigSource, ConnectionConfig, EnvSource, MapSource};
pub use entities::{
    ApiMessage, CalendarEvent, CalendarInfo, ConfigCheck, EntityState, EventListener,
    IntentRequest, ServerConfig, ServiceDomain, StateUpdate,
};
pub use envelope::{Payload, ResultEnvelope};
pub use error::{Error, Result};
pub use http::{HttpMethod, HttpWrapper, RequestDescriptor};
pub use ops::{Operation, OperationKind, parse_json_arg};
pub use query::{CalendarQuery, HistoryQuery, LogbookQuery};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
