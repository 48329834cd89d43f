//! Home Assistant REST API client.
//!
//! Every operation resolves its configuration at call time and returns a
//! [`ResultEnvelope`]; none of them returns an `Err`.

use std::sync::Arc;

use serde_json::Value;

use crate::config::{self, ConfigSource, ConnectionConfig, EnvSource};
use crate::entities::{
    ApiMessage, CalendarEvent, CalendarInfo, ConfigCheck, EntityState, EventListener,
    IntentRequest, ServerConfig, ServiceDomain, StateUpdate,
};
use crate::envelope::{Payload, ResultEnvelope};
use crate::error::Result;
use crate::http::{HttpWrapper, RequestDescriptor};
use crate::query::{CalendarQuery, HistoryQuery, LogbookQuery};
use crate::requests;

/// Home Assistant REST API client.
#[derive(Clone)]
pub struct HassClient {
    http: HttpWrapper,
    source: Arc<dyn ConfigSource>,
    override_config: Option<ConnectionConfig>,
}

impl HassClient {
    /// Client that reads `HA_URL`/`HA_TOKEN`/`HA_TIMEOUT_MS` on every call.
    pub fn from_env() -> Self {
        Self::with_source(Arc::new(EnvSource))
    }

    /// Client that resolves settings from the given source on every call.
    pub fn with_source(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            http: HttpWrapper::new(),
            source,
            override_config: None,
        }
    }

    /// Client bound to an explicit configuration.
    pub fn with_config(config: ConnectionConfig) -> Self {
        Self::from_env().override_with(config)
    }

    /// Use an explicit configuration instead of the settings source.
    pub fn override_with(mut self, config: ConnectionConfig) -> Self {
        self.override_config = Some(config);
        self
    }

    /// Replace the HTTP wrapper.
    pub fn with_http(mut self, http: HttpWrapper) -> Self {
        self.http = http;
        self
    }

    /// Resolve the configuration for one call.
    pub fn resolve_config(&self) -> Result<ConnectionConfig> {
        config::resolve(self.override_config.as_ref(), self.source.as_ref())
    }

    /// Issue one request. A configuration problem fails immediately without
    /// any network call.
    pub async fn request(&self, request: RequestDescriptor) -> ResultEnvelope<Payload> {
        match self.resolve_config() {
            Ok(config) => self.http.execute(&request, &config).await,
            Err(err) => ResultEnvelope::failure(&err, 0),
        }
    }

    /// Issue a request whose body had to be serialized first.
    async fn request_built(&self, request: Result<RequestDescriptor>) -> ResultEnvelope<Payload> {
        match request {
            Ok(request) => self.request(request).await,
            Err(err) => ResultEnvelope::failure(&err, 0),
        }
    }

    // ========================================================================
    // Status & configuration
    // ========================================================================

    /// Check that the API is running.
    pub async fn status(&self) -> ResultEnvelope<ApiMessage> {
        self.request(requests::status()).await.decode()
    }

    /// Server configuration.
    pub async fn config(&self) -> ResultEnvelope<ServerConfig> {
        self.request(requests::config()).await.decode()
    }

    /// Loaded integrations.
    pub async fn components(&self) -> ResultEnvelope<Vec<String>> {
        self.request(requests::components()).await.decode()
    }

    /// Validate `configuration.yaml`.
    pub async fn check_config(&self) -> ResultEnvelope<ConfigCheck> {
        self.request(requests::check_config()).await.decode()
    }

    /// Current error log, as plain text.
    pub async fn error_log(&self) -> ResultEnvelope<String> {
        self.request(requests::error_log()).await.text()
    }

    // ========================================================================
    // States
    // ========================================================================

    /// All entity states.
    pub async fn states(&self) -> ResultEnvelope<Vec<EntityState>> {
        self.request(requests::states()).await.decode()
    }

    /// Entity states in one domain. Filtering happens locally.
    pub async fn states_in_domain(&self, domain: &str) -> ResultEnvelope<Vec<EntityState>> {
        self.states().await.map(|states| {
            states
                .into_iter()
                .filter(|s| s.domain() == domain)
                .collect()
        })
    }

    /// State of one entity.
    pub async fn state(&self, entity_id: &str) -> ResultEnvelope<EntityState> {
        self.request(requests::state(entity_id)).await.decode()
    }

    /// Create or update the state of an entity.
    pub async fn set_state(
        &self,
        entity_id: &str,
        update: &StateUpdate,
    ) -> ResultEnvelope<EntityState> {
        self.request_built(requests::set_state(entity_id, update))
            .await
            .decode()
    }

    /// Remove an entity state.
    pub async fn delete_state(&self, entity_id: &str) -> ResultEnvelope<Value> {
        self.request(requests::delete_state(entity_id)).await.value()
    }

    // ========================================================================
    // Events & services
    // ========================================================================

    /// Event types and their listener counts.
    pub async fn events(&self) -> ResultEnvelope<Vec<EventListener>> {
        self.request(requests::events()).await.decode()
    }

    /// Fire an event. Without data an empty object is sent.
    pub async fn fire_event(
        &self,
        event_type: &str,
        data: Option<Value>,
    ) -> ResultEnvelope<ApiMessage> {
        self.request(requests::fire_event(event_type, data))
            .await
            .decode()
    }

    /// Available services per domain.
    pub async fn services(&self) -> ResultEnvelope<Vec<ServiceDomain>> {
        self.request(requests::services()).await.decode()
    }

    /// Call a service. Without data an empty object is sent.
    ///
    /// Returns the changed states, or `{changed_states, service_response}`
    /// when `return_response` is set.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        data: Option<Value>,
        return_response: bool,
    ) -> ResultEnvelope<Value> {
        self.request(requests::call_service(domain, service, data, return_response))
            .await
            .value()
    }

    // ========================================================================
    // History, logbook, calendars
    // ========================================================================

    /// State history.
    pub async fn history(&self, query: &HistoryQuery) -> ResultEnvelope<Value> {
        self.request(requests::history(query)).await.value()
    }

    /// Logbook entries.
    pub async fn logbook(&self, query: &LogbookQuery) -> ResultEnvelope<Value> {
        self.request(requests::logbook(query)).await.value()
    }

    /// Calendar entities.
    pub async fn calendars(&self) -> ResultEnvelope<Vec<CalendarInfo>> {
        self.request(requests::calendars()).await.decode()
    }

    /// Events of one calendar.
    pub async fn calendar_events(
        &self,
        query: &CalendarQuery,
    ) -> ResultEnvelope<Vec<CalendarEvent>> {
        self.request(requests::calendar_events(query))
            .await
            .decode()
    }

    // ========================================================================
    // Templates & intents
    // ========================================================================

    /// Render a template. The result is plain text.
    pub async fn render_template(&self, template: &str) -> ResultEnvelope<String> {
        self.request_built(requests::render_template(template))
            .await
            .text()
    }

    /// Dispatch an intent.
    pub async fn handle_intent(&self, intent: &IntentRequest) -> ResultEnvelope<Value> {
        self.request_built(requests::handle_intent(intent))
            .await
            .value()
    }
}

impl std::fmt::Debug for HassClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HassClient")
            .field(
                "base_url",
                &self.override_config.as_ref().map(|c| c.base_url.as_str()),
            )
            .finish_non_exhaustive()
    }
}
