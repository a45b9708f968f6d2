//! HTTP API handlers for the tracker operations.

pub mod peers;
pub mod signals;
pub mod status;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use beacon_core::BeaconConfig;
use beacon_services::{
    PeerStateStore, Registry, Relay, Selector, SelectorConfig, ServiceError, TurnIssuer,
};

/// Header carrying the caller's authenticated identity. Authentication
/// itself happens in front of this service.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn PeerStateStore>,
    pub registry: Arc<Registry>,
    pub selector: Arc<Selector>,
    pub relay: Arc<Relay>,
    pub turn: Arc<TurnIssuer>,
    pub started_at: Instant,
}

impl ApiState {
    /// Wire every service to the one shared store.
    pub fn new(store: Arc<dyn PeerStateStore>, config: &BeaconConfig) -> Self {
        let registry = Arc::new(Registry::new(
            store.clone(),
            config.registry.presence_ttl(),
        ));
        let selector = Arc::new(Selector::new(
            registry.clone(),
            SelectorConfig {
                max_peers: config.registry.max_peers,
                tier_by_need: config.registry.tier_by_need,
            },
        ));
        let relay = Arc::new(Relay::new(store.clone(), config.relay.signal_ttl()));
        let turn = Arc::new(TurnIssuer::new(
            config.turn.secret.clone(),
            std::time::Duration::from_secs(config.turn.ttl_secs),
            config.turn.uris.clone(),
        ));
        Self {
            store,
            registry,
            selector,
            relay,
            turn,
            started_at: Instant::now(),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A service failure rendered as an HTTP status and `{ "error": ... }` body.
///
/// Internal detail is logged, never returned.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::InvalidRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(ServiceError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            ServiceError::InvalidRequest(m) => (StatusCode::BAD_REQUEST, m),
            ServiceError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ServiceError::ServiceUnavailable(m) => {
                tracing::warn!(error = %m, "store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service temporarily unavailable".to_string(),
                )
            }
            ServiceError::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Unwrap a required string field, treating blank as missing.
fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::invalid(format!("missing required field: {field}")).into()),
    }
}

/// The caller's identity from [`CLIENT_ID_HEADER`].
fn client_identity(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string());
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::invalid(format!("missing {CLIENT_ID_HEADER} header")).into()),
    }
}

// Re-export handler functions for use in router setup.
pub use peers::{handle_announce, handle_complete, handle_get_peers};
pub use signals::{handle_poll_signals, handle_signal};
pub use status::{handle_health, handle_metrics, handle_turn_credentials};
