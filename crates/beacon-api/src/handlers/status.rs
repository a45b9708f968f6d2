//! /health, /metrics, /turn-credentials handlers.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use beacon_core::now_ms;
use beacon_services::TurnCredentials;

use super::{client_identity, ApiError, ApiResult, ApiState};

// ── /health ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub store_status: &'static str,
    pub timestamp: u64,
}

pub async fn handle_health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let timestamp = now_ms();
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                store_status: "connected",
                timestamp,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    store_status: "disconnected",
                    timestamp,
                }),
            )
        }
    }
}

// ── /metrics ──────────────────────────────────────────────────────────────────

pub async fn handle_metrics(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let manifests = state.registry.manifests().await?.len();
    let peers = state.registry.count_peers().await?;
    let uptime = state.started_at.elapsed().as_secs();

    let body = render_metrics(manifests, peers, uptime);
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

fn render_metrics(manifests: usize, peers: usize, uptime_secs: u64) -> String {
    let mut out = String::new();
    for (name, help, value) in [
        (
            "beacon_active_manifests",
            "Manifests with at least one member.",
            manifests as u64,
        ),
        ("beacon_active_peers", "Live peer records.", peers as u64),
        (
            "beacon_uptime_seconds",
            "Seconds since the daemon started.",
            uptime_secs,
        ),
    ] {
        out.push_str(&format!("# HELP {name} {help}\n# TYPE {name} gauge\n{name} {value}\n"));
    }
    out
}

// ── /turn-credentials ─────────────────────────────────────────────────────────

pub async fn handle_turn_credentials(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> ApiResult<TurnCredentials> {
    let identity = client_identity(&headers)?;
    let now_secs = now_ms() / 1000;
    Ok(Json(state.turn.issue(&identity, now_secs)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_text_format() {
        let text = render_metrics(2, 5, 42);
        assert!(text.contains("# TYPE beacon_active_manifests gauge\nbeacon_active_manifests 2\n"));
        assert!(text.contains("\nbeacon_active_peers 5\n"));
        assert!(text.ends_with("beacon_uptime_seconds 42\n"));
    }
}
