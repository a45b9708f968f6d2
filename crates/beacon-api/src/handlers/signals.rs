//! /signal and /signals handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use beacon_core::{SignalKind, SignalMessage};
use beacon_services::ServiceError;

use super::{client_identity, required, ApiResult, ApiState};

#[derive(Deserialize)]
pub struct SignalRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Serialize)]
pub struct SignalResponse {
    pub success: bool,
}

pub async fn handle_signal(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Result<Json<SignalRequest>, JsonRejection>,
) -> ApiResult<SignalResponse> {
    let from = client_identity(&headers)?;
    let Json(req) = body?;
    let kind: SignalKind = required(req.kind, "type")?
        .parse()
        .map_err(|e| ServiceError::invalid(format!("{e}")))?;
    let to = required(req.to, "to")?;

    state.relay.enqueue(kind, &from, &to, req.payload).await?;
    Ok(Json(SignalResponse { success: true }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollQuery {
    pub client_id: Option<String>,
}

#[derive(Serialize)]
pub struct PollResponse {
    pub signals: Vec<SignalMessage>,
}

/// Drain the caller's mailbox.
///
/// The recipient is the identity header. `?clientId=` is accepted only
/// when no header is present, or when it names the same identity.
pub async fn handle_poll_signals(
    State(state): State<ApiState>,
    headers: HeaderMap,
    query: Result<Query<PollQuery>, QueryRejection>,
) -> ApiResult<PollResponse> {
    let Query(q) = query?;
    let queried = q.client_id.filter(|c| !c.trim().is_empty());
    let recipient = match (client_identity(&headers).ok(), queried) {
        (Some(identity), Some(queried)) if identity != queried.trim() => {
            return Err(ServiceError::invalid("clientId does not match caller identity").into());
        }
        (Some(identity), _) => identity,
        (None, Some(queried)) => queried,
        (None, None) => return Err(ServiceError::invalid("missing required field: clientId").into()),
    };

    let signals = state.relay.drain_for(&recipient).await?;
    Ok(Json(PollResponse { signals }))
}
