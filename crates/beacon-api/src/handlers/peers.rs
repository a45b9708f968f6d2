//! /announce, /peers, /complete handlers.

use std::collections::HashSet;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use beacon_core::{ChunkBitfield, PeerDescriptor, PeerRecord};
use beacon_services::{PeerQuery, ServiceError};

use super::{required, ApiResult, ApiState};

/// Blank regions are treated as absent so they never earn region points.
fn normalize_region(region: Option<String>) -> Option<String> {
    region
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}

// ── /announce ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceRequest {
    pub client_id: Option<String>,
    pub manifest_id: Option<String>,
    pub chunk_bitfield: Option<String>,
    pub up_cap: Option<u64>,
    pub region: Option<String>,
    pub rtt_hint: Option<u64>,
    pub version: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceResponse {
    pub success: bool,
    pub peer_id: String,
    /// Presence lifetime in seconds.
    pub ttl: u64,
}

pub async fn handle_announce(
    State(state): State<ApiState>,
    body: Result<Json<AnnounceRequest>, JsonRejection>,
) -> ApiResult<AnnounceResponse> {
    let Json(req) = body?;
    let client_id = required(req.client_id, "clientId")?;
    let manifest_id = required(req.manifest_id, "manifestId")?;
    let encoded = required(req.chunk_bitfield, "chunkBitfield")?;
    let bitfield = ChunkBitfield::decode(&encoded)
        .map_err(|e| ServiceError::invalid(format!("invalid chunkBitfield: {e}")))?;

    let mut record = PeerRecord::new(client_id, manifest_id, bitfield);
    record.up_cap = req.up_cap.unwrap_or(0);
    record.region = normalize_region(req.region);
    record.rtt_hint = req.rtt_hint;
    record.version = req.version;

    let ttl = state.registry.presence_ttl();
    let stored = state.registry.upsert(record, ttl).await?;

    Ok(Json(AnnounceResponse {
        success: true,
        peer_id: stored.peer_id,
        ttl: ttl.as_secs(),
    }))
}

// ── /peers ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPeersRequest {
    pub manifest_id: Option<String>,
    pub needed_chunks: Option<Vec<u32>>,
    pub region: Option<String>,
    #[serde(default)]
    pub exclude_peers: Vec<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct GetPeersResponse {
    pub peers: Vec<PeerDescriptor>,
    pub count: usize,
}

pub async fn handle_get_peers(
    State(state): State<ApiState>,
    body: Result<Json<GetPeersRequest>, JsonRejection>,
) -> ApiResult<GetPeersResponse> {
    let Json(req) = body?;
    let manifest_id = required(req.manifest_id, "manifestId")?;
    let needed = req
        .needed_chunks
        .ok_or_else(|| ServiceError::invalid("missing required field: neededChunks"))?;

    let query = PeerQuery {
        manifest_id,
        needed,
        region: normalize_region(req.region),
        exclude: req.exclude_peers.into_iter().collect::<HashSet<_>>(),
        limit: req.limit,
    };
    let peers = state.selector.select(&query).await?;

    Ok(Json(GetPeersResponse {
        count: peers.len(),
        peers,
    }))
}

// ── /complete ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub client_id: Option<String>,
    pub manifest_id: Option<String>,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub success: bool,
}

pub async fn handle_complete(
    State(state): State<ApiState>,
    body: Result<Json<CompleteRequest>, JsonRejection>,
) -> ApiResult<CompleteResponse> {
    let Json(req) = body?;
    let client_id = required(req.client_id, "clientId")?;
    let manifest_id = required(req.manifest_id, "manifestId")?;

    state.registry.mark_complete(&manifest_id, &client_id).await?;
    Ok(Json(CompleteResponse { success: true }))
}
