//! Beacon integration test harness.
//!
//! Each test starts its own API server on an ephemeral loopback port,
//! backed by a fresh in-memory store, and drives it over real HTTP.
//! Nothing is shared between tests.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::net::TcpListener;

use beacon_core::BeaconConfig;
use beacon_services::{MemoryStore, PeerStateStore};

mod peers;
mod signaling;
mod status;

// ── Harness ───────────────────────────────────────────────────────────────────

/// A running server plus a handle on its store.
pub struct Node {
    pub base: String,
    pub store: MemoryStore,
    client: reqwest::Client,
}

/// Start a server with default configuration.
pub async fn spawn_node() -> Result<Node> {
    spawn_node_with(BeaconConfig::default()).await
}

pub async fn spawn_node_with(config: BeaconConfig) -> Result<Node> {
    let store = MemoryStore::new();
    let shared: Arc<dyn PeerStateStore> = Arc::new(store.clone());
    let state = beacon_api::ApiState::new(shared, &config);
    let app = beacon_api::router(state, &config.server.cors_origins);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind ephemeral port")?;
    let addr = listener.local_addr()?;
    tokio::spawn(beacon_api::serve(listener, app, std::future::pending()));

    Ok(Node {
        base: format!("http://{addr}"),
        store,
        client: reqwest::Client::new(),
    })
}

impl Node {
    /// POST a JSON body to `/api{path}`. Returns status and parsed body.
    pub async fn post(&self, path: &str, body: Value, client_id: Option<&str>) -> Result<(u16, Value)> {
        let mut req = self
            .client
            .post(format!("{}/api{}", self.base, path))
            .json(&body);
        if let Some(id) = client_id {
            req = req.header("X-Client-Id", id);
        }
        let resp = req.send().await.with_context(|| format!("POST {path}"))?;
        let status = resp.status().as_u16();
        Ok((status, resp.json().await.unwrap_or(Value::Null)))
    }

    /// GET an absolute path (including any `/api` prefix).
    pub async fn get(&self, path: &str, client_id: Option<&str>) -> Result<(u16, Value)> {
        let (status, text) = self.get_text(path, client_id).await?;
        Ok((status, serde_json::from_str(&text).unwrap_or(Value::Null)))
    }

    pub async fn get_text(&self, path: &str, client_id: Option<&str>) -> Result<(u16, String)> {
        let mut req = self.client.get(format!("{}{}", self.base, path));
        if let Some(id) = client_id {
            req = req.header("X-Client-Id", id);
        }
        let resp = req.send().await.with_context(|| format!("GET {path}"))?;
        let status = resp.status().as_u16();
        Ok((status, resp.text().await?))
    }

    /// Announce `client` in `manifest` holding the given hex bitfield.
    pub async fn announce(&self, client: &str, manifest: &str, bitfield: &str) -> Result<Value> {
        let (status, body) = self
            .post(
                "/announce",
                serde_json::json!({
                    "clientId": client,
                    "manifestId": manifest,
                    "chunkBitfield": bitfield,
                }),
                None,
            )
            .await?;
        anyhow::ensure!(status == 200, "announce returned {status}: {body}");
        Ok(body)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_route_is_404() {
    let node = spawn_node().await.unwrap();
    let (status, _) = node.get_text("/api/nope", None).await.unwrap();
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let node = spawn_node().await.unwrap();
    let resp = reqwest::Client::new()
        .get(format!("{}/health", node.base))
        .header("Origin", "https://app.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
