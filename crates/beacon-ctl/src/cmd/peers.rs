//! Announce and peer-lookup commands.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::http::{base_url, post_json_body};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnounceRequest<'a> {
    client_id: &'a str,
    manifest_id: &'a str,
    chunk_bitfield: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnounceResponse {
    peer_id: String,
    ttl: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetPeersRequest<'a> {
    manifest_id: &'a str,
    needed_chunks: Vec<u32>,
}

#[derive(Deserialize)]
struct GetPeersResponse {
    peers: Vec<PeerInfo>,
    count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeerInfo {
    peer_id: String,
    chunk_bitfield: String,
    region: Option<String>,
    score: f64,
    has_needed: bool,
}

pub async fn cmd_announce(port: u16, client: &str, manifest: &str, bitfield: &str) -> Result<()> {
    let body = AnnounceRequest {
        client_id: client,
        manifest_id: manifest,
        chunk_bitfield: bitfield,
    };
    let resp: AnnounceResponse =
        post_json_body(&format!("{}/announce", base_url(port)), &body, None).await?;
    println!("Announced {} in {} (ttl {}s)", resp.peer_id, manifest, resp.ttl);
    Ok(())
}

pub async fn cmd_peers(port: u16, manifest: &str, needed: &[&str]) -> Result<()> {
    let needed_chunks = needed
        .iter()
        .map(|c| c.parse::<u32>().with_context(|| format!("bad chunk index: {}", c)))
        .collect::<Result<Vec<_>>>()?;
    let body = GetPeersRequest {
        manifest_id: manifest,
        needed_chunks,
    };
    let resp: GetPeersResponse =
        post_json_body(&format!("{}/peers", base_url(port)), &body, None).await?;

    if resp.peers.is_empty() {
        println!("No peers for {}.", manifest);
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Peers for {} ({})", manifest, resp.count);
    println!("═══════════════════════════════════════");
    for p in &resp.peers {
        println!("  ┌─ {}", p.peer_id);
        println!("  │  score    : {:.1}", p.score);
        println!("  │  useful   : {}", if p.has_needed { "yes" } else { "no" });
        println!("  │  region   : {}", p.region.as_deref().unwrap_or("-"));
        println!("  └─ bitfield : {}", p.chunk_bitfield);
    }
    Ok(())
}
