//! Signal send and poll commands.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::http::{base_url, get_json_as, post_json_body};

#[derive(Serialize)]
struct SignalRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    to: &'a str,
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct SignalResponse {
    success: bool,
}

#[derive(Deserialize)]
struct PollResponse {
    signals: Vec<SignalInfo>,
}

#[derive(Deserialize)]
struct SignalInfo {
    #[serde(rename = "type")]
    kind: String,
    from: String,
    payload: serde_json::Value,
    timestamp: u64,
}

pub async fn cmd_signal(port: u16, from: &str, to: &str, kind: &str, payload: &str) -> Result<()> {
    let payload: serde_json::Value =
        serde_json::from_str(payload).context("payload must be valid JSON")?;
    let body = SignalRequest { kind, to, payload };
    let resp: SignalResponse =
        post_json_body(&format!("{}/signal", base_url(port)), &body, Some(from)).await?;
    if resp.success {
        println!("Queued {} from {} to {}", kind, from, to);
    }
    Ok(())
}

pub async fn cmd_poll(port: u16, client: &str) -> Result<()> {
    let resp: PollResponse = get_json_as(&format!("{}/signals", base_url(port)), client).await?;

    if resp.signals.is_empty() {
        println!("No pending signals for {}.", client);
        return Ok(());
    }
    for s in &resp.signals {
        println!("[{}] {} from {}: {}", s.timestamp, s.kind, s.from, s.payload);
    }
    Ok(())
}
