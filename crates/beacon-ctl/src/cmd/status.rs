//! Health and metrics commands.

use anyhow::{Context, Result};
use serde::Deserialize;

use super::http::{base_url, get_text};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    store_status: String,
    timestamp: u64,
}

pub async fn cmd_health(port: u16) -> Result<()> {
    // 503 still carries a health body, so read it regardless of status
    let text = get_text(&format!("{}/health", base_url(port))).await?;
    let resp: HealthResponse =
        serde_json::from_str(&text).context("failed to parse health response")?;

    println!("═══════════════════════════════════════");
    println!("  Beacon Health");
    println!("═══════════════════════════════════════");
    println!("  Status    : {}", resp.status);
    println!("  Store     : {}", resp.store_status);
    println!("  Timestamp : {}", resp.timestamp);

    if resp.status != "ok" {
        std::process::exit(2);
    }
    Ok(())
}

pub async fn cmd_metrics(port: u16) -> Result<()> {
    let text = get_text(&format!("{}/metrics", base_url(port))).await?;
    print!("{}", text);
    Ok(())
}
