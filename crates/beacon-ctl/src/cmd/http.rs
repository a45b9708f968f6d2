//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/api", port)
}

/// Turn a non-2xx reply into an error carrying the server's `error` message.
async fn decode<R: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<R> {
    let status = resp.status();
    if !status.is_success() {
        let body: serde_json::Value = resp.json().await.unwrap_or_default();
        let message = body
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("no error message");
        bail!("beacond returned {}: {}", status, message);
    }
    resp.json::<R>().await.context("failed to parse response")
}

pub async fn get_json_as<T: for<'de> Deserialize<'de>>(url: &str, client_id: &str) -> Result<T> {
    let resp = reqwest::Client::new()
        .get(url)
        .header("X-Client-Id", client_id)
        .send()
        .await
        .with_context(|| format!("failed to connect to beacond at {}, is it running?", url))?;
    decode(resp).await
}

pub async fn get_text(url: &str) -> Result<String> {
    reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to beacond at {}, is it running?", url))?
        .text()
        .await
        .context("failed to read response")
}

pub async fn post_json_body<T, R>(url: &str, body: &T, client_id: Option<&str>) -> Result<R>
where
    T: Serialize,
    R: for<'de> Deserialize<'de>,
{
    let mut req = reqwest::Client::new().post(url).json(body);
    if let Some(id) = client_id {
        req = req.header("X-Client-Id", id);
    }
    let resp = req
        .send()
        .await
        .with_context(|| format!("failed to connect to beacond at {}, is it running?", url))?;
    decode(resp).await
}
