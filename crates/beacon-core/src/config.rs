//! Configuration system for Beacon.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $BEACON_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/beacon/config.toml
//!   3. ~/.config/beacon/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconConfig {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub relay: RelayConfig,
    pub sweep: SweepConfig,
    pub turn: TurnConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Allowed CORS origins. Empty or "*" = any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// How long an announce keeps a peer present.
    pub presence_ttl_secs: u64,
    /// Upper bound on peers returned per selection.
    pub max_peers: usize,
    /// Rank peers that hold nothing needed strictly below those that do.
    pub tier_by_need: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Lifetime of an undelivered signal message.
    pub signal_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub interval_secs: u64,
    /// Attempts per manifest before it is skipped until the next cycle.
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Shared secret with the TURN server. None = credentials unavailable.
    pub secret: Option<String>,
    pub ttl_secs: u64,
    pub uris: Vec<String>,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8787,
            cors_origins: Vec::new(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            presence_ttl_secs: 300,
            max_peers: 6,
            tier_by_need: false,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            signal_ttl_secs: 30,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_attempts: 3,
        }
    }
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: 86_400,
            uris: Vec::new(),
        }
    }
}

impl RegistryConfig {
    pub fn presence_ttl(&self) -> Duration {
        Duration::from_secs(self.presence_ttl_secs)
    }
}

impl RelayConfig {
    pub fn signal_ttl(&self) -> Duration {
        Duration::from_secs(self.signal_ttl_secs)
    }
}

impl SweepConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
        .join("beacon")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl BeaconConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            BeaconConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("BEACON_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Apply BEACON_* overrides read through `lookup`.
    ///
    /// Unparseable numeric values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BEACON_SERVER__BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(p) = lookup("BEACON_SERVER__PORT").and_then(|v| v.parse().ok()) {
            self.server.port = p;
        }
        if let Some(v) = lookup("BEACON_SERVER__CORS_ORIGINS") {
            self.server.cors_origins = split_list(&v);
        }
        if let Some(t) = lookup("BEACON_REGISTRY__PRESENCE_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.registry.presence_ttl_secs = t;
        }
        if let Some(n) = lookup("BEACON_REGISTRY__MAX_PEERS").and_then(|v| v.parse().ok()) {
            self.registry.max_peers = n;
        }
        if let Some(v) = lookup("BEACON_REGISTRY__TIER_BY_NEED") {
            self.registry.tier_by_need = v == "true" || v == "1";
        }
        if let Some(v) = lookup("BEACON_TURN__SECRET") {
            self.turn.secret = if v.is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("BEACON_TURN__URIS") {
            self.turn.uris = split_list(&v);
        }
    }

    /// `bind_addr:port` for the HTTP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind_addr, self.server.port)
    }
}

fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
