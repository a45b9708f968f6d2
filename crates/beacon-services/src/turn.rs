//! TURN credentials using the time-limited shared-secret scheme.
//!
//! `username = "{expiry_unix_secs}:{identity}"` and
//! `password = base64(HMAC-SHA1(secret, username))`. The TURN server holds
//! the same secret and checks both the MAC and the expiry, so nothing is
//! stored here.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;

use crate::error::ServiceError;

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnCredentials {
    pub username: String,
    pub password: String,
    /// Seconds until the credentials stop working.
    pub ttl: u64,
    pub uris: Vec<String>,
}

pub struct TurnIssuer {
    secret: Option<String>,
    ttl: Duration,
    uris: Vec<String>,
}

impl TurnIssuer {
    pub fn new(secret: Option<String>, ttl: Duration, uris: Vec<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            ttl,
            uris,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Mint credentials for `identity` valid from `now_secs` for the configured TTL.
    pub fn issue(&self, identity: &str, now_secs: u64) -> Result<TurnCredentials, ServiceError> {
        let secret = self
            .secret
            .as_deref()
            .ok_or_else(|| ServiceError::ServiceUnavailable("TURN secret not configured".into()))?;
        if identity.is_empty() {
            return Err(ServiceError::invalid("missing client identity"));
        }

        let ttl = self.ttl.as_secs();
        let username = format!("{}:{}", now_secs + ttl, identity);
        let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
            .map_err(|e| ServiceError::Internal(format!("hmac key: {e}")))?;
        mac.update(username.as_bytes());
        let password = STANDARD.encode(mac.finalize().into_bytes());

        Ok(TurnCredentials {
            username,
            password,
            ttl,
            uris: self.uris.clone(),
        })
    }
}
