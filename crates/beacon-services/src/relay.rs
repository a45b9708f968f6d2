//! Signaling relay with a short-lived mailbox per recipient.
//!
//! Each recipient has one FIFO queue in the store. Senders append; the
//! recipient's poll drains the whole queue in a single atomic store
//! operation, so two concurrent polls can never both receive the same
//! message. Delivery is at most once: a message is gone the moment it is
//! drained, and undelivered messages lapse after the signal TTL.

use std::sync::Arc;
use std::time::Duration;

use beacon_core::{now_ms, SignalKind, SignalMessage};

use crate::error::ServiceError;
use crate::store::{keys, PeerStateStore};

pub struct Relay {
    store: Arc<dyn PeerStateStore>,
    ttl: Duration,
}

/// Stable per-message id: blake3 over sender, recipient, timestamp, and payload.
pub fn message_id(from: &str, to: &str, timestamp: u64, payload: &serde_json::Value) -> String {
    let mut h = blake3::Hasher::new();
    h.update(from.as_bytes());
    h.update(&[0]);
    h.update(to.as_bytes());
    h.update(&[0]);
    h.update(&timestamp.to_le_bytes());
    h.update(payload.to_string().as_bytes());
    hex::encode(h.finalize().as_bytes())
}

impl Relay {
    pub fn new(store: Arc<dyn PeerStateStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Queue a handshake message for `to`.
    ///
    /// Messages from different senders, or successive messages from one
    /// sender, never overwrite each other.
    pub async fn enqueue(
        &self,
        kind: SignalKind,
        from: &str,
        to: &str,
        payload: serde_json::Value,
    ) -> Result<SignalMessage, ServiceError> {
        if from.is_empty() {
            return Err(ServiceError::invalid("missing sender"));
        }
        if to.is_empty() {
            return Err(ServiceError::invalid("missing required field: to"));
        }
        if payload.is_null() {
            return Err(ServiceError::invalid("missing required field: payload"));
        }
        if from == to {
            return Err(ServiceError::invalid("cannot signal yourself"));
        }

        let timestamp = now_ms();
        let message = SignalMessage {
            id: message_id(from, to, timestamp, &payload),
            kind,
            from: from.to_string(),
            to: to.to_string(),
            payload,
            timestamp,
        };
        let json = serde_json::to_string(&message)
            .map_err(|e| ServiceError::Internal(format!("encode signal: {e}")))?;
        self.store
            .push(&keys::signal_queue(to), json, self.ttl)
            .await?;

        tracing::debug!(kind = %kind, from = %from, to = %to, "signal queued");
        Ok(message)
    }

    /// Take every pending message for `recipient_id`, oldest first.
    ///
    /// An empty mailbox is an empty list. Messages older than the signal
    /// TTL are discarded even if the queue itself was kept alive by newer
    /// pushes.
    pub async fn drain_for(&self, recipient_id: &str) -> Result<Vec<SignalMessage>, ServiceError> {
        let raw = self.store.drain(&keys::signal_queue(recipient_id)).await?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        let cutoff = now_ms().saturating_sub(self.ttl.as_millis() as u64);
        let mut messages = Vec::with_capacity(raw.len());
        let mut stale = 0usize;
        for item in raw {
            match serde_json::from_str::<SignalMessage>(&item) {
                Ok(m) if m.timestamp < cutoff => stale += 1,
                Ok(m) => messages.push(m),
                Err(e) => {
                    tracing::warn!(recipient = %recipient_id, error = %e, "dropping undecodable signal");
                }
            }
        }

        tracing::debug!(
            recipient = %recipient_id,
            delivered = messages.len(),
            stale,
            "signals drained"
        );
        Ok(messages)
    }
}
