//! Peer state store, the single owner of all persisted tracker state.
//!
//! The services never hold mutable state of their own. They talk to a
//! store through this trait, which is injected at construction so tests
//! can substitute an in-memory backend.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Expiring key/value pairs, expiring named sets, and expiring FIFO queues.
///
/// Every key carries at most one expiry. Expired keys are indistinguishable
/// from keys that were never written.
#[async_trait]
pub trait PeerStateStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value and expiry.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> StoreResult<()>;

    /// Returns true if a live key was removed.
    async fn del(&self, key: &str) -> StoreResult<bool>;

    /// Add `member` to the set at `set`. Returns true if it was not already present.
    async fn sadd(&self, set: &str, member: &str) -> StoreResult<bool>;

    /// Returns true if `member` was present.
    async fn srem(&self, set: &str, member: &str) -> StoreResult<bool>;

    /// Members in a stable order. Missing set = empty.
    async fn smembers(&self, set: &str) -> StoreResult<Vec<String>>;

    /// Extend the expiry of `key` to `max(current, ttl)`. Never shortens.
    ///
    /// A key without an expiry receives one. Returns false if the key is absent.
    async fn expire_max(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Append `value` to the queue at `queue` and reset the queue's expiry to `ttl`.
    async fn push(&self, queue: &str, value: String, ttl: Duration) -> StoreResult<()>;

    /// Atomically remove and return every item in the queue, oldest first.
    async fn drain(&self, queue: &str) -> StoreResult<Vec<String>>;

    /// Live keys starting with `prefix`.
    async fn keys(&self, prefix: &str) -> StoreResult<Vec<String>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Key layout shared by every service.
///
/// Ids are opaque and may contain `:`. A record key carries two ids, so
/// the manifest id is length-prefixed to keep `(a, b:c)` and `(a:b, c)`
/// apart. Single-id keys need no prefix.
pub mod keys {
    pub const PEER_PREFIX: &str = "peer:";
    pub const MANIFEST_PREFIX: &str = "manifest:";
    pub const SIGNAL_PREFIX: &str = "signal:";

    pub fn peer(manifest_id: &str, peer_id: &str) -> String {
        format!("{PEER_PREFIX}{}:{manifest_id}:{peer_id}", manifest_id.len())
    }

    pub fn manifest(manifest_id: &str) -> String {
        format!("{MANIFEST_PREFIX}{manifest_id}")
    }

    pub fn signal_queue(recipient_id: &str) -> String {
        format!("{SIGNAL_PREFIX}{recipient_id}")
    }
}
