//! Presence registry: who is in which manifest's swarm right now.
//!
//! A peer is present exactly as long as its record key is live. Each
//! manifest also keeps a membership set so readers need not scan every
//! record. The record write and the membership update are two separate
//! store operations, so membership may briefly list a peer whose record
//! is gone. Readers tolerate that and prune as they go; the sweep catches
//! the rest.

use std::sync::Arc;
use std::time::Duration;

use beacon_core::{now_ms, PeerRecord};

use crate::error::ServiceError;
use crate::store::{keys, PeerStateStore};

pub struct Registry {
    store: Arc<dyn PeerStateStore>,
    presence_ttl: Duration,
}

impl Registry {
    pub fn new(store: Arc<dyn PeerStateStore>, presence_ttl: Duration) -> Self {
        Self {
            store,
            presence_ttl,
        }
    }

    /// Standard lifetime of a presence record.
    pub fn presence_ttl(&self) -> Duration {
        self.presence_ttl
    }

    /// Write or refresh a peer's record, then add it to its manifest's membership.
    ///
    /// Stamps `last_seen`. The membership set's expiry is extended to at
    /// least `ttl` and never shortened.
    pub async fn upsert(&self, mut record: PeerRecord, ttl: Duration) -> Result<PeerRecord, ServiceError> {
        record.last_seen = now_ms();
        let json = serde_json::to_string(&record)
            .map_err(|e| ServiceError::Internal(format!("encode peer record: {e}")))?;

        let manifest_key = keys::manifest(&record.manifest_id);
        self.store
            .set_ex(&keys::peer(&record.manifest_id, &record.peer_id), json, ttl)
            .await?;
        let added = self.store.sadd(&manifest_key, &record.peer_id).await?;
        self.store.expire_max(&manifest_key, ttl).await?;

        if added {
            tracing::info!(
                manifest = %record.manifest_id,
                peer = %record.peer_id,
                chunks = record.chunk_bitfield.count_held(),
                "peer joined swarm"
            );
        } else {
            tracing::debug!(
                manifest = %record.manifest_id,
                peer = %record.peer_id,
                "peer presence refreshed"
            );
        }
        Ok(record)
    }

    /// Mark a peer as holding the full manifest.
    ///
    /// `NotFound` means the peer's presence already lapsed; the caller
    /// should re-announce.
    pub async fn mark_complete(&self, manifest_id: &str, peer_id: &str) -> Result<PeerRecord, ServiceError> {
        let mut record = self.fetch(manifest_id, peer_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("peer {peer_id} not present in manifest {manifest_id}"))
        })?;
        record.is_complete = true;
        let record = self.upsert(record, self.presence_ttl).await?;
        tracing::info!(manifest = %manifest_id, peer = %peer_id, "peer completed manifest");
        Ok(record)
    }

    /// Read one peer's record. Undecodable records count as absent.
    pub async fn fetch(&self, manifest_id: &str, peer_id: &str) -> Result<Option<PeerRecord>, ServiceError> {
        let raw = match self.store.get(&keys::peer(manifest_id, peer_id)).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(
                    manifest = %manifest_id,
                    peer = %peer_id,
                    error = %e,
                    "discarding undecodable peer record"
                );
                Ok(None)
            }
        }
    }

    /// Membership of a manifest. May include peers whose record already expired.
    pub async fn list_members(&self, manifest_id: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self.store.smembers(&keys::manifest(manifest_id)).await?)
    }

    /// Live records for `peer_ids`, in input order.
    ///
    /// Ids without a live record are dropped from the result and removed
    /// from the manifest's membership.
    pub async fn fetch_many(&self, manifest_id: &str, peer_ids: &[String]) -> Result<Vec<PeerRecord>, ServiceError> {
        let mut live = Vec::with_capacity(peer_ids.len());
        for peer_id in peer_ids {
            match self.fetch(manifest_id, peer_id).await? {
                Some(record) => live.push(record),
                None => {
                    if let Some(record) = self.prune_member(manifest_id, peer_id).await? {
                        live.push(record);
                    }
                }
            }
        }
        Ok(live)
    }

    /// Drop `peer_id` from membership after its record was seen absent.
    ///
    /// A re-announce can land between that read and the removal, and its
    /// `sadd` is a no-op while the id is still listed. Re-reading after the
    /// removal catches that case and restores the member.
    async fn prune_member(&self, manifest_id: &str, peer_id: &str) -> Result<Option<PeerRecord>, ServiceError> {
        let manifest_key = keys::manifest(manifest_id);
        self.store.srem(&manifest_key, peer_id).await?;

        match self.fetch(manifest_id, peer_id).await? {
            Some(record) => {
                self.store.sadd(&manifest_key, peer_id).await?;
                self.store.expire_max(&manifest_key, self.presence_ttl).await?;
                tracing::debug!(manifest = %manifest_id, peer = %peer_id, "member re-announced during prune, kept");
                Ok(Some(record))
            }
            None => {
                tracing::debug!(manifest = %manifest_id, peer = %peer_id, "pruned stale member");
                Ok(None)
            }
        }
    }

    /// Remove every member of `manifest_id` without a live record.
    /// Returns how many were removed.
    pub async fn prune(&self, manifest_id: &str) -> Result<usize, ServiceError> {
        let members = self.list_members(manifest_id).await?;
        let live = self.fetch_many(manifest_id, &members).await?;
        Ok(members.len() - live.len())
    }

    /// Manifests that currently have a membership set.
    pub async fn manifests(&self) -> Result<Vec<String>, ServiceError> {
        let found = self.store.keys(keys::MANIFEST_PREFIX).await?;
        Ok(found
            .into_iter()
            .filter_map(|k| k.strip_prefix(keys::MANIFEST_PREFIX).map(String::from))
            .collect())
    }

    /// Number of live presence records across all manifests.
    pub async fn count_peers(&self) -> Result<usize, ServiceError> {
        Ok(self.store.keys(keys::PEER_PREFIX).await?.len())
    }
}
