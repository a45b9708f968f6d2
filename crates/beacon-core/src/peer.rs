//! Presence records and the public peer descriptor.

use serde::{Deserialize, Serialize};

use crate::bitfield::ChunkBitfield;

/// One peer's presence in one manifest's swarm.
///
/// Absence of a record means the peer is unknown or its presence lapsed.
/// It never means "holds zero chunks".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRecord {
    pub peer_id: String,
    pub manifest_id: String,
    pub chunk_bitfield: ChunkBitfield,
    /// Upload capacity in bytes/sec.
    #[serde(default)]
    pub up_cap: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Round-trip hint in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtt_hint: Option<u64>,
    /// Client version string. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Unix ms of the most recent upsert.
    #[serde(default)]
    pub last_seen: u64,
    #[serde(default)]
    pub is_complete: bool,
}

impl PeerRecord {
    pub fn new(
        peer_id: impl Into<String>,
        manifest_id: impl Into<String>,
        chunk_bitfield: ChunkBitfield,
    ) -> Self {
        Self {
            peer_id: peer_id.into(),
            manifest_id: manifest_id.into(),
            chunk_bitfield,
            up_cap: 0,
            region: None,
            rtt_hint: None,
            version: None,
            last_seen: 0,
            is_complete: false,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_rtt(mut self, rtt_ms: u64) -> Self {
        self.rtt_hint = Some(rtt_ms);
        self
    }

    pub fn with_up_cap(mut self, bytes_per_sec: u64) -> Self {
        self.up_cap = bytes_per_sec;
        self
    }
}

/// What a requester sees for each selected peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerDescriptor {
    pub peer_id: String,
    pub chunk_bitfield: ChunkBitfield,
    pub region: Option<String>,
    pub score: f64,
    pub has_needed: bool,
}
