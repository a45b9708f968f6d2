//! Peer selection: turns a requester's need into a ranked shortlist.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use beacon_core::{PeerDescriptor, PeerRecord};

use crate::error::ServiceError;
use crate::registry::Registry;
use crate::scorer::{self, PeerScore};

#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Upper bound on peers returned.
    pub max_peers: usize,
    /// Rank every peer without a needed chunk below every peer with one.
    pub tier_by_need: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_peers: 6,
            tier_by_need: false,
        }
    }
}

/// One get-peers request.
#[derive(Debug, Clone, Default)]
pub struct PeerQuery {
    pub manifest_id: String,
    pub needed: Vec<u32>,
    pub region: Option<String>,
    pub exclude: HashSet<String>,
    /// Caller's own cap, clamped to the configured maximum.
    pub limit: Option<usize>,
}

impl PeerQuery {
    pub fn new(manifest_id: impl Into<String>, needed: Vec<u32>) -> Self {
        Self {
            manifest_id: manifest_id.into(),
            needed,
            ..Default::default()
        }
    }
}

pub struct Selector {
    registry: Arc<Registry>,
    config: SelectorConfig,
}

impl Selector {
    pub fn new(registry: Arc<Registry>, config: SelectorConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Up to `max_peers` live peers of the manifest, best first.
    ///
    /// Never returns an excluded peer. An empty or fully excluded swarm
    /// yields an empty list.
    pub async fn select(&self, query: &PeerQuery) -> Result<Vec<PeerDescriptor>, ServiceError> {
        let candidates: Vec<String> = self
            .registry
            .list_members(&query.manifest_id)
            .await?
            .into_iter()
            .filter(|id| !query.exclude.contains(id))
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let records = self
            .registry
            .fetch_many(&query.manifest_id, &candidates)
            .await?;
        let scores = scorer::score_all(&records, &query.needed, query.region.as_deref());

        let mut ranked: Vec<(PeerRecord, PeerScore)> = records.into_iter().zip(scores).collect();
        // sort_by is stable: equal scores keep fetch order
        if self.config.tier_by_need {
            ranked.sort_by(|(_, a), (_, b)| {
                b.has_needed
                    .cmp(&a.has_needed)
                    .then_with(|| by_score_desc(a, b))
            });
        } else {
            ranked.sort_by(|(_, a), (_, b)| by_score_desc(a, b));
        }

        let limit = query
            .limit
            .map_or(self.config.max_peers, |l| l.min(self.config.max_peers));
        ranked.truncate(limit);

        tracing::debug!(
            manifest = %query.manifest_id,
            candidates = candidates.len(),
            returned = ranked.len(),
            "peer selection"
        );
        for (_, s) in &ranked {
            tracing::trace!(peer = %s.peer_id, score = s.score, factors = ?s.factors, "selected");
        }

        Ok(ranked
            .into_iter()
            .map(|(record, s)| PeerDescriptor {
                peer_id: record.peer_id,
                chunk_bitfield: record.chunk_bitfield,
                region: record.region,
                score: s.score,
                has_needed: s.has_needed,
            })
            .collect())
    }
}

fn by_score_desc(a: &PeerScore, b: &PeerScore) -> Ordering {
    b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
}
