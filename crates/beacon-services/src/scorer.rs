//! Peer scoring. How good a candidate is as an upload partner.
//!
//! Five independent factors, summed without normalisation:
//!
//! | factor     | points        |
//! |------------|---------------|
//! | need match | 0 or 100      |
//! | region     | 0, 10, or 30  |
//! | latency    | 5 to 30       |
//! | upload     | 0 to 20       |
//! | completion | 0 or 20       |
//!
//! The need-match factor outweighs every other factor combined, so a
//! candidate holding nothing the requester needs cannot outrank one that does.

use beacon_core::{ChunkBitfield, PeerRecord};
use serde::Serialize;

pub const NEED_MATCH_POINTS: f64 = 100.0;
pub const REGION_MATCH_POINTS: f64 = 30.0;
pub const REGION_OTHER_POINTS: f64 = 10.0;
pub const UPLOAD_CAP_POINTS: f64 = 20.0;
pub const COMPLETION_POINTS: f64 = 20.0;

/// RTT assumed for peers that sent no hint.
pub const MISSING_RTT_MS: u64 = 999;

/// (exclusive upper bound in ms, points). Anything slower gets [`LATENCY_FLOOR_POINTS`].
const LATENCY_BANDS: [(u64, f64); 3] = [(50, 30.0), (100, 20.0), (200, 10.0)];
const LATENCY_FLOOR_POINTS: f64 = 5.0;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Per-factor breakdown of a score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFactors {
    pub need_match: f64,
    pub region: f64,
    pub latency: f64,
    pub upload: f64,
    pub completion: f64,
}

impl ScoreFactors {
    pub fn total(&self) -> f64 {
        self.need_match + self.region + self.latency + self.upload + self.completion
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerScore {
    pub peer_id: String,
    pub score: f64,
    pub factors: ScoreFactors,
    pub has_needed: bool,
}

/// True if `bitfield` holds at least one chunk in `needed`.
pub fn has_needed(bitfield: &ChunkBitfield, needed: &[u32]) -> bool {
    bitfield.has_any(needed)
}

pub fn region_points(candidate: Option<&str>, requester: Option<&str>) -> f64 {
    match (candidate, requester) {
        (None, _) => 0.0,
        (Some(c), Some(r)) if c == r => REGION_MATCH_POINTS,
        (Some(_), _) => REGION_OTHER_POINTS,
    }
}

/// Non-increasing in `rtt_ms`.
pub fn latency_points(rtt_ms: Option<u64>) -> f64 {
    let rtt = rtt_ms.unwrap_or(MISSING_RTT_MS);
    LATENCY_BANDS
        .iter()
        .find(|(bound, _)| rtt < *bound)
        .map(|(_, points)| *points)
        .unwrap_or(LATENCY_FLOOR_POINTS)
}

/// One point per MiB/s, flat beyond [`UPLOAD_CAP_POINTS`].
pub fn upload_points(up_cap: u64) -> f64 {
    (up_cap as f64 / BYTES_PER_MIB).min(UPLOAD_CAP_POINTS)
}

/// Score one candidate for a requester needing `needed` from `region`.
pub fn score(record: &PeerRecord, needed: &[u32], region: Option<&str>) -> PeerScore {
    let has_needed = has_needed(&record.chunk_bitfield, needed);
    let factors = ScoreFactors {
        need_match: if has_needed { NEED_MATCH_POINTS } else { 0.0 },
        region: region_points(record.region.as_deref(), region),
        latency: latency_points(record.rtt_hint),
        upload: upload_points(record.up_cap),
        completion: if record.is_complete {
            COMPLETION_POINTS
        } else {
            0.0
        },
    };
    PeerScore {
        peer_id: record.peer_id.clone(),
        score: factors.total(),
        factors,
        has_needed,
    }
}

/// Score every record, preserving input order.
pub fn score_all(records: &[PeerRecord], needed: &[u32], region: Option<&str>) -> Vec<PeerScore> {
    records.iter().map(|r| score(r, needed, region)).collect()
}
