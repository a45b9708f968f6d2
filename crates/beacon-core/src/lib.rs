//! beacon-core — shared data model and configuration for the Beacon tracker.
//! All other Beacon crates depend on this one.

pub mod bitfield;
pub mod config;
pub mod peer;
pub mod signal;

pub use bitfield::{BitfieldError, ChunkBitfield};
pub use config::BeaconConfig;
pub use peer::{PeerDescriptor, PeerRecord};
pub use signal::{SignalKind, SignalMessage, UnknownSignalKind};

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time in unix milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
