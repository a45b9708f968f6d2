//! WebRTC handshake messages ferried through the relay.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three handshake payload kinds the relay accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown signal type: {0}")]
pub struct UnknownSignalKind(pub String);

impl FromStr for SignalKind {
    type Err = UnknownSignalKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offer" => Ok(SignalKind::Offer),
            "answer" => Ok(SignalKind::Answer),
            "ice-candidate" => Ok(SignalKind::IceCandidate),
            other => Err(UnknownSignalKind(other.to_string())),
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending handshake message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMessage {
    /// `hex(blake3(from || to || timestamp_le || payload_json))`.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub from: String,
    pub to: String,
    /// Opaque SDP / ICE body. The relay never inspects it.
    pub payload: serde_json::Value,
    /// Unix ms when the relay accepted the message.
    pub timestamp: u64,
}
