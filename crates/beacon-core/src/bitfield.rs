//! Chunk bitfield: which chunks of a manifest a peer holds.
//!
//! Chunk `c` lives in byte `c / 8` at bit `c % 8`, least significant bit
//! first. Indices past the end of the buffer are not held. On the wire the
//! buffer travels as lowercase hex; standard base64 is accepted on input.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BitfieldError {
    #[error("bitfield is empty")]
    Empty,
    #[error("bitfield is neither hex nor base64")]
    Malformed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkBitfield(Vec<u8>);

impl ChunkBitfield {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Build a bitfield with exactly the given chunks set.
    pub fn from_chunks(chunks: &[u32]) -> Self {
        let mut field = Self::default();
        for &c in chunks {
            field.set(c);
        }
        field
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Does this bitfield hold chunk `chunk`?
    pub fn has(&self, chunk: u32) -> bool {
        let byte = (chunk / 8) as usize;
        match self.0.get(byte) {
            Some(b) => b & (1 << (chunk % 8)) != 0,
            None => false,
        }
    }

    /// True if at least one of `needed` is held.
    pub fn has_any(&self, needed: &[u32]) -> bool {
        needed.iter().any(|&c| self.has(c))
    }

    /// Mark chunk `chunk` as held, growing the buffer if needed.
    pub fn set(&mut self, chunk: u32) {
        let byte = (chunk / 8) as usize;
        if byte >= self.0.len() {
            self.0.resize(byte + 1, 0);
        }
        self.0[byte] |= 1 << (chunk % 8);
    }

    pub fn count_held(&self) -> u32 {
        self.0.iter().map(|b| b.count_ones()).sum()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Decode a transport string: hex first, then standard base64.
    pub fn decode(s: &str) -> Result<Self, BitfieldError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BitfieldError::Empty);
        }
        if let Ok(bytes) = hex::decode(s) {
            return Ok(Self(bytes));
        }
        STANDARD
            .decode(s)
            .map(Self)
            .map_err(|_| BitfieldError::Malformed)
    }
}

impl FromStr for ChunkBitfield {
    type Err = BitfieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for ChunkBitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ChunkBitfield {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChunkBitfield {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_order_is_lsb_first_within_byte() {
        // 0x08 = bit 3 of byte 0, 0x01 = bit 0 of byte 1 (chunk 8)
        let field = ChunkBitfield::from_bytes(vec![0x08, 0x01]);
        assert!(field.has(3));
        assert!(field.has(8));
        assert!(!field.has(0));
        assert!(!field.has(7));
        assert!(!field.has(9));
    }

    #[test]
    fn index_past_end_is_not_held() {
        let field = ChunkBitfield::from_bytes(vec![0xff]);
        assert!(field.has(7));
        assert!(!field.has(8));
        assert!(!field.has(u32::MAX));
    }

    #[test]
    fn has_matches_byte_and_bit_for_every_index() {
        let bytes = vec![0b1010_0101, 0x00, 0xff, 0x10];
        let field = ChunkBitfield::from_bytes(bytes.clone());
        for c in 0..48u32 {
            let expected = match bytes.get((c / 8) as usize) {
                Some(b) => (b >> (c % 8)) & 1 == 1,
                None => false,
            };
            assert_eq!(field.has(c), expected, "chunk {c}");
            assert_eq!(field.has_any(&[c]), expected, "chunk {c}");
        }
    }

    #[test]
    fn has_any_over_list() {
        let field = ChunkBitfield::from_chunks(&[2, 17]);
        assert!(field.has_any(&[0, 1, 17]));
        assert!(!field.has_any(&[0, 1, 3]));
        assert!(!field.has_any(&[]));
    }

    #[test]
    fn from_chunks_grows_buffer() {
        let field = ChunkBitfield::from_chunks(&[3, 20]);
        assert_eq!(field.as_bytes(), &[0x08, 0x00, 0x10]);
        assert_eq!(field.count_held(), 2);
        assert_eq!(field.to_hex(), "080010");
    }

    #[test]
    fn decode_accepts_hex_then_base64() {
        assert_eq!(
            ChunkBitfield::decode("08ff").unwrap().as_bytes(),
            &[0x08, 0xff]
        );
        // "CP8=" is base64 for [0x08, 0xff] and is not valid hex
        assert_eq!(
            ChunkBitfield::decode("CP8=").unwrap().as_bytes(),
            &[0x08, 0xff]
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(ChunkBitfield::decode(""), Err(BitfieldError::Empty));
        assert_eq!(ChunkBitfield::decode("  "), Err(BitfieldError::Empty));
        assert_eq!(ChunkBitfield::decode("zz!"), Err(BitfieldError::Malformed));
    }

    #[test]
    fn serde_uses_hex_string() {
        let field = ChunkBitfield::from_chunks(&[0, 9]);
        let json = serde_json::to_string(&field).unwrap();
        assert_eq!(json, "\"0102\"");
        let back: ChunkBitfield = serde_json::from_str(&json).unwrap();
        assert_eq!(back, field);
    }
}
