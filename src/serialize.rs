//! Serializer Module
//!
//! Converts values to and from bytes, choosing a format per value: plain
//! structured data goes through JSON, values JSON cannot represent fall
//! back to bincode. Decoding dispatches purely on the stored format tag,
//! never on content sniffing.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

// == Payload Format ==
/// Serialization format tag stored alongside every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    Json,
    Binary,
}

impl PayloadFormat {
    /// Single-byte wire tag prepended to framed payloads.
    fn wire_tag(&self) -> u8 {
        match self {
            PayloadFormat::Json => b'J',
            PayloadFormat::Binary => b'B',
        }
    }

    fn from_wire_tag(tag: u8) -> Option<Self> {
        match tag {
            b'J' => Some(PayloadFormat::Json),
            b'B' => Some(PayloadFormat::Binary),
            _ => None,
        }
    }
}

// == Encode ==
/// Serializes a value, preferring JSON and falling back to bincode.
///
/// # Returns
/// The encoded bytes and the format they were encoded with.
pub fn encode<T: Serialize>(value: &T) -> Result<(Vec<u8>, PayloadFormat)> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Ok((bytes, PayloadFormat::Json)),
        Err(json_err) => match bincode::serialize(value) {
            Ok(bytes) => Ok((bytes, PayloadFormat::Binary)),
            Err(bin_err) => Err(CacheError::Serialization(format!(
                "json: {}; bincode: {}",
                json_err, bin_err
            ))),
        },
    }
}

// == Decode ==
/// Deserializes bytes according to their stored format tag.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], format: PayloadFormat) -> Result<T> {
    match format {
        PayloadFormat::Json => serde_json::from_slice(bytes)
            .map_err(|e| CacheError::Serialization(e.to_string())),
        PayloadFormat::Binary => bincode::deserialize(bytes)
            .map_err(|e| CacheError::Serialization(e.to_string())),
    }
}

// == Wire Framing ==
/// Prepends the format tag byte so the backing store holds self-describing
/// buffers. The fallback store keeps payload and tag as separate fields and
/// does not use framing.
pub fn frame(bytes: &[u8], format: PayloadFormat) -> Vec<u8> {
    let mut framed = Vec::with_capacity(bytes.len() + 1);
    framed.push(format.wire_tag());
    framed.extend_from_slice(bytes);
    framed
}

/// Splits a framed buffer back into payload and format.
///
/// Empty buffers and unknown tags are corrupt entries; the manager treats
/// them as misses and deletes them.
pub fn unframe(buf: &[u8]) -> Result<(&[u8], PayloadFormat)> {
    let (&tag, payload) = buf
        .split_first()
        .ok_or_else(|| CacheError::Serialization("Empty framed buffer".to_string()))?;
    let format = PayloadFormat::from_wire_tag(tag).ok_or_else(|| {
        CacheError::Serialization(format!("Unknown format tag: 0x{:02x}", tag))
    })?;
    Ok((payload, format))
}
