//! Catalogue codec
//!
//! Converts source units to a single string that can be embedded as one
//! metadata literal, and back:
//!
//! ```text
//! units ──serialize──▶ JSON ──compress──▶ gzip bytes ──base32768──▶ text
//! ```
//!
//! The plain path stops after `serialize`. Which path a producer uses is a
//! configuration choice; both decode losslessly.
//!
//! The JSON schema keeps the field order `key`, `declaredNames`, `imports`,
//! `dependencies`, `body`. `key` and `body` are required, the rest default to
//! empty, and unknown fields are ignored so newer producers can add optional
//! fields without breaking older readers.

pub mod base32768;
pub mod compress;

use tracing::trace;

use crate::catalog::SourceUnit;
use crate::error::Result;

pub use base32768::{decode as text_safe_decode, encode as text_safe_encode};
pub use compress::{compress, decompress};

/// Serialize units to canonical JSON, preserving their order
pub fn serialize(units: &[SourceUnit]) -> Result<String> {
    Ok(serde_json::to_string(units)?)
}

/// Parse units from canonical JSON
pub fn deserialize(text: &str) -> Result<Vec<SourceUnit>> {
    Ok(serde_json::from_str(text)?)
}

/// Serialize, gzip and text-safe encode
pub fn encode(units: &[SourceUnit]) -> Result<String> {
    let json = serialize(units)?;
    let compressed = compress(&json)?;
    let text = text_safe_encode(&compressed);
    trace!(
        units = units.len(),
        json_bytes = json.len(),
        compressed_bytes = compressed.len(),
        encoded_chars = text.chars().count(),
        "Encoded catalogue"
    );
    Ok(text)
}

/// Inverse of [`encode`]
pub fn decode(text: &str) -> Result<Vec<SourceUnit>> {
    let compressed = text_safe_decode(text)?;
    let json = decompress(&compressed)?;
    deserialize(&json)
}
