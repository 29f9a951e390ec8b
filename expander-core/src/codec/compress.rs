//! Gzip compression of serialized catalogue text
//!
//! The gzip header is pinned (mtime 0, no file name, no comment) so the same
//! text always compresses to the same bytes on every platform.

use flate2::read::GzDecoder;
use flate2::{Compression, GzBuilder};
use std::io::{Read, Write};

use crate::error::{ExpanderError, Result};

/// Gzip the UTF-8 bytes of `text`
pub fn compress(text: &str) -> Result<Vec<u8>> {
    let mut encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| ExpanderError::CorruptStream(format!("failed to compress: {e}")))?;
    encoder
        .finish()
        .map_err(|e| ExpanderError::CorruptStream(format!("failed to compress: {e}")))
}

/// Inflate a gzip stream back into UTF-8 text
pub fn decompress(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(ExpanderError::CorruptStream(
            "compressed stream is empty".to_string(),
        ));
    }

    let mut text = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut text)
        .map_err(|e| ExpanderError::CorruptStream(format!("failed to decompress: {e}")))?;
    Ok(text)
}
