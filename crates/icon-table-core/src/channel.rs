//! Alpha channel extraction and its white-tint inverse.

use crate::error::{IconTableError, Result};
use crate::model::RGBA_CHANNELS;

/// Projects an interleaved RGBA byte buffer onto its alpha channel.
///
/// Byte 3 of every pixel is kept, in source order. No thresholding is applied.
pub fn reduce_to_alpha(rgba: &[u8]) -> Result<Vec<u8>> {
    let step = RGBA_CHANNELS as usize;
    if rgba.len() % step != 0 {
        return Err(IconTableError::InvalidBufferLength { len: rgba.len() });
    }
    Ok(rgba.chunks_exact(step).map(|px| px[3]).collect())
}

/// Expands an alpha stream to RGBA, writing `255,255,255,a` per pixel.
pub fn expand_alpha(alpha: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(alpha.len() * RGBA_CHANNELS as usize);
    for &a in alpha {
        out.extend_from_slice(&[255, 255, 255, a]);
    }
    out
}
