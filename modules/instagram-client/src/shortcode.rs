//! Conversion between post URL segments (the `p/<code>/` part of a
//! permalink) and numeric media ids. The segment is the media id in
//! base 64 over the URL-safe alphabet, most significant digit first.

use crate::error::{InstagramError, Result};

const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Decode a URL segment into the numeric media id.
pub fn media_id_from_segment(segment: &str) -> Result<u64> {
    if segment.is_empty() {
        return Err(InstagramError::InvalidPostId(segment.to_string()));
    }
    let mut id: u64 = 0;
    for byte in segment.bytes() {
        let digit = ALPHABET
            .iter()
            .position(|&c| c == byte)
            .ok_or_else(|| InstagramError::InvalidPostId(segment.to_string()))?;
        id = id
            .checked_mul(64)
            .and_then(|v| v.checked_add(digit as u64))
            .ok_or_else(|| InstagramError::InvalidPostId(segment.to_string()))?;
    }
    Ok(id)
}

/// Encode a numeric media id as its URL segment.
pub fn segment_from_media_id(mut id: u64) -> String {
    if id == 0 {
        return (ALPHABET[0] as char).to_string();
    }
    let mut digits = Vec::new();
    while id > 0 {
        digits.push(ALPHABET[(id % 64) as usize]);
        id /= 64;
    }
    digits.reverse();
    String::from_utf8(digits).expect("alphabet is ascii")
}
