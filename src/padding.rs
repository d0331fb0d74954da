//! Length-hiding padding.
//!
//! Layout:
//!   u16_be(len) || plaintext || zeros(calc_padded_len(len) - len)
//!
//! Buckets are 32 bytes wide up to 256, then one eighth of the next power
//! of two, so the padded size leaks only a coarse length class.

use crate::error::{Error, Result};
use crate::wire::{LENGTH_PREFIX_BYTES, MAX_PLAINTEXT_BYTES, MIN_PADDED_BYTES};

/// Bucketed length for an unpadded plaintext of `unpadded_len` bytes.
///
/// Non-decreasing and never smaller than `unpadded_len`.
pub fn calc_padded_len(unpadded_len: usize) -> usize {
    if unpadded_len <= MIN_PADDED_BYTES {
        return MIN_PADDED_BYTES;
    }
    let n = unpadded_len - 1;
    let next_power = 1usize << (usize::BITS - n.leading_zeros());
    let chunk = if next_power <= 256 { 32 } else { next_power / 8 };
    chunk * (n / chunk + 1)
}

/// Total size of the padded buffer, length prefix included.
#[inline]
pub fn padded_buffer_len(unpadded_len: usize) -> usize {
    LENGTH_PREFIX_BYTES + calc_padded_len(unpadded_len)
}

pub fn pad(plaintext: &[u8]) -> Result<Vec<u8>> {
    let len = plaintext.len();
    if len > MAX_PLAINTEXT_BYTES {
        return Err(Error::InvalidPlaintextLength(len));
    }

    let mut out = Vec::with_capacity(padded_buffer_len(len));
    out.extend_from_slice(&(len as u16).to_be_bytes());
    out.extend_from_slice(plaintext);
    out.resize(padded_buffer_len(len), 0);
    Ok(out)
}

/// Strip padding. The buffer must be exactly the bucket size the prefix implies.
pub fn unpad(padded: &[u8]) -> Result<&[u8]> {
    if padded.len() < LENGTH_PREFIX_BYTES {
        return Err(Error::PaddingError("buffer shorter than length prefix"));
    }
    let len = u16::from_be_bytes([padded[0], padded[1]]) as usize;
    let end = LENGTH_PREFIX_BYTES + len;
    if end > padded.len() {
        return Err(Error::PaddingError("length prefix exceeds buffer"));
    }
    if padded.len() != padded_buffer_len(len) {
        return Err(Error::PaddingError("buffer is not the expected bucket size"));
    }
    Ok(&padded[LENGTH_PREFIX_BYTES..end])
}
