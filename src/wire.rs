//! Wire format (NIP-44 v2 payload)
//!
//! Format (v2), base64 encoded with the standard alphabet and padding:
//!   version[1] || nonce[32] || ciphertext[N] || mac[32]
//!
//! ciphertext = ChaCha20(u16_be(len) || plaintext || zeros)
//! mac        = HMAC-SHA256(mac_key, nonce || ciphertext)

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{DecryptionError, Error};

/// Salt for HKDF-extract of the conversation key.
pub const PROTOCOL_SALT: &[u8] = b"nip44-v2";

/// Version byte for v2
pub const PROTOCOL_VERSION: u8 = 0x02;

// ---------------------------------------------------------------------------
// Component sizes
// ---------------------------------------------------------------------------

pub const VERSION_BYTES: usize = 1;
pub const NONCE_BYTES: usize = 32;
pub const MAC_BYTES: usize = 32;

pub const CONVERSATION_KEY_BYTES: usize = 32;
pub const CIPHER_KEY_BYTES: usize = 32;
pub const CIPHER_NONCE_BYTES: usize = 12;
pub const MAC_KEY_BYTES: usize = 32;

/// HKDF-expand output: cipher_key[32] || cipher_nonce[12] || mac_key[32]
pub const MESSAGE_KEYS_BYTES: usize = CIPHER_KEY_BYTES + CIPHER_NONCE_BYTES + MAC_KEY_BYTES; // 76

/// Length prefix written in front of the plaintext before padding.
pub const LENGTH_PREFIX_BYTES: usize = 2;

pub const MIN_PLAINTEXT_BYTES: usize = 0;
pub const MAX_PLAINTEXT_BYTES: usize = u16::MAX as usize; // 65535

/// Smallest padded bucket.
pub const MIN_PADDED_BYTES: usize = 32;

/// Minimum decoded payload: version + nonce + mac
pub const MIN_PAYLOAD_BYTES: usize = VERSION_BYTES + NONCE_BYTES + MAC_BYTES; // 65

/// Maximum decoded payload: version + nonce + (prefix + 65536) + mac
pub const MAX_PAYLOAD_BYTES: usize =
    VERSION_BYTES + NONCE_BYTES + LENGTH_PREFIX_BYTES + 65536 + MAC_BYTES; // 65603

/// Base64 length (with padding) of `raw_len` bytes.
pub const fn encoded_len(raw_len: usize) -> usize {
    (raw_len + 2) / 3 * 4
}

/// Shortest valid base64 payload: the smallest bucket, length prefix included.
pub const MIN_ENCODED_PAYLOAD_LEN: usize = encoded_len(
    VERSION_BYTES + NONCE_BYTES + LENGTH_PREFIX_BYTES + MIN_PADDED_BYTES + MAC_BYTES,
); // 132

pub const MAX_ENCODED_PAYLOAD_LEN: usize = encoded_len(MAX_PAYLOAD_BYTES); // 87472

/// Borrowed view of a decoded payload.
#[derive(Debug, Clone, Copy)]
pub struct WireComponents<'a> {
    pub version: u8,
    pub nonce: &'a [u8; NONCE_BYTES],
    pub ciphertext: &'a [u8],
    pub mac: &'a [u8; MAC_BYTES],
}

/// Base64-decode a payload string into raw bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, DecryptionError> {
    // '#' marks a future non-base64 encoding.
    if payload.starts_with('#') {
        return Err(DecryptionError);
    }
    // Bound the input before allocating for it.
    if payload.len() < MIN_ENCODED_PAYLOAD_LEN || payload.len() > MAX_ENCODED_PAYLOAD_LEN {
        return Err(DecryptionError);
    }
    STANDARD.decode(payload).map_err(|_| DecryptionError)
}

pub fn decode_wire(data: &[u8]) -> Result<WireComponents<'_>, DecryptionError> {
    if data.len() < MIN_PAYLOAD_BYTES || data.len() > MAX_PAYLOAD_BYTES {
        return Err(DecryptionError);
    }

    let version = data[0];
    if version != PROTOCOL_VERSION {
        return Err(DecryptionError);
    }

    let nonce_start = VERSION_BYTES;
    let nonce_end = nonce_start + NONCE_BYTES;
    let mac_start = data.len() - MAC_BYTES;

    let nonce: &[u8; NONCE_BYTES] = data[nonce_start..nonce_end]
        .try_into()
        .map_err(|_| DecryptionError)?;

    let mac: &[u8; MAC_BYTES] = data[mac_start..]
        .try_into()
        .map_err(|_| DecryptionError)?;

    Ok(WireComponents {
        version,
        nonce,
        ciphertext: &data[nonce_end..mac_start],
        mac,
    })
}

pub fn encode_wire(
    nonce: &[u8; NONCE_BYTES],
    ciphertext: &[u8],
    mac: &[u8; MAC_BYTES],
) -> Result<String, Error> {
    if ciphertext.len() < MIN_PADDED_BYTES + LENGTH_PREFIX_BYTES {
        return Err(Error::InvalidPayload("ciphertext shorter than smallest bucket"));
    }

    let mut out = Vec::with_capacity(VERSION_BYTES + NONCE_BYTES + ciphertext.len() + MAC_BYTES);

    out.push(PROTOCOL_VERSION);
    out.extend_from_slice(nonce);
    out.extend_from_slice(ciphertext);
    out.extend_from_slice(mac);

    Ok(STANDARD.encode(out))
}
