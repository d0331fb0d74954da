//! Symmetric layer: ChaCha20 + HMAC-SHA256 (NIP-44 v2)
//!
//! Encrypt-then-MAC. The MAC covers `nonce || ciphertext` and is checked in
//! constant time before the ciphertext is decrypted or unpadded.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use getrandom::getrandom;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{DecryptionError, Error, Result};
use crate::kdf::{ConversationKey, MessageKeys};
use crate::padding;
use crate::wire::{self, MAC_BYTES, NONCE_BYTES};

type HmacSha256 = Hmac<Sha256>;

/// Result of [`encrypt`]: the base64 payload and the message nonce it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub payload: String,
    pub nonce: [u8; NONCE_BYTES],
}

/// Generate a random 32-byte message nonce.
pub fn nonce() -> Result<[u8; NONCE_BYTES]> {
    let mut n = [0u8; NONCE_BYTES];
    getrandom(&mut n).map_err(|_| Error::Randomness)?;
    Ok(n)
}

/// Encrypt with a fresh random nonce.
pub fn encrypt(plaintext: &str, conversation_key: &ConversationKey) -> Result<EncryptedPayload> {
    let nonce = nonce()?;
    encrypt_with_nonce(plaintext, conversation_key, &nonce)
}

/// Encrypt with a caller-chosen nonce. Reusing a nonce under the same key
/// breaks confidentiality; this exists for known-answer tests.
pub fn encrypt_with_nonce(
    plaintext: &str,
    conversation_key: &ConversationKey,
    nonce: &[u8],
) -> Result<EncryptedPayload> {
    let keys = MessageKeys::derive(conversation_key.as_bytes(), nonce)?;
    let nonce: [u8; NONCE_BYTES] = nonce
        .try_into()
        .map_err(|_| Error::InvalidNonce("nonce must be 32 bytes"))?;

    let mut buf = Zeroizing::new(padding::pad(plaintext.as_bytes())?);
    apply_keystream(&keys, &mut buf);
    let mac = hmac_aad(&keys.mac_key, &nonce, &buf)?;

    let payload = wire::encode_wire(&nonce, &buf, &mac)?;
    Ok(EncryptedPayload { payload, nonce })
}

/// Decrypt a base64 payload. Every failure is the same [`DecryptionError`].
pub fn decrypt(
    payload: &str,
    conversation_key: &ConversationKey,
) -> core::result::Result<String, DecryptionError> {
    let raw = wire::decode_payload(payload)?;
    let parts = wire::decode_wire(&raw)?;

    let keys = MessageKeys::derive(conversation_key.as_bytes(), parts.nonce)?;
    let expected = hmac_aad(&keys.mac_key, parts.nonce, parts.ciphertext)?;
    if !bool::from(expected[..].ct_eq(&parts.mac[..])) {
        return Err(DecryptionError);
    }

    let mut buf = Zeroizing::new(parts.ciphertext.to_vec());
    apply_keystream(&keys, &mut buf);
    let plaintext = padding::unpad(&buf)?;
    String::from_utf8(plaintext.to_vec()).map_err(|_| DecryptionError)
}

/// ChaCha20 (IETF, 12-byte nonce, counter from 0). Encrypts and decrypts.
fn apply_keystream(keys: &MessageKeys, buf: &mut Vec<u8>) {
    let mut cipher = ChaCha20::new(
        chacha20::Key::from_slice(&keys.cipher_key),
        chacha20::Nonce::from_slice(&keys.cipher_nonce),
    );
    cipher.apply_keystream(buf);
}

fn hmac_aad(mac_key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<[u8; MAC_BYTES]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key)
        .map_err(|_| Error::InvalidKey("mac key"))?;
    mac.update(nonce);
    mac.update(ciphertext);
    Ok(mac.finalize().into_bytes().into())
}
