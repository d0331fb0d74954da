//! KDF (NIP-44 v2)
//!
//! conversation_key = HKDF-extract(SHA-256, salt="nip44-v2", ikm=ecdh_x)
//! message_keys     = HKDF-expand(SHA-256, prk=conversation_key, info=nonce, L=76)
//!                    -> cipher_key[0..32] || cipher_nonce[32..44] || mac_key[44..76]

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};
use crate::keys;
use crate::wire::{
    CIPHER_KEY_BYTES, CIPHER_NONCE_BYTES, CONVERSATION_KEY_BYTES, MAC_KEY_BYTES,
    MESSAGE_KEYS_BYTES, NONCE_BYTES, PROTOCOL_SALT,
};

/// Shared symmetric key for one (identity, identity) pair. Zeroized on drop.
///
/// Recomputed on every call; never cached here.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ConversationKey([u8; CONVERSATION_KEY_BYTES]);

impl ConversationKey {
    /// ECDH between `secret_hex` and `public_hex`, then HKDF-extract.
    ///
    /// Symmetric: `derive(a_sk, b_pk) == derive(b_sk, a_pk)`.
    pub fn derive(secret_hex: &str, public_hex: &str) -> Result<Self> {
        let secret = keys::parse_secret_key(secret_hex)?;
        let public = keys::parse_public_key(public_hex)?;
        let shared_x = keys::shared_x(&secret, &public);
        Ok(Self::from_shared_x(&shared_x))
    }

    pub(crate) fn from_shared_x(shared_x: &[u8; 32]) -> Self {
        let (mut prk, _) = Hkdf::<Sha256>::extract(Some(PROTOCOL_SALT), shared_x);
        let mut out = [0u8; CONVERSATION_KEY_BYTES];
        out.copy_from_slice(&prk);
        prk.as_mut_slice().zeroize();
        Self(out)
    }

    /// Wrap raw key bytes (known-answer tests, keys obtained elsewhere).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; CONVERSATION_KEY_BYTES] = bytes
            .try_into()
            .map_err(|_| Error::InvalidKey("conversation key must be 32 bytes"))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; CONVERSATION_KEY_BYTES] {
        &self.0
    }
}

impl core::fmt::Debug for ConversationKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("ConversationKey(..)")
    }
}

/// One-time keys for a single message. Zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MessageKeys {
    pub cipher_key: [u8; CIPHER_KEY_BYTES],
    pub cipher_nonce: [u8; CIPHER_NONCE_BYTES],
    pub mac_key: [u8; MAC_KEY_BYTES],
}

impl MessageKeys {
    pub fn derive(conversation_key: &[u8], nonce: &[u8]) -> Result<Self> {
        if conversation_key.len() != CONVERSATION_KEY_BYTES {
            return Err(Error::InvalidKey("conversation key must be 32 bytes"));
        }
        if nonce.len() != NONCE_BYTES {
            return Err(Error::InvalidNonce("nonce must be 32 bytes"));
        }

        let hk = Hkdf::<Sha256>::from_prk(conversation_key)
            .map_err(|_| Error::InvalidKey("conversation key rejected as PRK"))?;
        let mut okm = Zeroizing::new([0u8; MESSAGE_KEYS_BYTES]);
        hk.expand(nonce, &mut okm[..])
            .map_err(|_| Error::EncryptionFailed("hkdf expand"))?;

        let mut keys = Self {
            cipher_key: [0u8; CIPHER_KEY_BYTES],
            cipher_nonce: [0u8; CIPHER_NONCE_BYTES],
            mac_key: [0u8; MAC_KEY_BYTES],
        };
        let nonce_start = CIPHER_KEY_BYTES;
        let mac_start = nonce_start + CIPHER_NONCE_BYTES;
        keys.cipher_key.copy_from_slice(&okm[..nonce_start]);
        keys.cipher_nonce.copy_from_slice(&okm[nonce_start..mac_start]);
        keys.mac_key.copy_from_slice(&okm[mac_start..]);
        Ok(keys)
    }
}
