//! secp256k1 key handling
//!
//! Identities are BIP-340 x-only public keys (64 hex chars) and 32-byte
//! secret scalars (64 hex chars). ECDH accepts either an x-only key, which
//! is lifted with the even-Y prefix `02`, or a 33-byte compressed SEC1 key.
//!
//! Shared secret fed to the KDF:
//!   x-coordinate of (secret * public)             (32 bytes)

use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use rand_core::{OsRng, RngCore};
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};

pub const SECRET_KEY_HEX_LEN: usize = 64;
pub const X_ONLY_PUBKEY_HEX_LEN: usize = 64;
pub const COMPRESSED_PUBKEY_HEX_LEN: usize = 66;

/// Attempts before giving up on drawing a valid scalar. A 32-byte draw is
/// out of range with probability ~2^-128, so this only trips on a broken RNG.
const MAX_KEYGEN_ATTEMPTS: usize = 8;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_secret_key(secret_hex: &str) -> Result<SecretKey> {
    if secret_hex.len() != SECRET_KEY_HEX_LEN {
        return Err(Error::InvalidKey("secret key must be 64 hex chars"));
    }
    let mut bytes = Zeroizing::new([0u8; 32]);
    hex::decode_to_slice(secret_hex, &mut bytes[..])
        .map_err(|_| Error::InvalidKey("secret key is not hex"))?;
    SecretKey::from_slice(&bytes[..]).map_err(|_| Error::InvalidKey("secret key out of range"))
}

/// Parse an x-only (64 hex) or compressed (66 hex, `02`/`03`) public key.
pub fn parse_public_key(public_hex: &str) -> Result<PublicKey> {
    let mut sec1 = [0u8; 33];
    match public_hex.len() {
        X_ONLY_PUBKEY_HEX_LEN => {
            sec1[0] = 0x02;
            hex::decode_to_slice(public_hex, &mut sec1[1..])
                .map_err(|_| Error::InvalidKey("public key is not hex"))?;
        }
        COMPRESSED_PUBKEY_HEX_LEN => {
            hex::decode_to_slice(public_hex, &mut sec1)
                .map_err(|_| Error::InvalidKey("public key is not hex"))?;
            if sec1[0] != 0x02 && sec1[0] != 0x03 {
                return Err(Error::InvalidKey("public key prefix must be 02 or 03"));
            }
        }
        _ => return Err(Error::InvalidKey("public key must be 64 or 66 hex chars")),
    }
    PublicKey::from_sec1_bytes(&sec1).map_err(|_| Error::InvalidKey("public key not on curve"))
}

/// True for a 64-hex x-only key that lifts to a curve point.
pub fn is_valid_pubkey_hex(public_hex: &str) -> bool {
    public_hex.len() == X_ONLY_PUBKEY_HEX_LEN && parse_public_key(public_hex).is_ok()
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// x-only hex encoding of a public key.
pub fn x_only_hex(public: &PublicKey) -> String {
    let point = public.to_encoded_point(true);
    hex::encode(&point.as_bytes()[1..])
}

/// The one place a public key is derived from a secret key.
pub fn public_key_of(secret: &SecretKey) -> String {
    x_only_hex(&secret.public_key())
}

/// x-only public key hex for a secret key hex.
pub fn public_key_hex(secret_hex: &str) -> Result<String> {
    let secret = parse_secret_key(secret_hex)?;
    Ok(public_key_of(&secret))
}

/// ECDH shared x-coordinate. Zeroized on drop.
pub fn shared_x(secret: &SecretKey, public: &PublicKey) -> Zeroizing<[u8; 32]> {
    let shared = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(shared.raw_secret_bytes());
    out
}

// ---------------------------------------------------------------------------
// Ephemeral key pairs
// ---------------------------------------------------------------------------

/// Single-use key pair that signs exactly one gift wrap.
///
/// The secret scalar is zeroized when the pair is scrubbed or dropped.
/// Not `Clone`: a copy would outlive the scrub of the original.
pub struct EphemeralKeyPair {
    secret: Option<SecretKey>,
    public_key: String,
}

impl EphemeralKeyPair {
    /// Fresh pair from 32 CSPRNG bytes. Fails closed if the OS RNG is unavailable.
    pub fn generate() -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            OsRng
                .try_fill_bytes(&mut bytes[..])
                .map_err(|_| Error::Randomness)?;
            if let Ok(secret) = SecretKey::from_slice(&bytes[..]) {
                let public_key = public_key_of(&secret);
                return Ok(Self {
                    secret: Some(secret),
                    public_key,
                });
            }
        }
        Err(Error::EphemeralKeyGenerationFailed("no valid scalar drawn"))
    }

    /// `count` independent pairs, one per recipient.
    pub fn generate_multiple(count: usize) -> Result<Vec<Self>> {
        (0..count).map(|_| Self::generate()).collect()
    }

    /// Pair from a caller-held secret; the public half is derived.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let secret = parse_secret_key(secret_hex)?;
        let public_key = public_key_of(&secret);
        Ok(Self {
            secret: Some(secret),
            public_key,
        })
    }

    /// Pair from both halves as supplied; nothing is checked until [`validate`](Self::validate).
    pub fn from_parts(secret_hex: &str, public_hex: &str) -> Result<Self> {
        let secret = parse_secret_key(secret_hex)?;
        Ok(Self {
            secret: Some(secret),
            public_key: public_hex.to_ascii_lowercase(),
        })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub(crate) fn secret_key(&self) -> Option<&SecretKey> {
        self.secret.as_ref()
    }

    /// Secret key hex, zeroized when the returned buffer drops.
    pub fn secret_hex(&self) -> Option<Zeroizing<String>> {
        self.secret.as_ref().map(|s| {
            let mut bytes = Zeroizing::new([0u8; 32]);
            bytes.copy_from_slice(&s.to_bytes());
            Zeroizing::new(hex::encode(&bytes[..]))
        })
    }

    /// Recompute the public key from the secret and compare.
    pub fn validate(&self) -> bool {
        match &self.secret {
            Some(secret) => {
                let valid = public_key_of(secret) == self.public_key;
                if !valid {
                    warn!("ephemeral key pair failed validation");
                }
                valid
            }
            None => false,
        }
    }

    /// Destroy the secret. The pair is unusable afterwards.
    pub fn scrub(&mut self) {
        // SecretKey zeroizes its scalar on drop.
        drop(self.secret.take());
        self.public_key.zeroize();
    }

    pub fn is_scrubbed(&self) -> bool {
        self.secret.is_none()
    }
}

impl core::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl Drop for EphemeralKeyPair {
    fn drop(&mut self) {
        self.scrub();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SK_1: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const G_X: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn derives_generator_for_scalar_one() {
        assert_eq!(public_key_hex(SK_1).unwrap(), G_X);
    }

    #[test]
    fn secret_key_format_checks() {
        assert!(matches!(parse_secret_key("01"), Err(Error::InvalidKey(_))));
        assert!(matches!(
            parse_secret_key(&"zz".repeat(32)),
            Err(Error::InvalidKey(_))
        ));
        // zero is not a valid scalar
        assert!(matches!(
            parse_secret_key(&"00".repeat(32)),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn public_key_forms() {
        assert!(parse_public_key(G_X).is_ok());
        assert!(parse_public_key(&format!("02{G_X}")).is_ok());
        assert!(parse_public_key(&format!("03{G_X}")).is_ok());
        assert!(parse_public_key(&format!("05{G_X}")).is_err());
        assert!(parse_public_key(&G_X[..62]).is_err());
        assert!(is_valid_pubkey_hex(G_X));
        assert!(!is_valid_pubkey_hex(&format!("02{G_X}")));
    }

    #[test]
    fn generate_multiple_yields_distinct_valid_pairs() {
        let pairs = EphemeralKeyPair::generate_multiple(16).unwrap();
        assert_eq!(pairs.len(), 16);
        let unique: HashSet<_> = pairs.iter().map(|p| p.public_key().to_owned()).collect();
        assert_eq!(unique.len(), 16);
        assert!(pairs.iter().all(EphemeralKeyPair::validate));
    }

    #[test]
    fn mismatched_parts_fail_validation() {
        let other = EphemeralKeyPair::generate().unwrap();
        let pair = EphemeralKeyPair::from_parts(SK_1, other.public_key()).unwrap();
        assert!(!pair.validate());
        let good = EphemeralKeyPair::from_parts(SK_1, G_X).unwrap();
        assert!(good.validate());
    }

    #[test]
    fn scrub_destroys_secret() {
        let mut pair = EphemeralKeyPair::generate().unwrap();
        assert!(pair.secret_hex().is_some());
        pair.scrub();
        assert!(pair.is_scrubbed());
        assert!(pair.secret_hex().is_none());
        assert!(pair.public_key().is_empty());
        assert!(!pair.validate());
    }

    #[test]
    fn ephemeral_pair_cannot_be_cloned() {
        use core::marker::PhantomData;

        struct Check<T>(PhantomData<T>);
        trait Cloneable {
            fn cloneable(&self) -> bool {
                true
            }
        }
        impl<T: Clone> Cloneable for Check<T> {}
        trait Fallback {
            fn cloneable(&self) -> bool {
                false
            }
        }
        impl<T> Fallback for &Check<T> {}

        assert!((&Check::<String>(PhantomData)).cloneable());
        assert!(!(&Check::<EphemeralKeyPair>(PhantomData)).cloneable());
    }

    #[test]
    fn secret_hex_round_trips() {
        let pair = EphemeralKeyPair::generate().unwrap();
        let secret = pair.secret_hex().unwrap();
        let again = EphemeralKeyPair::from_secret_hex(&secret).unwrap();
        assert_eq!(again.public_key(), pair.public_key());
    }
}
