//! Nostr event model (NIP-01) and BIP-340 signing.
//!
//! id  = sha256(JSON([0, pubkey, created_at, kind, tags, content]))
//! sig = schnorr(secret, id)

use k256::schnorr::signature::hazmat::PrehashVerifier;
use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use k256::SecretKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::keys;

pub const KIND_SEAL: u16 = 13;
pub const KIND_PRIVATE_DIRECT_MESSAGE: u16 = 14;
pub const KIND_GIFT_WRAP: u16 = 1059;

pub type Tag = Vec<String>;

/// An event before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
}

/// A signed event as it travels over relays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
    pub sig: String,
}

/// Unsigned inner message. Never published on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rumor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
}

impl Rumor {
    /// Build a rumor and stamp its NIP-01 id.
    pub fn new(
        pubkey: String,
        created_at: u64,
        kind: u16,
        tags: Vec<Tag>,
        content: String,
    ) -> Result<Self> {
        let mut rumor = Self {
            id: None,
            pubkey,
            created_at,
            kind,
            tags,
            content,
        };
        rumor.id = Some(hex::encode(rumor.compute_id()?));
        Ok(rumor)
    }

    pub fn compute_id(&self) -> Result<[u8; 32]> {
        compute_id(&self.pubkey, self.created_at, self.kind, &self.tags, &self.content)
    }

    /// First value of the first tag named `name`.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        tag_value(&self.tags, name)
    }
}

impl Event {
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        tag_value(&self.tags, name)
    }
}

fn tag_value<'a>(tags: &'a [Tag], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.first().map(String::as_str) == Some(name))
        .and_then(|t| t.get(1))
        .map(String::as_str)
}

pub fn compute_id(
    pubkey: &str,
    created_at: u64,
    kind: u16,
    tags: &[Tag],
    content: &str,
) -> Result<[u8; 32]> {
    // A tuple serializes as a JSON array with no whitespace.
    let canonical = serde_json::to_vec(&(0u8, pubkey, created_at, kind, tags, content))
        .map_err(|_| Error::InvalidPayload("event is not serializable"))?;
    Ok(Sha256::digest(&canonical).into())
}

/// Sign `unsigned` with `secret`. The event pubkey must belong to `secret`.
pub fn sign_event(unsigned: UnsignedEvent, secret: &SecretKey) -> Result<Event> {
    let mut secret_bytes = Zeroizing::new([0u8; 32]);
    secret_bytes.copy_from_slice(&secret.to_bytes());
    let signing_key =
        SigningKey::from_bytes(&secret_bytes[..]).map_err(|_| Error::Signing("secret key"))?;

    let signer_pubkey = hex::encode(signing_key.verifying_key().to_bytes());
    if signer_pubkey != unsigned.pubkey {
        return Err(Error::Signing("event pubkey does not match signing key"));
    }

    let id = compute_id(
        &unsigned.pubkey,
        unsigned.created_at,
        unsigned.kind,
        &unsigned.tags,
        &unsigned.content,
    )?;

    let mut aux_rand = [0u8; 32];
    getrandom::getrandom(&mut aux_rand).map_err(|_| Error::Randomness)?;
    let sig = signing_key
        .sign_prehash_with_aux_rand(&id, &aux_rand)
        .map_err(|_| Error::Signing("schnorr"))?;

    Ok(Event {
        id: hex::encode(id),
        pubkey: unsigned.pubkey,
        created_at: unsigned.created_at,
        kind: unsigned.kind,
        tags: unsigned.tags,
        content: unsigned.content,
        sig: hex::encode(sig.to_bytes()),
    })
}

/// Recompute the id and check the Schnorr signature.
pub fn verify_event(event: &Event) -> bool {
    let Ok(id) = compute_id(
        &event.pubkey,
        event.created_at,
        event.kind,
        &event.tags,
        &event.content,
    ) else {
        return false;
    };
    if hex::encode(id) != event.id.to_ascii_lowercase() {
        return false;
    }
    let Ok(pubkey) = hex::decode(&event.pubkey) else {
        return false;
    };
    let Ok(sig) = hex::decode(&event.sig) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pubkey) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(sig.as_slice()) else {
        return false;
    };
    verifying_key.verify_prehash(&id, &signature).is_ok()
}

/// Sign with a secret key given as hex; the pubkey is derived from it.
pub fn sign_with_secret_hex(
    created_at: u64,
    kind: u16,
    tags: Vec<Tag>,
    content: String,
    secret_hex: &str,
) -> Result<Event> {
    let secret = keys::parse_secret_key(secret_hex)?;
    let unsigned = UnsignedEvent {
        pubkey: keys::public_key_of(&secret),
        created_at,
        kind,
        tags,
        content,
    };
    sign_event(unsigned, &secret)
}
