//! Seal (kind 13): the rumor, encrypted to the recipient and signed by the
//! real sender.
//!
//! seal.content = nip44(JSON(rumor), conversation_key(sender_sk, recipient_pk))
//! seal.tags    = []   (always; anything else is rejected)

use k256::{PublicKey, SecretKey};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::cipher;
use crate::config::WrapConfig;
use crate::error::{DecryptionError, Error, Result};
use crate::event::{self, Event, Rumor, UnsignedEvent, KIND_SEAL};
use crate::kdf::ConversationKey;
use crate::keys;
use crate::timestamp;

/// Structural check: kind 13 with an empty tag list.
pub fn is_seal(event: &Event) -> bool {
    event.kind == KIND_SEAL && event.tags.is_empty()
}

/// Shape checks on a caller-built rumor.
pub fn validate_rumor(rumor: &Rumor) -> Result<()> {
    if rumor.pubkey.len() != 64 || hex::decode(&rumor.pubkey).is_err() {
        return Err(Error::InvalidRumor("pubkey must be 64 hex chars"));
    }
    if rumor.created_at == 0 {
        return Err(Error::InvalidRumor("created_at must be positive"));
    }
    Ok(())
}

pub fn create_seal(
    rumor: &Rumor,
    sender_secret_hex: &str,
    recipient_pubkey_hex: &str,
) -> Result<Event> {
    let sender = keys::parse_secret_key(sender_secret_hex).map_err(Error::seal)?;
    let recipient = keys::parse_public_key(recipient_pubkey_hex).map_err(Error::seal)?;
    seal_rumor(rumor, &sender, &recipient)
}

pub(crate) fn seal_rumor(rumor: &Rumor, sender: &SecretKey, recipient: &PublicKey) -> Result<Event> {
    build_seal(rumor, sender, recipient).map_err(Error::seal)
}

fn build_seal(rumor: &Rumor, sender: &SecretKey, recipient: &PublicKey) -> Result<Event> {
    validate_rumor(rumor)?;
    let sender_pubkey = keys::public_key_of(sender);
    if !rumor.pubkey.eq_ignore_ascii_case(&sender_pubkey) {
        return Err(Error::InvalidRumor("rumor pubkey does not match sender"));
    }

    let json = Zeroizing::new(
        serde_json::to_string(rumor).map_err(|_| Error::InvalidRumor("not serializable"))?,
    );
    let conversation_key = ConversationKey::from_shared_x(&keys::shared_x(sender, recipient));
    let encrypted = cipher::encrypt(&json, &conversation_key)?;

    let unsigned = UnsignedEvent {
        pubkey: sender_pubkey,
        created_at: timestamp::now()?,
        kind: KIND_SEAL,
        tags: vec![],
        content: encrypted.payload,
    };
    let seal = event::sign_event(unsigned, sender)?;
    debug!(recipient = %keys::x_only_hex(recipient), created_at = seal.created_at, "seal created");
    Ok(seal)
}

/// Decrypt a seal to its rumor. Never panics; every failure is [`DecryptionError`].
pub fn decrypt_seal(
    seal: &Event,
    recipient_secret_hex: &str,
) -> core::result::Result<Rumor, DecryptionError> {
    decrypt_seal_with(seal, recipient_secret_hex, &WrapConfig::default())
}

pub fn decrypt_seal_with(
    seal: &Event,
    recipient_secret_hex: &str,
    config: &WrapConfig,
) -> core::result::Result<Rumor, DecryptionError> {
    let recipient = keys::parse_secret_key(recipient_secret_hex)?;
    open_rumor(seal, &recipient, config)
}

/// Decrypt seal content to the raw inner JSON.
pub(crate) fn open_seal(
    seal: &Event,
    recipient: &SecretKey,
    config: &WrapConfig,
) -> core::result::Result<Zeroizing<String>, DecryptionError> {
    let opened = try_open_seal(seal, recipient, config);
    if opened.is_err() {
        trace!("seal rejected");
    }
    opened
}

fn try_open_seal(
    seal: &Event,
    recipient: &SecretKey,
    config: &WrapConfig,
) -> core::result::Result<Zeroizing<String>, DecryptionError> {
    if !is_seal(seal) || !keys::is_valid_pubkey_hex(&seal.pubkey) {
        return Err(DecryptionError);
    }
    if config.verify_signatures && !event::verify_event(seal) {
        return Err(DecryptionError);
    }
    // The seal's own pubkey names the claimed sender.
    let sender = keys::parse_public_key(&seal.pubkey)?;
    let conversation_key = ConversationKey::from_shared_x(&keys::shared_x(recipient, &sender));
    cipher::decrypt(&seal.content, &conversation_key).map(Zeroizing::new)
}

pub(crate) fn open_rumor(
    seal: &Event,
    recipient: &SecretKey,
    config: &WrapConfig,
) -> core::result::Result<Rumor, DecryptionError> {
    let json = open_seal(seal, recipient, config)?;
    let rumor: Rumor = serde_json::from_str(&json).map_err(|_| DecryptionError)?;
    // A sender can only speak for itself.
    if !rumor.pubkey.eq_ignore_ascii_case(&seal.pubkey) {
        trace!("seal rejected");
        return Err(DecryptionError);
    }
    Ok(rumor)
}
