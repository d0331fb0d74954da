//! Gift wrap (kind 1059): the seal, encrypted to the recipient and signed by
//! a single-use ephemeral key at a randomized time.
//!
//! gift_wrap.pubkey     = ephemeral_pk
//! gift_wrap.created_at = now - uniform(0, max_age)
//! gift_wrap.tags       = [["p", recipient_pk, relay_hint?]]
//! gift_wrap.content    = nip44(JSON(seal), conversation_key(ephemeral_sk, recipient_pk))

use k256::SecretKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::cipher;
use crate::config::WrapConfig;
use crate::error::{DecryptionError, Error, Result};
use crate::event::{self, Event, Tag, UnsignedEvent, KIND_GIFT_WRAP};
use crate::kdf::ConversationKey;
use crate::keys::{self, EphemeralKeyPair};
use crate::seal;
use crate::timestamp;

/// Who a gift wrap is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub pubkey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay_hint: Option<String>,
}

impl Recipient {
    pub fn new(pubkey: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            relay_hint: None,
        }
    }

    pub fn with_relay_hint(mut self, relay_hint: impl Into<String>) -> Self {
        self.relay_hint = Some(relay_hint.into());
        self
    }

    fn p_tag(&self) -> Tag {
        let mut tag = vec!["p".to_owned(), self.pubkey.to_ascii_lowercase()];
        if let Some(hint) = self.relay_hint.as_deref().filter(|h| !h.is_empty()) {
            tag.push(hint.to_owned());
        }
        tag
    }
}

/// Structural check: kind 1059, first tag is a `p` tag, valid author key.
pub fn is_gift_wrap(event: &Event) -> bool {
    event.kind == KIND_GIFT_WRAP
        && event
            .tags
            .first()
            .and_then(|t| t.first())
            .map_or(false, |name| name == "p")
        && keys::is_valid_pubkey_hex(&event.pubkey)
}

pub fn create_gift_wrap(
    seal: &Event,
    recipient: &Recipient,
    ephemeral: Option<&EphemeralKeyPair>,
    timestamp: Option<u64>,
) -> Result<Event> {
    create_gift_wrap_with(seal, recipient, ephemeral, timestamp, &WrapConfig::default())
}

pub fn create_gift_wrap_with(
    seal: &Event,
    recipient: &Recipient,
    ephemeral: Option<&EphemeralKeyPair>,
    timestamp: Option<u64>,
    config: &WrapConfig,
) -> Result<Event> {
    build_gift_wrap(seal, recipient, ephemeral, timestamp, config).map_err(Error::gift_wrap)
}

fn build_gift_wrap(
    seal: &Event,
    recipient: &Recipient,
    ephemeral: Option<&EphemeralKeyPair>,
    timestamp: Option<u64>,
    config: &WrapConfig,
) -> Result<Event> {
    if !seal::is_seal(seal) {
        return Err(Error::InvalidSeal("seal must be kind 13 with empty tags"));
    }
    if !keys::is_valid_pubkey_hex(&recipient.pubkey) {
        return Err(Error::InvalidRecipient(recipient.pubkey.clone()));
    }
    let recipient_key = keys::parse_public_key(&recipient.pubkey)?;

    // A generated pair is scrubbed when it goes out of scope.
    let generated;
    let ephemeral = match ephemeral {
        Some(pair) => pair,
        None => {
            generated = EphemeralKeyPair::generate()?;
            &generated
        }
    };
    if !ephemeral.validate() {
        return Err(Error::EphemeralKeyGenerationFailed("key pair failed validation"));
    }
    let ephemeral_secret = ephemeral
        .secret_key()
        .ok_or(Error::EphemeralKeyGenerationFailed("key pair was scrubbed"))?;

    let created_at = match timestamp {
        Some(ts) => ts,
        None => timestamp::randomized(config.max_timestamp_age_secs)?,
    };

    let json = Zeroizing::new(
        serde_json::to_string(seal).map_err(|_| Error::InvalidSeal("not serializable"))?,
    );
    let conversation_key =
        ConversationKey::from_shared_x(&keys::shared_x(ephemeral_secret, &recipient_key));
    let encrypted = cipher::encrypt(&json, &conversation_key)?;

    let unsigned = UnsignedEvent {
        pubkey: ephemeral.public_key().to_owned(),
        created_at,
        kind: KIND_GIFT_WRAP,
        tags: vec![recipient.p_tag()],
        content: encrypted.payload,
    };
    let gift_wrap = event::sign_event(unsigned, ephemeral_secret)?;
    debug!(
        recipient = %recipient.pubkey,
        created_at = gift_wrap.created_at,
        "gift wrap created"
    );
    Ok(gift_wrap)
}

/// Decrypt a gift wrap to its seal. Never panics; every failure is [`DecryptionError`].
pub fn decrypt_gift_wrap(
    gift_wrap: &Event,
    recipient_secret_hex: &str,
) -> core::result::Result<Event, DecryptionError> {
    decrypt_gift_wrap_with(gift_wrap, recipient_secret_hex, &WrapConfig::default())
}

pub fn decrypt_gift_wrap_with(
    gift_wrap: &Event,
    recipient_secret_hex: &str,
    config: &WrapConfig,
) -> core::result::Result<Event, DecryptionError> {
    let recipient = keys::parse_secret_key(recipient_secret_hex)?;
    open_gift_wrap(gift_wrap, &recipient, config)
}

pub(crate) fn open_gift_wrap(
    gift_wrap: &Event,
    recipient: &SecretKey,
    config: &WrapConfig,
) -> core::result::Result<Event, DecryptionError> {
    let opened = try_open_gift_wrap(gift_wrap, recipient, config);
    if opened.is_err() {
        trace!("gift wrap rejected");
    }
    opened
}

fn try_open_gift_wrap(
    gift_wrap: &Event,
    recipient: &SecretKey,
    config: &WrapConfig,
) -> core::result::Result<Event, DecryptionError> {
    if !is_gift_wrap(gift_wrap) {
        return Err(DecryptionError);
    }
    if config.verify_signatures && !event::verify_event(gift_wrap) {
        return Err(DecryptionError);
    }
    let ephemeral = keys::parse_public_key(&gift_wrap.pubkey)?;
    let conversation_key = ConversationKey::from_shared_x(&keys::shared_x(recipient, &ephemeral));
    let json = Zeroizing::new(cipher::decrypt(&gift_wrap.content, &conversation_key)?);

    let seal: Event = serde_json::from_str(&json).map_err(|_| DecryptionError)?;
    if !seal::is_seal(&seal) || !keys::is_valid_pubkey_hex(&seal.pubkey) {
        return Err(DecryptionError);
    }
    Ok(seal)
}

/// Whether a gift wrap's `created_at` falls in the configured window.
pub fn validate_gift_wrap_timestamp(gift_wrap: &Event, config: &WrapConfig) -> bool {
    match timestamp::now() {
        Ok(now) => timestamp::validate_at(
            gift_wrap.created_at,
            now,
            config.max_timestamp_age_secs,
            config.future_skew_secs,
        ),
        Err(_) => false,
    }
}

/// Recipients named by the gift wrap's `p` tags.
pub fn tagged_recipients(gift_wrap: &Event) -> Vec<&str> {
    gift_wrap
        .tags
        .iter()
        .filter(|t| t.first().map(String::as_str) == Some("p"))
        .filter_map(|t| t.get(1).map(String::as_str))
        .collect()
}
