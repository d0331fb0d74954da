//! Gift-wrapped private messages (NIP-17 style, kind 14 rumors).
//!
//! Sending:   plaintext -> rumor -> (per recipient) seal -> gift wrap
//! Receiving: gift wrap -> seal -> rumor, with the seal's pubkey as sender
//!
//! Every recipient gets an independent seal, ephemeral key and timestamp,
//! so wraps to different recipients cannot be linked to each other.

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::WrapConfig;
use crate::error::{Error, Result};
use crate::event::{Event, Rumor, Tag, KIND_GIFT_WRAP, KIND_PRIVATE_DIRECT_MESSAGE};
use crate::gift_wrap::{self, Recipient};
use crate::keys;
use crate::seal;
use crate::timestamp;

/// Addressing for an outgoing message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOptions {
    pub recipients: Vec<Recipient>,
    /// Used for recipients that carry no hint of their own.
    pub relay_hint: Option<String>,
}

impl MessageOptions {
    pub fn to(recipients: impl IntoIterator<Item = Recipient>) -> Self {
        Self {
            recipients: recipients.into_iter().collect(),
            relay_hint: None,
        }
    }

    pub fn with_relay_hint(mut self, relay_hint: impl Into<String>) -> Self {
        self.relay_hint = Some(relay_hint.into());
        self
    }
}

/// One gift wrap, ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedRecipient {
    pub recipient: Recipient,
    pub gift_wrap: Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftWrappedMessage {
    pub rumor: Rumor,
    pub gift_wraps: Vec<WrappedRecipient>,
}

/// Outcome of [`GiftWrapper::decrypt_message`].
///
/// `sender_pubkey` is read from the seal. It is only authenticated when
/// [`is_valid`](Self::is_valid) returns true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptedMessage {
    pub rumor: Option<Rumor>,
    pub seal: Option<Event>,
    pub sender_pubkey: Option<String>,
}

impl DecryptedMessage {
    pub fn is_valid(&self) -> bool {
        self.rumor.is_some()
    }

    pub fn content(&self) -> Option<&str> {
        self.rumor.as_ref().map(|r| r.content.as_str())
    }
}

/// Entry point for wrapping and unwrapping private messages.
#[derive(Debug, Clone, Default)]
pub struct GiftWrapper {
    config: WrapConfig,
}

impl GiftWrapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WrapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WrapConfig {
        &self.config
    }

    /// Build a kind 14 rumor and gift wrap it once per recipient.
    pub fn create_message(
        &self,
        plaintext: &str,
        sender_secret_hex: &str,
        options: &MessageOptions,
        subject: Option<&str>,
    ) -> Result<GiftWrappedMessage> {
        let sender_pubkey = keys::public_key_hex(sender_secret_hex)?;
        validate_recipients(&options.recipients)?;

        let mut tags: Vec<Tag> = Vec::new();
        if let Some(subject) = subject {
            tags.push(vec!["subject".to_owned(), subject.to_owned()]);
        }
        let rumor = Rumor::new(
            sender_pubkey,
            timestamp::now()?,
            KIND_PRIVATE_DIRECT_MESSAGE,
            tags,
            plaintext.to_owned(),
        )?;

        let gift_wraps = self.wrap_rumor(&rumor, sender_secret_hex, options)?;
        Ok(GiftWrappedMessage { rumor, gift_wraps })
    }

    /// Seal and gift wrap an arbitrary rumor for every recipient.
    pub fn wrap_rumor(
        &self,
        rumor: &Rumor,
        sender_secret_hex: &str,
        options: &MessageOptions,
    ) -> Result<Vec<WrappedRecipient>> {
        let sender = keys::parse_secret_key(sender_secret_hex)?;
        let sender_pubkey = keys::public_key_of(&sender);
        validate_recipients(&options.recipients)?;
        seal::validate_rumor(rumor)?;

        let recipients = self.resolve_recipients(&sender_pubkey, options);
        let mut out = Vec::with_capacity(recipients.len());
        // Independent per recipient; nothing is shared between iterations.
        for recipient in recipients {
            let recipient_key = keys::parse_public_key(&recipient.pubkey)?;
            let seal = seal::seal_rumor(rumor, &sender, &recipient_key)?;
            let gift_wrap =
                gift_wrap::create_gift_wrap_with(&seal, &recipient, None, None, &self.config)?;
            out.push(WrappedRecipient {
                recipient,
                gift_wrap,
            });
        }
        debug!(kind = rumor.kind, wraps = out.len(), "message wrapped");
        Ok(out)
    }

    fn resolve_recipients(&self, sender_pubkey: &str, options: &MessageOptions) -> Vec<Recipient> {
        let mut recipients: Vec<Recipient> = options
            .recipients
            .iter()
            .map(|r| Recipient {
                pubkey: r.pubkey.to_ascii_lowercase(),
                relay_hint: r.relay_hint.clone().or_else(|| options.relay_hint.clone()),
            })
            .collect();
        if self.config.include_sender_copy
            && !recipients.iter().any(|r| r.pubkey == sender_pubkey)
        {
            recipients.push(Recipient {
                pubkey: sender_pubkey.to_owned(),
                relay_hint: options.relay_hint.clone(),
            });
        }
        recipients
    }

    /// Gift wrap -> seal -> rumor. Never panics.
    pub fn decrypt_message(&self, gift_wrap: &Event, recipient_secret_hex: &str) -> DecryptedMessage {
        let Ok(recipient) = keys::parse_secret_key(recipient_secret_hex) else {
            return DecryptedMessage::default();
        };
        if !addressed_to(gift_wrap, &keys::public_key_of(&recipient)) {
            trace!("gift wrap rejected");
            return DecryptedMessage::default();
        }
        let Ok(seal) = gift_wrap::open_gift_wrap(gift_wrap, &recipient, &self.config) else {
            return DecryptedMessage::default();
        };
        let sender_pubkey = Some(seal.pubkey.clone());
        let rumor = seal::open_rumor(&seal, &recipient, &self.config).ok();
        DecryptedMessage {
            rumor,
            seal: Some(seal),
            sender_pubkey,
        }
    }

    /// Unwrap any gift-wrapped payload to its inner JSON object.
    ///
    /// Only a numeric `kind` is required of the inner object; interpreting
    /// it is left to the caller. A `pubkey` in the inner object must name
    /// the seal's signer.
    pub fn unwrap_generic(&self, event: &Event, recipient_secret_hex: &str) -> Option<Value> {
        if event.kind != KIND_GIFT_WRAP {
            return None;
        }
        let recipient = keys::parse_secret_key(recipient_secret_hex).ok()?;
        if !addressed_to(event, &keys::public_key_of(&recipient)) {
            trace!("gift wrap rejected");
            return None;
        }
        let seal = gift_wrap::open_gift_wrap(event, &recipient, &self.config).ok()?;
        let json = seal::open_seal(&seal, &recipient, &self.config).ok()?;

        let inner: Value = serde_json::from_str(&json).ok()?;
        if !inner.get("kind").map_or(false, Value::is_number)
            || !speaks_for_itself(&inner, &seal.pubkey)
        {
            trace!("seal rejected");
            return None;
        }
        Some(inner)
    }

    pub fn validate_gift_wrap_timestamp(&self, gift_wrap: &Event) -> bool {
        gift_wrap::validate_gift_wrap_timestamp(gift_wrap, &self.config)
    }
}

/// An inner object may omit `pubkey`, but if present it must be the sealer's.
fn speaks_for_itself(inner: &Value, seal_pubkey: &str) -> bool {
    match inner.get("pubkey") {
        None => true,
        Some(Value::String(claimed)) => claimed.eq_ignore_ascii_case(seal_pubkey),
        Some(_) => false,
    }
}

/// Whether a `p` tag names `pubkey`.
fn addressed_to(gift_wrap: &Event, pubkey: &str) -> bool {
    gift_wrap::tagged_recipients(gift_wrap)
        .iter()
        .any(|tagged| tagged.eq_ignore_ascii_case(pubkey))
}

fn validate_recipients(recipients: &[Recipient]) -> Result<()> {
    if recipients.is_empty() {
        return Err(Error::NoRecipients);
    }
    for recipient in recipients {
        if !keys::is_valid_pubkey_hex(&recipient.pubkey) {
            return Err(Error::InvalidRecipient(recipient.pubkey.clone()));
        }
    }
    Ok(())
}
