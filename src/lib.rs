//! # nostr-giftwrap
//!
//! NIP-44 v2 payload encryption and NIP-59 seal / gift wrap envelopes for
//! metadata-private Nostr messaging.
//!
//! ## Quick Start
//!
//! ```rust
//! use nostr_giftwrap::{keys, GiftWrapper, MessageOptions, Recipient};
//!
//! let alice = "0000000000000000000000000000000000000000000000000000000000000001";
//! let bob = "0000000000000000000000000000000000000000000000000000000000000002";
//! let bob_pk = keys::public_key_hex(bob).unwrap();
//!
//! let wrapper = GiftWrapper::new();
//! let options = MessageOptions::to([Recipient::new(bob_pk)]);
//! let message = wrapper.create_message("hi", alice, &options, None).unwrap();
//!
//! let received = wrapper.decrypt_message(&message.gift_wraps[0].gift_wrap, bob);
//! assert!(received.is_valid());
//! assert_eq!(received.content(), Some("hi"));
//! assert_eq!(received.sender_pubkey, Some(keys::public_key_hex(alice).unwrap()));
//! ```
//!
//! ## Layers
//!
//! - **Payload** ([`cipher`]): ECDH conversation key, HKDF message keys,
//!   padded ChaCha20, HMAC-SHA256 over `nonce || ciphertext`
//! - **Seal** ([`seal`]): kind 13, signed by the real sender, no tags
//! - **Gift wrap** ([`gift_wrap`]): kind 1059, signed by a one-time key at a
//!   randomized time, `p`-tagged to the recipient
//!
//! ## Security Properties
//!
//! - **Uniform errors**: every decrypt-side failure is the same [`DecryptionError`]
//! - **MAC before decrypt**: constant-time tag check precedes any keystream use
//! - **Unlinkable wraps**: fresh ephemeral key and timestamp per recipient
//! - **Zeroized secrets**: conversation keys, message keys and ephemeral keys
//!
//! ## What's NOT Provided
//!
//! - Relay transport or subscriptions
//! - Key storage
//! - NIP-04 or any other legacy scheme

#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/nostr-giftwrap/0.1.0")]

// ---------------------------------------------------------------------------
// Payload encryption
// ---------------------------------------------------------------------------

pub mod cipher;
pub mod kdf;
pub mod padding;

// Wire constants are stable; the codec itself is an internal detail.
pub mod wire;

// ---------------------------------------------------------------------------
// Events and envelopes
// ---------------------------------------------------------------------------

pub mod event;
pub mod gift_wrap;
pub mod keys;
pub mod seal;
pub mod timestamp;

mod config;
mod error;
mod messaging;

pub use cipher::{decrypt, encrypt, encrypt_with_nonce, EncryptedPayload};
pub use config::WrapConfig;
pub use error::{DecryptionError, Error, Result};
pub use event::{
    Event, Rumor, Tag, UnsignedEvent, KIND_GIFT_WRAP, KIND_PRIVATE_DIRECT_MESSAGE, KIND_SEAL,
};
pub use gift_wrap::Recipient;
pub use kdf::{ConversationKey, MessageKeys};
pub use keys::EphemeralKeyPair;
pub use messaging::{
    DecryptedMessage, GiftWrappedMessage, GiftWrapper, MessageOptions, WrappedRecipient,
};
pub use wire::{MAX_PLAINTEXT_BYTES, MIN_PLAINTEXT_BYTES, PROTOCOL_VERSION};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
