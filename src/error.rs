//! Unified error types for the gift wrap stack.
//!
//! Two families, kept apart on purpose:
//!
//! - [`Error`] is raised for input the caller constructed (key formats,
//!   rumor/seal/recipient shape, empty recipient list). It fails loudly and
//!   before anything reaches the network.
//! - [`DecryptionError`] is the single, reason-free failure for anything
//!   derived from untrusted payloads. Bad version, short buffer, MAC
//!   mismatch and bad UTF-8 are indistinguishable to the caller.

use core::fmt;

use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionError;

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decryption failed")
    }
}

impl std::error::Error for DecryptionError {}

/// Errors raised on the encrypt/create side.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),

    #[error("invalid nonce: {0}")]
    InvalidNonce(&'static str),

    #[error("invalid payload: {0}")]
    InvalidPayload(&'static str),

    #[error("invalid plaintext length: {0} bytes")]
    InvalidPlaintextLength(usize),

    #[error("padding error: {0}")]
    PaddingError(&'static str),

    #[error("encryption failed: {0}")]
    EncryptionFailed(&'static str),

    #[error("invalid rumor: {0}")]
    InvalidRumor(&'static str),

    #[error("invalid seal: {0}")]
    InvalidSeal(&'static str),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("no recipients")]
    NoRecipients,

    #[error("ephemeral key generation failed: {0}")]
    EphemeralKeyGenerationFailed(&'static str),

    #[error("timestamp randomization failed: {0}")]
    TimestampRandomizationFailed(&'static str),

    #[error("seal creation failed: {0}")]
    SealCreationFailed(Box<Error>),

    #[error("gift wrap creation failed: {0}")]
    GiftWrapCreationFailed(Box<Error>),

    #[error("signing failed: {0}")]
    Signing(&'static str),

    #[error("secure randomness unavailable")]
    Randomness,

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl Error {
    pub(crate) fn seal(inner: Error) -> Self {
        match inner {
            // Already wrapped somewhere deeper; don't nest twice.
            e @ Error::SealCreationFailed(_) => e,
            e => Error::SealCreationFailed(Box::new(e)),
        }
    }

    pub(crate) fn gift_wrap(inner: Error) -> Self {
        match inner {
            e @ Error::GiftWrapCreationFailed(_) => e,
            e => Error::GiftWrapCreationFailed(Box::new(e)),
        }
    }
}

/// Normalize encode errors into decrypt errors (oracle discipline).
impl From<Error> for DecryptionError {
    fn from(_: Error) -> Self {
        DecryptionError
    }
}

pub type Result<T> = core::result::Result<T, Error>;
