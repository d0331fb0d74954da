#![no_main]

use libfuzzer_sys::fuzz_target;
use nostr_giftwrap::padding::unpad;
use nostr_giftwrap::{decrypt, ConversationKey};
use once_cell::sync::Lazy;

static KEY: Lazy<ConversationKey> =
    Lazy::new(|| ConversationKey::from_slice(&[0x42u8; 32]).expect("32-byte key"));

fuzz_target!(|data: &[u8]| {
    let _ = unpad(data);

    if let Ok(payload) = core::str::from_utf8(data) {
        let _ = decrypt(payload, &KEY);
    }
});
