#![no_main]

use libfuzzer_sys::fuzz_target;
use nostr_giftwrap::{Event, GiftWrapper, WrapConfig};
use once_cell::sync::Lazy;

const RECIPIENT: &str = "0000000000000000000000000000000000000000000000000000000000000002";

// Signature checks off so the fuzzer reaches the decrypt and parse paths.
static WRAPPER: Lazy<GiftWrapper> = Lazy::new(|| {
    let config = WrapConfig {
        verify_signatures: false,
        ..WrapConfig::default()
    };
    GiftWrapper::with_config(config).expect("valid config")
});

fuzz_target!(|data: &[u8]| {
    let Ok(event) = serde_json::from_slice::<Event>(data) else {
        return;
    };
    let _ = WRAPPER.decrypt_message(&event, RECIPIENT);
    let _ = WRAPPER.unwrap_generic(&event, RECIPIENT);
});
