use std::collections::HashSet;

use nostr_giftwrap::event::{sign_with_secret_hex, verify_event};
use nostr_giftwrap::gift_wrap::{create_gift_wrap, decrypt_gift_wrap, tagged_recipients};
use nostr_giftwrap::seal::{create_seal, decrypt_seal};
use nostr_giftwrap::{
    encrypt, keys, ConversationKey, DecryptionError, Error, GiftWrapper, MessageOptions, Recipient, Rumor, WrapConfig,
    KIND_GIFT_WRAP, KIND_PRIVATE_DIRECT_MESSAGE, KIND_SEAL,
};

const ALICE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const BOB: &str = "0000000000000000000000000000000000000000000000000000000000000002";
const CHARLIE: &str = "0000000000000000000000000000000000000000000000000000000000000003";
const DAVE: &str = "0000000000000000000000000000000000000000000000000000000000000004";
const MALLORY: &str = "0000000000000000000000000000000000000000000000000000000000000005";

fn pk(secret: &str) -> String {
    keys::public_key_hex(secret).unwrap()
}

fn to(secrets: &[&str]) -> MessageOptions {
    MessageOptions::to(secrets.iter().map(|s| Recipient::new(pk(s))))
}

#[test]
fn roundtrip_basic() {
    let wrapper = GiftWrapper::new();
    let message = wrapper.create_message("hi", ALICE, &to(&[BOB]), None).unwrap();
    assert_eq!(message.gift_wraps.len(), 1);

    let wrap = &message.gift_wraps[0].gift_wrap;
    assert_eq!(wrap.kind, KIND_GIFT_WRAP);
    assert_eq!(tagged_recipients(wrap), vec![pk(BOB).as_str()]);
    assert_ne!(wrap.pubkey, pk(ALICE));
    assert!(verify_event(wrap));

    let received = wrapper.decrypt_message(wrap, BOB);
    assert!(received.is_valid());
    assert_eq!(received.content(), Some("hi"));
    assert_eq!(received.sender_pubkey, Some(pk(ALICE)));

    let rumor = received.rumor.unwrap();
    assert_eq!(rumor.kind, KIND_PRIVATE_DIRECT_MESSAGE);
    assert_eq!(rumor, message.rumor);
    assert_eq!(received.seal.unwrap().kind, KIND_SEAL);
}

#[test]
fn roundtrip_subject_tag() {
    let wrapper = GiftWrapper::new();
    let message = wrapper
        .create_message("agenda", ALICE, &to(&[BOB]), Some("meeting"))
        .unwrap();
    let received = wrapper.decrypt_message(&message.gift_wraps[0].gift_wrap, BOB);
    assert_eq!(received.rumor.unwrap().tag_value("subject"), Some("meeting"));
}

#[test]
fn roundtrip_empty_and_large_plaintext() {
    let wrapper = GiftWrapper::new();
    for plaintext in ["".to_owned(), "z".repeat(20_000)] {
        let message = wrapper.create_message(&plaintext, ALICE, &to(&[BOB]), None).unwrap();
        let received = wrapper.decrypt_message(&message.gift_wraps[0].gift_wrap, BOB);
        assert_eq!(received.content(), Some(plaintext.as_str()));
    }
}

#[test]
fn wrong_recipient_learns_nothing() {
    let wrapper = GiftWrapper::new();
    let message = wrapper.create_message("hi", ALICE, &to(&[BOB]), None).unwrap();
    let received = wrapper.decrypt_message(&message.gift_wraps[0].gift_wrap, CHARLIE);
    assert!(!received.is_valid());
    assert!(received.seal.is_none());
    assert!(received.sender_pubkey.is_none());
}

#[test]
fn malformed_recipient_secret_never_panics() {
    let wrapper = GiftWrapper::new();
    let message = wrapper.create_message("hi", ALICE, &to(&[BOB]), None).unwrap();
    let wrap = &message.gift_wraps[0].gift_wrap;
    for secret in ["", "zz", "00", &"f".repeat(64)] {
        assert!(!wrapper.decrypt_message(wrap, secret).is_valid());
    }
}

#[test]
fn fan_out_is_unlinkable() {
    let wrapper = GiftWrapper::new();
    let message = wrapper
        .create_message("group", ALICE, &to(&[BOB, CHARLIE, DAVE]), None)
        .unwrap();
    assert_eq!(message.gift_wraps.len(), 3);

    let ephemeral: HashSet<_> = message.gift_wraps.iter().map(|w| &w.gift_wrap.pubkey).collect();
    assert_eq!(ephemeral.len(), 3);
    let contents: HashSet<_> = message.gift_wraps.iter().map(|w| &w.gift_wrap.content).collect();
    assert_eq!(contents.len(), 3);

    for (wrapped, secret) in message.gift_wraps.iter().zip([BOB, CHARLIE, DAVE]) {
        assert_eq!(wrapped.recipient.pubkey, pk(secret));
        let received = wrapper.decrypt_message(&wrapped.gift_wrap, secret);
        assert_eq!(received.content(), Some("group"));
        assert!(wrapper.validate_gift_wrap_timestamp(&wrapped.gift_wrap));
    }

    // Each wrap opens only for its own recipient.
    let bobs = &message.gift_wraps[0].gift_wrap;
    assert!(!wrapper.decrypt_message(bobs, CHARLIE).is_valid());
}

#[test]
fn sender_copy_readable_by_sender() {
    let config = WrapConfig {
        include_sender_copy: true,
        ..WrapConfig::default()
    };
    let wrapper = GiftWrapper::with_config(config).unwrap();
    let message = wrapper.create_message("note to self", ALICE, &to(&[BOB]), None).unwrap();
    assert_eq!(message.gift_wraps.len(), 2);

    let copy = &message.gift_wraps[1];
    assert_eq!(copy.recipient.pubkey, pk(ALICE));
    let received = wrapper.decrypt_message(&copy.gift_wrap, ALICE);
    assert_eq!(received.content(), Some("note to self"));
}

#[test]
fn create_rejects_bad_input() {
    let wrapper = GiftWrapper::new();
    assert_eq!(
        wrapper.create_message("hi", ALICE, &MessageOptions::default(), None),
        Err(Error::NoRecipients)
    );
    assert!(matches!(
        wrapper.create_message("hi", ALICE, &MessageOptions::to([Recipient::new("00")]), None),
        Err(Error::InvalidRecipient(_))
    ));
    assert!(matches!(
        wrapper.create_message("hi", "nope", &to(&[BOB]), None),
        Err(Error::InvalidKey(_))
    ));
    let oversized = "a".repeat(65_536);
    assert!(wrapper.create_message(&oversized, ALICE, &to(&[BOB]), None).is_err());
}

#[test]
fn layered_api_roundtrip() {
    let rumor = Rumor::new(pk(ALICE), 1_700_000_000, KIND_PRIVATE_DIRECT_MESSAGE, vec![], "layers".into()).unwrap();
    let seal = create_seal(&rumor, ALICE, &pk(BOB)).unwrap();
    let wrap = create_gift_wrap(&seal, &Recipient::new(pk(BOB)), None, None).unwrap();

    let opened_seal = decrypt_gift_wrap(&wrap, BOB).unwrap();
    assert_eq!(opened_seal, seal);
    assert_eq!(decrypt_seal(&opened_seal, BOB).unwrap(), rumor);
    assert_eq!(decrypt_gift_wrap(&wrap, CHARLIE), Err(DecryptionError));
}

#[test]
fn unwrap_generic_returns_inner_object() {
    let wrapper = GiftWrapper::new();
    let rumor = Rumor::new(
        pk(ALICE),
        1_700_000_000,
        7,
        vec![vec!["e".into(), "ab".repeat(32)]],
        "+".into(),
    )
    .unwrap();
    let wraps = wrapper.wrap_rumor(&rumor, ALICE, &to(&[BOB])).unwrap();
    let inner = wrapper.unwrap_generic(&wraps[0].gift_wrap, BOB).unwrap();
    assert_eq!(inner["kind"], 7);
    assert_eq!(inner["content"], "+");
    assert_eq!(inner["pubkey"], pk(ALICE));

    assert!(wrapper.unwrap_generic(&wraps[0].gift_wrap, CHARLIE).is_none());
    let mut not_wrap = wraps[0].gift_wrap.clone();
    not_wrap.kind = 1;
    assert!(wrapper.unwrap_generic(&not_wrap, BOB).is_none());
}

#[test]
fn impersonating_rumor_is_refused() {
    let wrapper = GiftWrapper::new();
    let forged = Rumor::new(pk(CHARLIE), 1_700_000_000, KIND_PRIVATE_DIRECT_MESSAGE, vec![], "x".into()).unwrap();
    assert!(matches!(
        wrapper.wrap_rumor(&forged, ALICE, &to(&[BOB])),
        Err(Error::SealCreationFailed(_))
    ));
}

#[test]
fn tampered_wrap_fails_closed() {
    let wrapper = GiftWrapper::new();
    let message = wrapper.create_message("hi", ALICE, &to(&[BOB]), None).unwrap();

    let mut retagged = message.gift_wraps[0].gift_wrap.clone();
    retagged.tags[0][1] = pk(CHARLIE);
    assert!(!wrapper.decrypt_message(&retagged, BOB).is_valid());

    let mut resigned = message.gift_wraps[0].gift_wrap.clone();
    resigned.sig = "00".repeat(64);
    assert!(!wrapper.decrypt_message(&resigned, BOB).is_valid());
}

#[test]
fn forged_author_is_not_unwrapped() {
    // Mallory seals a rumor claiming Alice as its author.
    let claimed = Rumor::new(pk(ALICE), 1_700_000_000, KIND_PRIVATE_DIRECT_MESSAGE, vec![], "it's me".into())
        .unwrap();
    let json = serde_json::to_string(&claimed).unwrap();
    let key = ConversationKey::derive(MALLORY, &pk(BOB)).unwrap();
    let payload = encrypt(&json, &key).unwrap().payload;
    let seal = sign_with_secret_hex(1_700_000_000, KIND_SEAL, vec![], payload, MALLORY).unwrap();
    let wrap = create_gift_wrap(&seal, &Recipient::new(pk(BOB)), None, None).unwrap();

    let wrapper = GiftWrapper::new();
    let received = wrapper.decrypt_message(&wrap, BOB);
    assert!(!received.is_valid());
    assert_eq!(received.sender_pubkey, Some(pk(MALLORY)));
    assert!(wrapper.unwrap_generic(&wrap, BOB).is_none());
}
