//! Enciphered module tests.

use proptest::prelude::*;
use quire_core::{Backend, Key, RawContent, RawTextCollector, Verse, DATA_FILE};
use quire_storage::{decipher, encipher, CipherKey};
use quire_testkit::prelude::*;
use std::fs;

fn unit_texts(content: &[RawContent]) -> Vec<String> {
    content
        .iter()
        .filter_map(|c| match c {
            RawContent::Unit { text, .. } => Some(text.clone()),
            RawContent::Heading { .. } => None,
        })
        .collect()
}

#[test]
fn enciphered_module_reads_back_plain_text() {
    let module = TestModule::builder().cipher_key("1a2b3c4d").genesis().build();
    let stored = fs::read(module.path().join(DATA_FILE)).unwrap();
    assert!(!stored.windows(11).any(|w| w == b"Genesis 1:1"));

    let backend = module.backend();
    let v11n = backend.metadata().versification().clone();
    let key = Key::parse(&v11n, "Gen 1").unwrap();
    let content = backend.raw_text(&key, &mut RawTextCollector::new(v11n)).unwrap();

    assert_eq!(
        unit_texts(&content),
        vec!["Genesis 1:1 text", "Genesis 1:2 text", "Genesis 1:3 text"]
    );
}

#[test]
fn wrong_key_yields_different_text() {
    let module = TestModule::builder().cipher_key("right").genesis().build();
    let mut metadata = module.metadata().clone();
    metadata = metadata.with_cipher_key(CipherKey::from("wrong"));
    let backend = quire_core::RawVerseBackend::new(metadata);
    let v11n = backend.metadata().versification().clone();

    let content = backend
        .raw_text(&Key::from(Verse::new(0, 1, 1)), &mut RawTextCollector::new(v11n))
        .unwrap();
    assert_ne!(unit_texts(&content), vec!["Genesis 1:1 text"]);
}

#[test]
fn empty_key_module_is_still_enciphered() {
    let module = TestModule::builder()
        .cipher_key("")
        .verse(Verse::new(0, 1, 1), "stored as is")
        .build();
    let stored = fs::read(module.path().join(DATA_FILE)).unwrap();
    assert_ne!(stored, b"stored as is");

    let backend = module.backend();
    assert!(backend.metadata().is_locked());

    let v11n = backend.metadata().versification().clone();
    let content = backend
        .raw_text(&Key::from(Verse::new(0, 1, 1)), &mut RawTextCollector::new(v11n))
        .unwrap();
    assert_eq!(unit_texts(&content), vec!["stored as is"]);
}

proptest! {
    #[test]
    fn encipher_then_decipher_is_identity(
        key in cipher_key_strategy(),
        payload in payload_strategy(),
    ) {
        let key = CipherKey::from(key.as_str());
        let mut data = payload.clone();
        encipher(&key, &mut data);
        decipher(&key, &mut data);
        prop_assert_eq!(data, payload);
    }

    #[test]
    fn module_roundtrip(key in cipher_key_strategy(), text in verse_text_strategy()) {
        let module = TestModule::builder()
            .cipher_key(&key)
            .verse(Verse::new(1, 2, 3), &text)
            .build();
        let backend = module.backend();
        let v11n = backend.metadata().versification().clone();

        let content = backend
            .raw_text(&Key::from(Verse::new(1, 2, 3)), &mut RawTextCollector::new(v11n))
            .unwrap();
        prop_assert_eq!(unit_texts(&content), vec![text]);
    }
}
