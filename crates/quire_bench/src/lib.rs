//! Benchmark utilities.

#![warn(missing_docs)]

use quire_core::{BookInfo, BookMetadata, Verse, Versification};
use quire_testkit::ModuleWriter;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::Path;

/// Generate random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate random printable verse text of the specified length.
pub fn random_text(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Builds a single-book versification of `chapters` chapters of `verses` verses.
pub fn uniform_versification(chapters: u16, verses: u16) -> Versification {
    Versification::new(
        "bench",
        vec![BookInfo::new("Bench", "Bn", vec![verses; usize::from(chapters)])],
    )
    .expect("Invalid bench versification")
}

/// Writes a module at `dir` with random text of `text_len` bytes for every verse.
pub fn write_module(
    dir: &Path,
    v11n: Versification,
    text_len: usize,
    cipher_key: Option<&str>,
) -> BookMetadata {
    let mut metadata = BookMetadata::new("BENCH", dir, v11n);
    if let Some(key) = cipher_key {
        metadata = metadata.with_cipher_key(key.into());
    }

    let v11n = metadata.versification().clone();
    let mut writer = ModuleWriter::new(metadata.clone());
    for ordinal in 0..v11n.verse_count() {
        let verse: Verse = v11n.verse_at(ordinal).expect("Ordinal out of range");
        writer
            .insert(verse, random_text(text_len))
            .expect("Failed to insert verse");
    }
    writer.write().expect("Failed to write module");
    metadata
}
