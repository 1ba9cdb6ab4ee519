//! Property-based test generators using proptest.
//!
//! Strategies produce keys that are valid in the given versification.

use proptest::prelude::*;
use quire_core::{Passage, Verse, VerseRange, Versification};
use std::sync::Arc;

/// Strategy for generating a verse of `v11n`.
pub fn verse_strategy(v11n: Arc<Versification>) -> impl Strategy<Value = Verse> {
    let count = v11n.verse_count();
    (0..count).prop_map(move |ordinal| {
        v11n.verse_at(ordinal)
            .expect("ordinal is below the verse count")
    })
}

/// Strategy for generating a range of `v11n`.
pub fn range_strategy(v11n: Arc<Versification>) -> impl Strategy<Value = VerseRange> {
    let count = v11n.verse_count();
    (0..count, 0..count).prop_map(move |(a, b)| {
        let (start, end) = (a.min(b), a.max(b));
        let start = v11n.verse_at(start).expect("ordinal is below the verse count");
        let end = v11n.verse_at(end).expect("ordinal is below the verse count");
        VerseRange::new(&v11n, start, end).expect("start precedes end")
    })
}

/// Strategy for generating a passage of one to four ranges of `v11n`.
pub fn passage_strategy(v11n: Arc<Versification>) -> impl Strategy<Value = Passage> {
    prop::collection::vec(range_strategy(v11n.clone()), 1..4)
        .prop_map(move |ranges| Passage::new(&v11n, ranges))
}

/// Strategy for generating verse text that fits one index entry.
pub fn verse_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,200}").expect("Invalid regex")
}

/// Strategy for generating non-empty cipher keys.
pub fn cipher_key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9]{1,32}").expect("Invalid regex")
}

/// Strategy for generating arbitrary payloads to encipher.
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_versification;

    proptest! {
        #[test]
        fn generated_ranges_are_ordered(range in range_strategy(Arc::new(sample_versification()))) {
            prop_assert!(range.start() <= range.end());
        }

        #[test]
        fn generated_passages_are_not_empty(passage in passage_strategy(Arc::new(sample_versification()))) {
            prop_assert!(!passage.is_empty());
        }
    }
}
