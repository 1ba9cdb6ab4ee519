//! Range decomposition.
//!
//! Extraction walks a passage as a sequence of contiguous sub-ranges cut at
//! a fixed boundary (chapters by default), so hooks can emit per-group
//! output such as headings. Decomposition is lossless: concatenating the
//! verses of every sub-range yields the verses of the input in order.

use crate::key::{Passage, VerseRange};
use crate::versification::Versification;

/// The boundary at which ranges are cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Restriction {
    /// Ranges are kept whole.
    None,
    /// Ranges are cut at chapter ends.
    #[default]
    Chapter,
    /// Ranges are cut at book ends.
    Book,
}

/// Splits one range into contiguous sub-ranges at `restriction` boundaries.
///
/// A range whose ends are not verses of `v11n`, or whose end precedes its
/// start, yields no parts.
#[must_use]
pub fn split_range(
    range: &VerseRange,
    v11n: &Versification,
    restriction: Restriction,
) -> Vec<VerseRange> {
    match (v11n.ordinal(&range.start()), v11n.ordinal(&range.end())) {
        (Some(first), Some(last)) if first <= last => {}
        _ => return Vec::new(),
    }
    let mut parts = Vec::new();
    let mut start = range.start();

    loop {
        let boundary = match restriction {
            Restriction::None => range.end(),
            Restriction::Chapter => v11n.last_in_chapter(&start),
            Restriction::Book => v11n.last_in_book(&start),
        };
        let end = boundary.min(range.end());
        parts.push(VerseRange::from_valid(start, end));

        if end >= range.end() {
            break;
        }
        match v11n.next_verse(&end) {
            Some(next) => start = next,
            None => break,
        }
    }

    parts
}

/// Splits every range of `passage` into sub-ranges, in passage order.
#[must_use]
pub fn decompose(
    passage: &Passage,
    v11n: &Versification,
    restriction: Restriction,
) -> Vec<VerseRange> {
    passage
        .ranges()
        .iter()
        .flat_map(|range| split_range(range, v11n, restriction))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Key, Verse};
    use crate::versification::tests::sample;
    use crate::versification::BookInfo;
    use proptest::prelude::*;

    fn passage(v11n: &Versification, text: &str) -> Passage {
        Key::parse(v11n, text).unwrap().to_passage(v11n).unwrap()
    }

    #[test]
    fn two_chapters_split_in_two() {
        let v11n = sample();
        let parts = decompose(&passage(&v11n, "Gen 3:1-4:4"), &v11n, Restriction::Chapter);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].start(), Verse::new(0, 3, 1));
        assert_eq!(parts[0].end(), Verse::new(0, 3, 5));
        assert_eq!(parts[1].start(), Verse::new(0, 4, 1));
        assert_eq!(parts[1].end(), Verse::new(0, 4, 4));
    }

    #[test]
    fn single_verse_is_one_part() {
        let v11n = sample();
        let parts = decompose(&passage(&v11n, "Gen 2:2"), &v11n, Restriction::Chapter);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].start(), parts[0].end());
    }

    #[test]
    fn book_restriction_cuts_at_books() {
        let v11n = sample();
        let parts = decompose(&passage(&v11n, "Gen 4:2-Exo 1:3"), &v11n, Restriction::Book);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].end(), Verse::new(0, 5, 6));
        assert_eq!(parts[1].start(), Verse::new(1, 1, 1));
    }

    #[test]
    fn no_restriction_keeps_ranges() {
        let v11n = sample();
        let parts = decompose(&passage(&v11n, "Gen 1:2-Exo 2:2"), &v11n, Restriction::None);
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn passages_keep_range_order() {
        let v11n = sample();
        let parts = decompose(&passage(&v11n, "Exo 1:4-2:1; Gen 1:3"), &v11n, Restriction::Chapter);
        let names: Vec<String> = parts.iter().map(|p| p.name(&v11n)).collect();
        assert_eq!(names, vec!["Genesis 1:3", "Exodus 1:4", "Exodus 2:1"]);
    }

    #[test]
    fn foreign_range_yields_no_parts() {
        let v11n = sample();
        let long_genesis = Versification::new(
            "long",
            vec![BookInfo::new("Genesis", "Gen", vec![10, 2])],
        )
        .unwrap();
        let Key::Range(foreign) = Key::parse(&long_genesis, "Gen 1:2-9").unwrap() else {
            panic!("expected range");
        };

        for restriction in [Restriction::None, Restriction::Chapter, Restriction::Book] {
            assert!(split_range(&foreign, &v11n, restriction).is_empty());
        }
    }

    proptest! {
        #[test]
        fn decomposition_is_lossless(a in 0u32..29, b in 0u32..29, which in 0usize..3) {
            let v11n = sample();
            let (lo, hi) = (a.min(b), a.max(b));
            let range = VerseRange::new(
                &v11n,
                v11n.verse_at(lo).unwrap(),
                v11n.verse_at(hi).unwrap(),
            ).unwrap();
            let restriction = [Restriction::None, Restriction::Chapter, Restriction::Book][which];

            let expected: Vec<Verse> = range.verses(&v11n).collect();
            let actual: Vec<Verse> = split_range(&range, &v11n, restriction)
                .iter()
                .flat_map(|part| part.verses(&v11n).collect::<Vec<_>>())
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
