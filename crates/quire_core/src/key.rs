//! Reference keys: verses, verse ranges and passages.
//!
//! Keys hold only numeric coordinates; naming and iteration need the
//! [`Versification`] the key belongs to.

use crate::error::{CoreError, CoreResult};
use crate::versification::Versification;

/// A single leaf unit address.
///
/// `book` is a zero-based index into the versification; `chapter` and
/// `verse` are one-based. The derived ordering is canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Verse {
    book: u16,
    chapter: u16,
    verse: u16,
}

impl Verse {
    /// Creates a verse address. Validity is checked against a versification.
    #[must_use]
    pub const fn new(book: u16, chapter: u16, verse: u16) -> Self {
        Self {
            book,
            chapter,
            verse,
        }
    }

    /// Returns the zero-based book index.
    #[must_use]
    pub const fn book(&self) -> u16 {
        self.book
    }

    /// Returns the chapter number.
    #[must_use]
    pub const fn chapter(&self) -> u16 {
        self.chapter
    }

    /// Returns the verse number.
    #[must_use]
    pub const fn verse(&self) -> u16 {
        self.verse
    }
}

/// An inclusive, ordered range of verses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerseRange {
    start: Verse,
    end: Verse,
}

impl VerseRange {
    /// Creates a range from `start` to `end` inclusive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if either end is not a valid verse or
    /// `end` precedes `start`.
    pub fn new(v11n: &Versification, start: Verse, end: Verse) -> CoreResult<Self> {
        v11n.validate(&start)?;
        v11n.validate(&end)?;
        if end < start {
            return Err(CoreError::invalid_reference(format!(
                "range ends before it starts: {}-{}",
                v11n.verse_name(&start),
                v11n.verse_name(&end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a range covering one verse.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if `verse` is not valid.
    pub fn single(v11n: &Versification, verse: Verse) -> CoreResult<Self> {
        Self::new(v11n, verse, verse)
    }

    /// Builds a range whose ends are already known to be valid and ordered.
    pub(crate) const fn from_valid(start: Verse, end: Verse) -> Self {
        Self { start, end }
    }

    /// Returns the first verse.
    #[must_use]
    pub const fn start(&self) -> Verse {
        self.start
    }

    /// Returns the last verse.
    #[must_use]
    pub const fn end(&self) -> Verse {
        self.end
    }

    /// Returns true if `verse` lies inside the range.
    #[must_use]
    pub fn contains(&self, verse: &Verse) -> bool {
        self.start <= *verse && *verse <= self.end
    }

    /// Returns the number of verses in the range.
    #[must_use]
    pub fn len(&self, v11n: &Versification) -> usize {
        self.verses(v11n).len()
    }

    /// Iterates the verses of the range in order.
    ///
    /// Yields nothing if either end is not a verse of `v11n`.
    pub fn verses<'a>(&self, v11n: &'a Versification) -> Verses<'a> {
        let next = v11n.ordinal(&self.start).unwrap_or(u32::MAX);
        let end = v11n.ordinal(&self.end).map_or(0, |o| o + 1);
        Verses { v11n, next, end }
    }

    /// Returns the human-readable name, e.g. `Genesis 3:1-4:4`.
    #[must_use]
    pub fn name(&self, v11n: &Versification) -> String {
        let (start, end) = (&self.start, &self.end);
        if start == end {
            return v11n.verse_name(start);
        }

        let book = v11n.book_name(start.book());
        if start.book() != end.book() {
            return format!("{}-{}", v11n.verse_name(start), v11n.verse_name(end));
        }
        if start.chapter() == end.chapter() {
            if start.verse() == 1 && *end == v11n.last_in_chapter(start) {
                return format!("{book} {}", start.chapter());
            }
            return format!("{book} {}:{}-{}", start.chapter(), start.verse(), end.verse());
        }
        format!(
            "{book} {}:{}-{}:{}",
            start.chapter(),
            start.verse(),
            end.chapter(),
            end.verse()
        )
    }
}

/// Iterator over the verses of a [`VerseRange`].
#[derive(Debug, Clone)]
pub struct Verses<'a> {
    v11n: &'a Versification,
    next: u32,
    end: u32,
}

impl Iterator for Verses<'_> {
    type Item = Verse;

    fn next(&mut self) -> Option<Verse> {
        if self.next >= self.end {
            return None;
        }
        let verse = self.v11n.verse_at(self.next);
        self.next += 1;
        verse
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Verses<'_> {}

/// An ordered set of disjoint, non-adjacent verse ranges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Passage {
    ranges: Vec<VerseRange>,
}

impl Passage {
    /// Builds a passage, sorting ranges and merging overlapping or adjacent ones.
    pub fn new(v11n: &Versification, ranges: impl IntoIterator<Item = VerseRange>) -> Self {
        let mut sorted: Vec<VerseRange> = ranges.into_iter().collect();
        sorted.sort_by_key(|r| r.start);

        let mut merged: Vec<VerseRange> = Vec::with_capacity(sorted.len());
        for range in sorted {
            if let Some(last) = merged.last_mut() {
                let touches = last.end >= range.start
                    || v11n.next_verse(&last.end) == Some(range.start);
                if touches {
                    last.end = last.end.max(range.end);
                    continue;
                }
            }
            merged.push(range);
        }

        Self { ranges: merged }
    }

    /// Returns the normalized ranges in order.
    #[must_use]
    pub fn ranges(&self) -> &[VerseRange] {
        &self.ranges
    }

    /// Returns true if the passage has no verses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns true if any range contains `verse`.
    #[must_use]
    pub fn contains(&self, verse: &Verse) -> bool {
        self.ranges.iter().any(|r| r.contains(verse))
    }

    /// Returns the total number of verses.
    #[must_use]
    pub fn cardinality(&self, v11n: &Versification) -> usize {
        self.ranges.iter().map(|r| r.len(v11n)).sum()
    }

    /// Iterates every verse of the passage in order.
    pub fn verses<'a>(&'a self, v11n: &'a Versification) -> impl Iterator<Item = Verse> + 'a {
        self.ranges.iter().flat_map(move |r| r.verses(v11n))
    }

    /// Returns the human-readable name, ranges separated by `; `.
    #[must_use]
    pub fn name(&self, v11n: &Versification) -> String {
        self.ranges
            .iter()
            .map(|r| r.name(v11n))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Any reference a backend can be asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A single verse.
    Verse(Verse),
    /// A contiguous range.
    Range(VerseRange),
    /// Several ranges.
    Passage(Passage),
}

impl Key {
    /// Parses a reference such as `Gen 3:1-4:4; Exodus 2`.
    ///
    /// Accepted range forms: `Book`, `Book C`, `Book C:V`, `Book C-C`,
    /// `Book C:V-V`, `Book C:V-C:V` and `Book C:V-Book C:V`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if the text cannot be parsed or names
    /// verses outside the versification.
    pub fn parse(v11n: &Versification, text: &str) -> CoreResult<Self> {
        let mut ranges = text
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_range(v11n, part))
            .collect::<CoreResult<Vec<_>>>()?;

        match ranges.len() {
            0 => Err(CoreError::invalid_reference("empty reference")),
            1 => {
                let range = ranges.remove(0);
                if range.start == range.end {
                    Ok(Self::Verse(range.start))
                } else {
                    Ok(Self::Range(range))
                }
            }
            _ => Ok(Self::Passage(Passage::new(v11n, ranges))),
        }
    }

    /// Converts the key into a passage, wrapping a verse or range as a
    /// one-range passage.
    ///
    /// Ranges are checked again against `v11n`: a key built under another
    /// versification may name verses this one lacks.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if any verse of the key is not valid in
    /// `v11n`.
    pub fn to_passage(&self, v11n: &Versification) -> CoreResult<Passage> {
        let ranges = match self {
            Self::Verse(verse) => vec![VerseRange::single(v11n, *verse)?],
            Self::Range(range) => vec![VerseRange::new(v11n, range.start, range.end)?],
            Self::Passage(passage) => passage
                .ranges()
                .iter()
                .map(|range| VerseRange::new(v11n, range.start, range.end))
                .collect::<CoreResult<Vec<_>>>()?,
        };
        Ok(Passage::new(v11n, ranges))
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn name(&self, v11n: &Versification) -> String {
        match self {
            Self::Verse(verse) => v11n.verse_name(verse),
            Self::Range(range) => range.name(v11n),
            Self::Passage(passage) => passage.name(v11n),
        }
    }
}

impl From<Verse> for Key {
    fn from(verse: Verse) -> Self {
        Self::Verse(verse)
    }
}

impl From<VerseRange> for Key {
    fn from(range: VerseRange) -> Self {
        Self::Range(range)
    }
}

impl From<Passage> for Key {
    fn from(passage: Passage) -> Self {
        Self::Passage(passage)
    }
}

/// A chapter number with an optional verse number.
type Location = (u16, Option<u16>);

fn parse_location(text: &str) -> Option<Location> {
    match text.split_once(':') {
        Some((chapter, verse)) => Some((chapter.trim().parse().ok()?, Some(verse.trim().parse().ok()?))),
        None => Some((text.trim().parse().ok()?, None)),
    }
}

/// Splits `Book C:V` into the book index and its location, if any.
fn parse_endpoint(v11n: &Versification, text: &str) -> CoreResult<(u16, Option<Location>)> {
    let text = text.trim();
    if let Some((book, location)) = text.rsplit_once(char::is_whitespace) {
        if let Some(location) = parse_location(location) {
            return Ok((v11n.find_book(book)?, Some(location)));
        }
    }
    Ok((v11n.find_book(text)?, None))
}

fn chapter_end(v11n: &Versification, book: u16, chapter: u16) -> CoreResult<Verse> {
    let last = v11n.verses_in_chapter(book, chapter).ok_or_else(|| {
        CoreError::invalid_reference(format!(
            "{} has no chapter {chapter}",
            v11n.book_name(book)
        ))
    })?;
    Ok(Verse::new(book, chapter, last))
}

/// The last verse an endpoint written as the end of a range refers to.
fn endpoint_end(v11n: &Versification, book: u16, location: Option<Location>) -> CoreResult<Verse> {
    match location {
        None => Ok(v11n.last_in_book(&Verse::new(book, 1, 1))),
        Some((chapter, None)) => chapter_end(v11n, book, chapter),
        Some((chapter, Some(verse))) => Ok(Verse::new(book, chapter, verse)),
    }
}

fn parse_range(v11n: &Versification, text: &str) -> CoreResult<VerseRange> {
    let (left, right) = match text.split_once('-') {
        Some((left, right)) => (left, Some(right.trim())),
        None => (text, None),
    };

    let (book, location) = parse_endpoint(v11n, left)?;
    let start = match location {
        None => Verse::new(book, 1, 1),
        Some((chapter, verse)) => Verse::new(book, chapter, verse.unwrap_or(1)),
    };

    let end = match right {
        None => endpoint_end(v11n, book, location)?,
        Some(right) if right.chars().any(char::is_alphabetic) => {
            let (end_book, end_location) = parse_endpoint(v11n, right)?;
            endpoint_end(v11n, end_book, end_location)?
        }
        Some(right) => match (parse_location(right), location) {
            (Some((chapter, Some(verse))), _) => Verse::new(book, chapter, verse),
            (Some((verse, None)), Some((chapter, Some(_)))) => Verse::new(book, chapter, verse),
            (Some((chapter, None)), _) => chapter_end(v11n, book, chapter)?,
            (None, _) => {
                return Err(CoreError::invalid_reference(format!(
                    "cannot parse range end: {right}"
                )))
            }
        },
    };

    VerseRange::new(v11n, start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versification::tests::sample;
    use crate::versification::BookInfo;

    fn range(v11n: &Versification, text: &str) -> VerseRange {
        match Key::parse(v11n, text).unwrap() {
            Key::Range(range) => range,
            Key::Verse(verse) => VerseRange::single(v11n, verse).unwrap(),
            other => panic!("expected a single range, got {other:?}"),
        }
    }

    #[test]
    fn parse_single_verse() {
        let v11n = sample();
        assert_eq!(
            Key::parse(&v11n, "Gen 3:4").unwrap(),
            Key::Verse(Verse::new(0, 3, 4))
        );
        assert_eq!(
            Key::parse(&v11n, "1 Kings 1:2").unwrap(),
            Key::Verse(Verse::new(2, 1, 2))
        );
    }

    #[test]
    fn parse_range_forms() {
        let v11n = sample();

        let r = range(&v11n, "Genesis 3:1-4:4");
        assert_eq!((r.start(), r.end()), (Verse::new(0, 3, 1), Verse::new(0, 4, 4)));

        let r = range(&v11n, "Gen 3:2-4");
        assert_eq!((r.start(), r.end()), (Verse::new(0, 3, 2), Verse::new(0, 3, 4)));

        let r = range(&v11n, "Gen 3");
        assert_eq!((r.start(), r.end()), (Verse::new(0, 3, 1), Verse::new(0, 3, 5)));

        let r = range(&v11n, "Gen 2-3");
        assert_eq!((r.start(), r.end()), (Verse::new(0, 2, 1), Verse::new(0, 3, 5)));

        let r = range(&v11n, "Exodus");
        assert_eq!((r.start(), r.end()), (Verse::new(1, 1, 1), Verse::new(1, 2, 3)));

        let r = range(&v11n, "Gen 5:6-Exo 1:2");
        assert_eq!((r.start(), r.end()), (Verse::new(0, 5, 6), Verse::new(1, 1, 2)));

        let r = range(&v11n, "Gen 5-Exo 1");
        assert_eq!((r.start(), r.end()), (Verse::new(0, 5, 1), Verse::new(1, 1, 4)));
    }

    #[test]
    fn parse_passage_merges_ranges() {
        let v11n = sample();
        let key = Key::parse(&v11n, "Gen 3:4-5; Gen 3:1-3; Exo 2:1").unwrap();
        let Key::Passage(passage) = key else {
            panic!("expected passage");
        };
        assert_eq!(passage.ranges().len(), 2);
        assert_eq!(passage.name(&v11n), "Genesis 3; Exodus 2:1");
        assert_eq!(passage.cardinality(&v11n), 6);
        assert!(passage.contains(&Verse::new(1, 2, 1)));
        assert!(!passage.contains(&Verse::new(1, 2, 2)));
    }

    #[test]
    fn parse_rejects_bad_references() {
        let v11n = sample();
        assert!(Key::parse(&v11n, "").is_err());
        assert!(Key::parse(&v11n, " ; ").is_err());
        assert!(Key::parse(&v11n, "Lev 1:1").is_err());
        assert!(Key::parse(&v11n, "Gen 9:1").is_err());
        assert!(Key::parse(&v11n, "Gen 3:9").is_err());
        assert!(Key::parse(&v11n, "Gen 4:1-3:1").is_err());
        assert!(Key::parse(&v11n, "Gen 3:1-x:y").is_err());
    }

    #[test]
    fn range_names() {
        let v11n = sample();
        assert_eq!(range(&v11n, "Gen 3:1-4:4").name(&v11n), "Genesis 3:1-4:4");
        assert_eq!(range(&v11n, "Gen 3:2-4").name(&v11n), "Genesis 3:2-4");
        assert_eq!(range(&v11n, "Gen 3").name(&v11n), "Genesis 3");
        assert_eq!(range(&v11n, "Gen 3:3").name(&v11n), "Genesis 3:3");
        assert_eq!(range(&v11n, "Gen 5:6-Exo 1:2").name(&v11n), "Genesis 5:6-Exodus 1:2");
    }

    #[test]
    fn verses_iterate_across_chapters() {
        let v11n = sample();
        let r = range(&v11n, "Gen 2:2-3:2");
        let verses: Vec<Verse> = r.verses(&v11n).collect();
        assert_eq!(
            verses,
            vec![Verse::new(0, 2, 2), Verse::new(0, 3, 1), Verse::new(0, 3, 2)]
        );
        assert_eq!(r.len(&v11n), 3);
    }

    #[test]
    fn verse_key_is_validated_on_conversion() {
        let v11n = sample();
        assert!(Key::from(Verse::new(0, 3, 9)).to_passage(&v11n).is_err());
        let passage = Key::from(Verse::new(0, 3, 3)).to_passage(&v11n).unwrap();
        assert_eq!(passage.cardinality(&v11n), 1);
    }

    #[test]
    fn foreign_ranges_are_rejected_on_conversion() {
        let v11n = sample();
        let long_genesis = Versification::new(
            "long",
            vec![BookInfo::new("Genesis", "Gen", vec![10, 2, 5, 4, 6])],
        )
        .unwrap();
        let foreign = range(&long_genesis, "Gen 1:2-1:9");

        assert!(foreign.verses(&v11n).next().is_none());
        assert!(Key::from(foreign).to_passage(&v11n).is_err());
        let passage = Passage::new(&long_genesis, [range(&long_genesis, "Gen 2:1"), foreign]);
        assert!(Key::from(passage).to_passage(&v11n).is_err());

        let fits = range(&long_genesis, "Gen 1:2-3");
        assert_eq!(Key::from(fits).to_passage(&v11n).unwrap().cardinality(&v11n), 2);
    }

    #[test]
    fn adjacent_ranges_merge_across_chapters() {
        let v11n = sample();
        let a = range(&v11n, "Gen 3");
        let b = range(&v11n, "Gen 4:1-2");
        let passage = Passage::new(&v11n, [b, a]);
        assert_eq!(passage.ranges().len(), 1);
        assert_eq!(passage.name(&v11n), "Genesis 3:1-4:2");
    }
}
