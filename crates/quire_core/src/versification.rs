//! Versification: the book/chapter/verse layout a module is keyed by.
//!
//! Verses are numbered by an *ordinal*, their zero-based position in
//! canonical order across all books. Ordinals index the on-disk verse
//! table and make range iteration a simple counter walk.

use crate::error::{CoreError, CoreResult};
use crate::key::Verse;
use serde::{Deserialize, Serialize};

/// One book of a versification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInfo {
    /// Full book name, e.g. `Genesis`.
    pub name: String,
    /// Short name accepted when parsing, e.g. `Gen`.
    pub abbreviation: String,
    /// Verse count of each chapter; chapter 1 is at index 0.
    pub chapters: Vec<u16>,
}

impl BookInfo {
    /// Creates a book description.
    pub fn new(name: impl Into<String>, abbreviation: impl Into<String>, chapters: Vec<u16>) -> Self {
        Self {
            name: name.into(),
            abbreviation: abbreviation.into(),
            chapters,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct VersificationDef {
    name: String,
    books: Vec<BookInfo>,
}

/// The ordered set of books, chapters and verses of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "VersificationDef", into = "VersificationDef")]
pub struct Versification {
    name: String,
    books: Vec<BookInfo>,
    /// Ordinal of verse 1 of every chapter, per book.
    chapter_starts: Vec<Vec<u32>>,
    verse_count: u32,
}

impl Versification {
    /// Builds a versification from its books.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMetadata` if there are no books, a book has no
    /// chapters or more than `u16::MAX`, a chapter has no verses, or the
    /// verse total does not fit in a `u32` ordinal.
    pub fn new(name: impl Into<String>, books: Vec<BookInfo>) -> CoreResult<Self> {
        if books.is_empty() {
            return Err(CoreError::invalid_metadata("versification has no books"));
        }
        if books.len() > usize::from(u16::MAX) {
            return Err(CoreError::invalid_metadata("versification has too many books"));
        }

        let mut chapter_starts = Vec::with_capacity(books.len());
        let mut next = 0u32;
        for book in &books {
            if book.chapters.is_empty() {
                return Err(CoreError::invalid_metadata(format!(
                    "book {} has no chapters",
                    book.name
                )));
            }
            if book.chapters.len() > usize::from(u16::MAX) {
                return Err(CoreError::invalid_metadata(format!(
                    "book {} has too many chapters",
                    book.name
                )));
            }
            let mut starts = Vec::with_capacity(book.chapters.len());
            for (index, verses) in book.chapters.iter().enumerate() {
                if *verses == 0 {
                    return Err(CoreError::invalid_metadata(format!(
                        "{} chapter {} has no verses",
                        book.name,
                        index + 1
                    )));
                }
                starts.push(next);
                next = next.checked_add(u32::from(*verses)).ok_or_else(|| {
                    CoreError::invalid_metadata("versification has too many verses")
                })?;
            }
            chapter_starts.push(starts);
        }

        Ok(Self {
            name: name.into(),
            books,
            chapter_starts,
            verse_count: next,
        })
    }

    /// Returns the versification name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all books in canonical order.
    #[must_use]
    pub fn books(&self) -> &[BookInfo] {
        &self.books
    }

    /// Returns the book at `index`.
    #[must_use]
    pub fn book(&self, index: u16) -> Option<&BookInfo> {
        self.books.get(usize::from(index))
    }

    /// Returns the total number of verses.
    #[must_use]
    pub fn verse_count(&self) -> u32 {
        self.verse_count
    }

    /// Returns the number of verses in a chapter, if the chapter exists.
    #[must_use]
    pub fn verses_in_chapter(&self, book: u16, chapter: u16) -> Option<u16> {
        let index = usize::from(chapter).checked_sub(1)?;
        self.book(book)?.chapters.get(index).copied()
    }

    /// Checks that `verse` exists in this versification.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` naming the first component that is out of range.
    pub fn validate(&self, verse: &Verse) -> CoreResult<()> {
        let book = self.book(verse.book()).ok_or_else(|| {
            CoreError::invalid_reference(format!("no book number {}", verse.book()))
        })?;
        let verses = self
            .verses_in_chapter(verse.book(), verse.chapter())
            .ok_or_else(|| {
                CoreError::invalid_reference(format!(
                    "{} has no chapter {}",
                    book.name,
                    verse.chapter()
                ))
            })?;
        if verse.verse() == 0 || verse.verse() > verses {
            return Err(CoreError::invalid_reference(format!(
                "{} {} has no verse {}",
                book.name,
                verse.chapter(),
                verse.verse()
            )));
        }
        Ok(())
    }

    /// Returns the ordinal of `verse`, or `None` if it does not exist.
    #[must_use]
    pub fn ordinal(&self, verse: &Verse) -> Option<u32> {
        let verses = self.verses_in_chapter(verse.book(), verse.chapter())?;
        if verse.verse() == 0 || verse.verse() > verses {
            return None;
        }
        let start = self.chapter_starts[usize::from(verse.book())][usize::from(verse.chapter()) - 1];
        Some(start + u32::from(verse.verse()) - 1)
    }

    /// Returns the verse with the given ordinal.
    #[must_use]
    pub fn verse_at(&self, ordinal: u32) -> Option<Verse> {
        if ordinal >= self.verse_count {
            return None;
        }
        let book = self
            .chapter_starts
            .partition_point(|starts| starts[0] <= ordinal)
            - 1;
        let starts = &self.chapter_starts[book];
        let chapter = starts.partition_point(|start| *start <= ordinal) - 1;
        let verse = ordinal - starts[chapter] + 1;

        Some(Verse::new(
            u16::try_from(book).ok()?,
            u16::try_from(chapter + 1).ok()?,
            u16::try_from(verse).ok()?,
        ))
    }

    /// Returns the first verse of the versification.
    #[must_use]
    pub fn first_verse(&self) -> Verse {
        Verse::new(0, 1, 1)
    }

    /// Returns the last verse of the versification.
    #[must_use]
    pub fn last_verse(&self) -> Verse {
        let book = self.books.len() - 1;
        let chapters = &self.books[book].chapters;
        Verse::new(book as u16, chapters.len() as u16, chapters[chapters.len() - 1])
    }

    /// Returns the verse following `verse`, crossing chapter and book boundaries.
    #[must_use]
    pub fn next_verse(&self, verse: &Verse) -> Option<Verse> {
        self.verse_at(self.ordinal(verse)? + 1)
    }

    /// Returns the last verse of the chapter containing `verse`.
    ///
    /// `verse` must be valid; an invalid verse is returned unchanged.
    #[must_use]
    pub fn last_in_chapter(&self, verse: &Verse) -> Verse {
        match self.verses_in_chapter(verse.book(), verse.chapter()) {
            Some(last) => Verse::new(verse.book(), verse.chapter(), last),
            None => *verse,
        }
    }

    /// Returns the last verse of the book containing `verse`.
    ///
    /// `verse` must be valid; an invalid verse is returned unchanged.
    #[must_use]
    pub fn last_in_book(&self, verse: &Verse) -> Verse {
        match self.book(verse.book()) {
            Some(book) => {
                let chapter = book.chapters.len();
                Verse::new(verse.book(), chapter as u16, book.chapters[chapter - 1])
            }
            None => *verse,
        }
    }

    /// Finds a book by name, abbreviation or unique name prefix (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if no book or several books match.
    pub fn find_book(&self, name: &str) -> CoreResult<u16> {
        let wanted = normalize(name);
        if wanted.is_empty() {
            return Err(CoreError::invalid_reference("missing book name"));
        }

        if let Some(index) = self
            .books
            .iter()
            .position(|b| normalize(&b.name) == wanted || normalize(&b.abbreviation) == wanted)
        {
            return Ok(index as u16);
        }

        let mut matches = self
            .books
            .iter()
            .enumerate()
            .filter(|(_, b)| normalize(&b.name).starts_with(&wanted));
        match (matches.next(), matches.next()) {
            (Some((index, _)), None) => Ok(index as u16),
            (Some(_), Some(_)) => Err(CoreError::invalid_reference(format!(
                "ambiguous book name: {name}"
            ))),
            (None, _) => Err(CoreError::invalid_reference(format!(
                "unknown book: {name}"
            ))),
        }
    }

    /// Returns the human-readable name of `verse`, e.g. `Genesis 3:4`.
    #[must_use]
    pub fn verse_name(&self, verse: &Verse) -> String {
        format!(
            "{} {}:{}",
            self.book_name(verse.book()),
            verse.chapter(),
            verse.verse()
        )
    }

    pub(crate) fn book_name(&self, book: u16) -> String {
        self.book(book)
            .map_or_else(|| format!("Book {}", u32::from(book) + 1), |b| b.name.clone())
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_lowercase()
}

impl TryFrom<VersificationDef> for Versification {
    type Error = CoreError;

    fn try_from(def: VersificationDef) -> Result<Self, Self::Error> {
        Self::new(def.name, def.books)
    }
}

impl From<Versification> for VersificationDef {
    fn from(v11n: Versification) -> Self {
        Self {
            name: v11n.name,
            books: v11n.books,
        }
    }
}
