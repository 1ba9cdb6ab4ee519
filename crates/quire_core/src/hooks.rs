//! Extraction hooks.
//!
//! Hooks turn raw unit text into caller-defined content while a backend
//! walks a key. `pre_range` runs once per sub-range before its verses,
//! `post_unit` once per verse after its text is read and deciphered.
//! Both receive the caller-owned output vector; the borrowed range and
//! verse cannot outlive the call.

use crate::key::{Verse, VerseRange};
use crate::versification::Versification;
use serde::Serialize;
use std::sync::Arc;

/// Callbacks invoked by [`crate::Backend::raw_text`].
pub trait ExtractionHooks<C> {
    /// Called before the verses of `range` are read.
    fn pre_range(&mut self, range: &VerseRange, content: &mut Vec<C>);

    /// Called with the decoded text of `verse`.
    fn post_unit(&mut self, verse: &Verse, content: &mut Vec<C>, raw_text: &str);
}

/// One item of collected raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawContent {
    /// Title of a sub-range, emitted when headings are enabled.
    Heading {
        /// Name of the sub-range.
        title: String,
    },
    /// Text of one verse.
    Unit {
        /// Name of the verse.
        key: String,
        /// Raw text as stored.
        text: String,
    },
}

/// Hooks that collect named verse text, optionally with a heading per range.
#[derive(Debug, Clone)]
pub struct RawTextCollector {
    versification: Arc<Versification>,
    headings: bool,
}

impl RawTextCollector {
    /// Creates a collector naming keys with `versification`.
    pub fn new(versification: Arc<Versification>) -> Self {
        Self {
            versification,
            headings: false,
        }
    }

    /// Sets whether a heading is emitted before each sub-range.
    #[must_use]
    pub fn with_headings(mut self, headings: bool) -> Self {
        self.headings = headings;
        self
    }
}

impl ExtractionHooks<RawContent> for RawTextCollector {
    fn pre_range(&mut self, range: &VerseRange, content: &mut Vec<RawContent>) {
        if self.headings {
            content.push(RawContent::Heading {
                title: range.name(&self.versification),
            });
        }
    }

    fn post_unit(&mut self, verse: &Verse, content: &mut Vec<RawContent>, raw_text: &str) {
        content.push(RawContent::Unit {
            key: self.versification.verse_name(verse),
            text: raw_text.to_string(),
        });
    }
}
