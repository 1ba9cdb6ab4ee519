//! Spy backend.
//!
//! An in-memory [`Backend`] that counts state and activation calls and can
//! be told to fail, for checking the extraction contract independently of
//! any on-disk layout.

use crate::fixtures::{sample_versification, verse_text};
use parking_lot::Mutex;
use quire_core::{
    Activatable, Backend, BackendConfig, BookMetadata, CoreError, CoreResult, Lock, Verse,
};
use quire_storage::CipherKey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// State handed out by a [`SpyBackend`].
#[derive(Debug)]
pub struct SpyState {
    /// Sequence number of the state, starting at 0.
    pub id: usize,
}

/// Backend that records how it is driven.
pub struct SpyBackend {
    metadata: BookMetadata,
    config: BackendConfig,
    texts: HashMap<Verse, Vec<u8>>,
    fail_on: Option<Verse>,
    fail_open: bool,
    opened: AtomicUsize,
    released: AtomicUsize,
    reads: Mutex<Vec<Verse>>,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
}

impl SpyBackend {
    /// Creates a spy over the sample versification with no text.
    pub fn new() -> Self {
        Self::with_metadata(BookMetadata::new("SPY", "/nonexistent/spy", sample_versification()))
    }

    /// Creates a spy with the given metadata and no text.
    pub fn with_metadata(metadata: BookMetadata) -> Self {
        Self {
            metadata,
            config: BackendConfig::default(),
            texts: HashMap::new(),
            fail_on: None,
            fail_open: false,
            opened: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            reads: Mutex::new(Vec::new()),
            activations: AtomicUsize::new(0),
            deactivations: AtomicUsize::new(0),
        }
    }

    /// Creates an enciphered spy; stored text is enciphered with `key`.
    pub fn enciphered(key: &str) -> Self {
        let metadata = BookMetadata::new("SPY", "/nonexistent/spy", sample_versification())
            .with_cipher_key(CipherKey::from(key));
        Self::with_metadata(metadata)
    }

    /// Sets the extraction options.
    #[must_use]
    pub fn with_config(mut self, config: BackendConfig) -> Self {
        self.config = config;
        self
    }

    /// Stores `text` for `verse`, enciphered if the spy has a key.
    #[must_use]
    pub fn with_text(mut self, verse: Verse, text: &str) -> Self {
        let mut stored = text.as_bytes().to_vec();
        self.encipher(&mut stored);
        self.texts.insert(verse, stored);
        self
    }

    /// Stores fixture text for every verse of the versification.
    #[must_use]
    pub fn with_all_texts(mut self) -> Self {
        let v11n = self.metadata.versification().clone();
        for ordinal in 0..v11n.verse_count() {
            if let Some(verse) = v11n.verse_at(ordinal) {
                self = self.with_text(verse, &verse_text(&v11n, &verse));
            }
        }
        self
    }

    /// Makes reading `verse` fail.
    #[must_use]
    pub fn fail_on(mut self, verse: Verse) -> Self {
        self.fail_on = Some(verse);
        self
    }

    /// Makes opening a state fail.
    #[must_use]
    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Returns the number of states opened.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Returns the number of states released.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Returns the verses read so far, in read order.
    pub fn reads(&self) -> Vec<Verse> {
        self.reads.lock().clone()
    }

    /// Returns the number of activations.
    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    /// Returns the number of deactivations.
    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }
}

impl Default for SpyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Activatable for SpyBackend {
    fn activate(&self, _lock: &Lock) {
        self.activations.fetch_add(1, Ordering::SeqCst);
    }

    fn deactivate(&self, _lock: &Lock) {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
    }
}

impl Backend for SpyBackend {
    type State = SpyState;

    fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    fn config(&self) -> BackendConfig {
        self.config
    }

    fn init_state(&self) -> CoreResult<SpyState> {
        if self.fail_open {
            return Err(CoreError::corrupted("spy refuses to open"));
        }
        let id = self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(SpyState { id })
    }

    fn release_state(&self, _state: SpyState) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    fn read_raw_unit(&self, _state: &mut SpyState, verse: &Verse) -> CoreResult<Vec<u8>> {
        self.reads.lock().push(*verse);
        if self.fail_on == Some(*verse) {
            return Err(CoreError::corrupted("spy read failure"));
        }
        Ok(self.texts.get(verse).cloned().unwrap_or_default())
    }

    fn contains(&self, verse: &Verse) -> bool {
        self.texts.get(verse).is_some_and(|t| !t.is_empty())
    }
}
