//! The keyed-document backend.
//!
//! [`Backend`] has one abstract read primitive, [`Backend::read_raw_unit`],
//! which each storage layout implements. Everything else, in particular
//! [`Backend::raw_text`], is a fixed algorithm on top of it:
//!
//! 1. open a fresh state (failure is a `Resource` error)
//! 2. turn the key into a passage and cut it into sub-ranges
//! 3. per sub-range call `pre_range`, then per verse read, decipher,
//!    decode and call `post_unit`
//! 4. abort on the first failed read with a `Retrieval` error naming the verse
//! 5. release the state exactly once, whatever happened
//!
//! # Concurrency
//!
//! `raw_text` is synchronous. Concurrent calls on one backend each open
//! their own state; implementations must allow several live states or
//! serialize internally.

use crate::activate::Activatable;
use crate::config::{BackendConfig, BookMetadata};
use crate::decompose::decompose;
use crate::error::{CoreError, CoreResult};
use crate::hooks::ExtractionHooks;
use crate::key::{Key, Verse, VerseRange};
use crate::state::StateGuard;
use std::fs;
use tracing::{debug, warn};

/// A module reader built on a single-unit raw read.
pub trait Backend: Activatable {
    /// Open handles needed to read units; one per operation.
    type State: Send;

    /// Returns the module metadata.
    fn metadata(&self) -> &BookMetadata;

    /// Returns the extraction options.
    fn config(&self) -> BackendConfig {
        BackendConfig::default()
    }

    /// Opens a fresh, independent state.
    ///
    /// Handles opened before a failure are dropped here; a failed state is
    /// never passed to [`Backend::release_state`].
    ///
    /// # Errors
    ///
    /// Returns an error if the store is missing, unreadable or has a corrupt header.
    fn init_state(&self) -> CoreResult<Self::State>;

    /// Releases a state. Called exactly once per state from `init_state`.
    fn release_state(&self, state: Self::State) {
        drop(state);
    }

    /// Reads the stored bytes of one verse, before deciphering.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be read.
    fn read_raw_unit(&self, state: &mut Self::State, verse: &Verse) -> CoreResult<Vec<u8>>;

    /// Returns true if the module holds text for `verse`.
    fn contains(&self, verse: &Verse) -> bool;

    /// Deciphers `data` in place if the module has a cipher key.
    fn decipher(&self, data: &mut [u8]) {
        if let Some(key) = self.metadata().cipher_key() {
            quire_storage::decipher(key, data);
        }
    }

    /// Enciphers `data` in place if the module has a cipher key.
    fn encipher(&self, data: &mut [u8]) {
        if let Some(key) = self.metadata().cipher_key() {
            quire_storage::encipher(key, data);
        }
    }

    /// Reads, deciphers and decodes the text of one verse.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Backend::read_raw_unit`].
    fn read_unit_text(&self, state: &mut Self::State, verse: &Verse) -> CoreResult<String> {
        let mut raw = self.read_raw_unit(state, verse)?;
        self.decipher(&mut raw);

        let text = self.metadata().encoding().decode(&raw);
        if self.config().trim_text {
            Ok(text.trim().to_string())
        } else {
            Ok(text)
        }
    }

    /// Extracts the text of `key`, feeding it through `hooks`.
    ///
    /// Returns the content the hooks accumulated. On error the partial
    /// content is discarded.
    ///
    /// # Errors
    ///
    /// - `InvalidReference` if the key does not fit the versification
    /// - `Resource` if the store cannot be opened
    /// - `Retrieval` naming the verse whose read failed
    fn raw_text<C, H>(&self, key: &Key, hooks: &mut H) -> CoreResult<Vec<C>>
    where
        Self: Sized,
        H: ExtractionHooks<C> + ?Sized,
    {
        let metadata = self.metadata();
        let v11n = metadata.versification();
        let passage = key.to_passage(v11n)?;
        let ranges = decompose(&passage, v11n, self.config().restriction);

        if metadata.is_locked() {
            warn!(module = metadata.name(), "module has an empty cipher key");
        }
        debug!(
            module = metadata.name(),
            key = %key.name(v11n),
            ranges = ranges.len(),
            "extracting raw text"
        );

        let mut guard = StateGuard::acquire(self)?;
        let mut content = Vec::new();
        let mut current = None;

        extract(self, guard.state_mut(), &ranges, hooks, &mut content, &mut current).map_err(
            |e| {
                let name = current.map_or_else(|| key.name(v11n), |verse| v11n.verse_name(&verse));
                CoreError::retrieval(name, e)
            },
        )?;

        guard.release();
        Ok(content)
    }

    /// Creates the module directory and its parents if missing.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    fn create(&self) -> CoreResult<()> {
        fs::create_dir_all(self.metadata().data_path())?;
        Ok(())
    }

    /// Returns true if this backend can read its module.
    fn is_supported(&self) -> bool {
        true
    }

    /// Returns true if this backend can write its module.
    fn is_writable(&self) -> bool {
        false
    }
}

fn extract<B, C, H>(
    backend: &B,
    state: &mut B::State,
    ranges: &[VerseRange],
    hooks: &mut H,
    content: &mut Vec<C>,
    current: &mut Option<Verse>,
) -> CoreResult<()>
where
    B: Backend,
    H: ExtractionHooks<C> + ?Sized,
{
    let v11n = backend.metadata().versification();
    for range in ranges {
        hooks.pre_range(range, content);
        for verse in range.verses(v11n) {
            *current = Some(verse);
            let text = backend.read_unit_text(state, &verse)?;
            hooks.post_unit(&verse, content, &text);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activate::Activator;
    use crate::config::BookMetadata;
    use crate::versification::tests::sample;
    use quire_storage::{CipherEngine, CipherKey};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// In-memory backend that counts state lifecycle calls.
    struct MapBackend {
        metadata: BookMetadata,
        texts: HashMap<Verse, Vec<u8>>,
        fail_on: Option<Verse>,
        fail_open: bool,
        config: BackendConfig,
        opened: AtomicUsize,
        released: AtomicUsize,
    }

    impl MapBackend {
        fn new(metadata: BookMetadata) -> Self {
            Self {
                metadata,
                texts: HashMap::new(),
                fail_on: None,
                fail_open: false,
                config: BackendConfig::default(),
                opened: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }
        }

        fn with_text(mut self, verse: Verse, text: &str) -> Self {
            let mut bytes = text.as_bytes().to_vec();
            self.encipher(&mut bytes);
            self.texts.insert(verse, bytes);
            self
        }
    }

    impl Activatable for MapBackend {}

    impl Backend for MapBackend {
        type State = usize;

        fn metadata(&self) -> &BookMetadata {
            &self.metadata
        }

        fn config(&self) -> BackendConfig {
            self.config
        }

        fn init_state(&self) -> CoreResult<usize> {
            if self.fail_open {
                return Err(CoreError::corrupted("bad header"));
            }
            Ok(self.opened.fetch_add(1, Ordering::SeqCst))
        }

        fn release_state(&self, _state: usize) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }

        fn read_raw_unit(&self, _state: &mut usize, verse: &Verse) -> CoreResult<Vec<u8>> {
            if self.fail_on == Some(*verse) {
                return Err(CoreError::corrupted("unreadable entry"));
            }
            Ok(self.texts.get(verse).cloned().unwrap_or_default())
        }

        fn contains(&self, verse: &Verse) -> bool {
            self.texts.contains_key(verse)
        }
    }

    /// Hooks recording the order of calls.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ExtractionHooks<String> for Recorder {
        fn pre_range(&mut self, range: &VerseRange, _content: &mut Vec<String>) {
            self.events.push(format!("pre {}:{}", range.start().chapter(), range.start().verse()));
        }

        fn post_unit(&mut self, verse: &Verse, content: &mut Vec<String>, raw_text: &str) {
            self.events.push(format!("post {}:{}", verse.chapter(), verse.verse()));
            content.push(raw_text.to_string());
        }
    }

    fn metadata() -> BookMetadata {
        BookMetadata::new("TEST", "/nonexistent/test", sample())
    }

    #[test]
    fn two_chapters_call_hooks_in_order() {
        let backend = MapBackend::new(metadata());
        let key = Key::parse(backend.metadata().versification(), "Gen 3:1-4:4").unwrap();
        let mut hooks = Recorder::default();

        let content = backend.raw_text(&key, &mut hooks).unwrap();

        let pre: Vec<&String> = hooks.events.iter().filter(|e| e.starts_with("pre")).collect();
        let post: Vec<&String> = hooks.events.iter().filter(|e| e.starts_with("post")).collect();
        assert_eq!(pre, vec!["pre 3:1", "pre 4:1"]);
        assert_eq!(post.len(), 9);
        assert_eq!(content.len(), 9);
        assert_eq!(hooks.events[0], "pre 3:1");
        assert_eq!(hooks.events[6], "pre 4:1");
        assert_eq!(hooks.events[10], "post 4:4");
        assert_eq!(backend.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_read_names_verse_and_releases() {
        let mut backend = MapBackend::new(metadata());
        backend.fail_on = Some(Verse::new(0, 3, 3));
        let key = Key::parse(backend.metadata().versification(), "Gen 3:1-5").unwrap();

        let err = backend.raw_text(&key, &mut Recorder::default()).unwrap_err();
        match err {
            CoreError::Retrieval { key, source } => {
                assert_eq!(key, "Genesis 3:3");
                assert!(matches!(*source, CoreError::Corrupted { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(backend.opened.load(Ordering::SeqCst), 1);
        assert_eq!(backend.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_open_is_resource_error_without_release() {
        let mut backend = MapBackend::new(metadata());
        backend.fail_open = true;
        let key = Key::from(Verse::new(0, 1, 1));

        let err = backend.raw_text(&key, &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, CoreError::Resource { .. }));
        assert_eq!(backend.released.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_key_fails_before_opening() {
        let backend = MapBackend::new(metadata());
        let key = Key::from(Verse::new(0, 9, 1));

        let err = backend.raw_text(&key, &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { .. }));
        assert_eq!(backend.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn enciphered_text_is_deciphered() {
        let metadata = metadata().with_cipher_key(CipherKey::from("ab12cd34"));
        let backend = MapBackend::new(metadata).with_text(Verse::new(0, 1, 1), "In the beginning");
        assert_ne!(backend.texts[&Verse::new(0, 1, 1)], b"In the beginning");

        let content = backend
            .raw_text(&Key::from(Verse::new(0, 1, 1)), &mut Recorder::default())
            .unwrap();
        assert_eq!(content, vec!["In the beginning"]);
    }

    #[test]
    fn empty_key_still_runs_the_cipher() {
        let metadata = metadata().with_cipher_key(CipherKey::new(Vec::new()));
        let backend = MapBackend::new(metadata).with_text(Verse::new(0, 1, 1), "stored");
        let stored = backend.texts[&Verse::new(0, 1, 1)].clone();
        assert_ne!(stored, b"stored");

        let mut expected = stored;
        let mut engine = CipherEngine::new(b"");
        for byte in &mut expected {
            *byte = engine.decipher_byte(*byte);
        }
        assert_eq!(expected, b"stored");

        let content = backend
            .raw_text(&Key::from(Verse::new(0, 1, 1)), &mut Recorder::default())
            .unwrap();
        assert_eq!(content, vec!["stored"]);
    }

    #[test]
    fn trim_text_option() {
        let mut backend = MapBackend::new(metadata()).with_text(Verse::new(0, 1, 1), "  padded \n");
        let key = Key::from(Verse::new(0, 1, 1));

        let raw = backend.raw_text(&key, &mut Recorder::default()).unwrap();
        assert_eq!(raw, vec!["  padded \n"]);

        backend.config = BackendConfig::new().trim_text(true);
        let trimmed = backend.raw_text(&key, &mut Recorder::default()).unwrap();
        assert_eq!(trimmed, vec!["padded"]);
    }

    #[test]
    fn each_call_opens_its_own_state() {
        let backend = MapBackend::new(metadata());
        let key = Key::from(Verse::new(0, 1, 1));
        for _ in 0..3 {
            backend.raw_text(&key, &mut Recorder::default()).unwrap();
        }
        assert_eq!(backend.opened.load(Ordering::SeqCst), 3);
        assert_eq!(backend.released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn create_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modules").join("test");
        let backend = MapBackend::new(BookMetadata::new("TEST", &path, sample()));

        backend.create().unwrap();
        backend.create().unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn create_fails_over_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("occupied");
        fs::write(&path, b"x").unwrap();
        let backend = MapBackend::new(BookMetadata::new("TEST", &path, sample()));

        assert!(matches!(backend.create(), Err(CoreError::Io(_))));
    }

    #[test]
    fn default_activation_is_a_no_op() {
        let backend = Arc::new(MapBackend::new(metadata()).with_text(Verse::new(0, 1, 1), "x"));
        let activator = Activator::new();
        let key = Key::from(Verse::new(0, 1, 1));

        let before = backend.raw_text(&key, &mut Recorder::default()).unwrap();
        activator.activate(backend.clone());
        let during = backend.raw_text(&key, &mut Recorder::default()).unwrap();
        activator.deactivate(&backend);
        let after = backend.raw_text(&key, &mut Recorder::default()).unwrap();

        assert_eq!(before, during);
        assert_eq!(during, after);
    }

    #[test]
    fn support_flags() {
        let backend = MapBackend::new(metadata());
        assert!(backend.is_supported());
        assert!(!backend.is_writable());
        assert!(!backend.contains(&Verse::new(0, 1, 1)));
    }
}
