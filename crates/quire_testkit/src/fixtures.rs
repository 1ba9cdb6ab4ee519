//! Test fixtures and module helpers.
//!
//! Provides a small versification and temporary on-disk modules built
//! from it.

use crate::writer::ModuleWriter;
use quire_core::{BookInfo, BookMetadata, Encoding, RawVerseBackend, Verse, Versification};
use quire_storage::CipherKey;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Returns a three-book versification with 29 verses.
///
/// | Book    | Chapters (verses)   |
/// |---------|---------------------|
/// | Genesis | 3, 2, 5, 4, 6       |
/// | Exodus  | 4, 3                |
/// | 1 Kings | 2                   |
pub fn sample_versification() -> Versification {
    Versification::new(
        "sample",
        vec![
            BookInfo::new("Genesis", "Gen", vec![3, 2, 5, 4, 6]),
            BookInfo::new("Exodus", "Exo", vec![4, 3]),
            BookInfo::new("1 Kings", "1Kgs", vec![2]),
        ],
    )
    .expect("sample versification is valid")
}

/// Returns the fixture text of `verse`, e.g. `Genesis 1:1 text`.
pub fn verse_text(v11n: &Versification, verse: &Verse) -> String {
    format!("{} text", v11n.verse_name(verse))
}

/// A module in a temporary directory, removed on drop.
pub struct TestModule {
    metadata: BookMetadata,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestModule {
    /// Starts building a module.
    pub fn builder() -> TestModuleBuilder {
        TestModuleBuilder::new()
    }

    /// Creates a plain module with fixture text for every verse of Genesis.
    pub fn genesis() -> Self {
        Self::builder().genesis().build()
    }

    /// Returns the module directory.
    pub fn path(&self) -> &Path {
        self.metadata.data_path()
    }

    /// Returns the metadata the module was written with.
    pub fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    /// Opens a backend from the metadata on disk.
    pub fn backend(&self) -> RawVerseBackend {
        let metadata = BookMetadata::load(self.path()).expect("Failed to load module metadata");
        RawVerseBackend::new(metadata)
    }
}

/// Builder for [`TestModule`].
pub struct TestModuleBuilder {
    name: String,
    cipher_key: Option<String>,
    encoding: Encoding,
    texts: Vec<(Verse, Vec<u8>)>,
    genesis: bool,
}

impl TestModuleBuilder {
    fn new() -> Self {
        Self {
            name: "TEST".to_string(),
            cipher_key: None,
            encoding: Encoding::Utf8,
            texts: Vec::new(),
            genesis: false,
        }
    }

    /// Sets the module name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Enciphers the module with `key`. An empty key writes a locked module,
    /// still enciphered in the hash-initialized state.
    #[must_use]
    pub fn cipher_key(mut self, key: &str) -> Self {
        self.cipher_key = Some(key.to_string());
        self
    }

    /// Sets the text encoding.
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Adds fixture text for every verse of Genesis.
    #[must_use]
    pub fn genesis(mut self) -> Self {
        self.genesis = true;
        self
    }

    /// Sets the text of one verse.
    #[must_use]
    pub fn verse(mut self, verse: Verse, text: impl AsRef<[u8]>) -> Self {
        self.texts.push((verse, text.as_ref().to_vec()));
        self
    }

    /// Writes the module into a fresh temporary directory.
    pub fn build(self) -> TestModule {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let v11n = Arc::new(sample_versification());

        let mut metadata = BookMetadata::new(self.name, temp_dir.path().join("module"), v11n.clone())
            .with_encoding(self.encoding);
        if let Some(key) = self.cipher_key {
            metadata = metadata.with_cipher_key(CipherKey::from(key.as_str()));
        }

        let mut writer = ModuleWriter::new(metadata.clone());
        if self.genesis {
            let genesis = v11n.books()[0].chapters.iter().enumerate().flat_map(|(c, &verses)| {
                (1..=verses).map(move |v| Verse::new(0, c as u16 + 1, v))
            });
            for verse in genesis {
                writer
                    .insert(verse, verse_text(&v11n, &verse))
                    .expect("Genesis verse is in the sample versification");
            }
        }
        for (verse, text) in self.texts {
            writer.insert(verse, text).expect("Failed to insert verse");
        }
        writer.write().expect("Failed to write module");

        TestModule {
            metadata,
            _temp_dir: temp_dir,
        }
    }
}

/// Runs a test with a temporary Genesis module.
///
/// # Example
///
/// ```rust,ignore
/// use quire_testkit::with_test_module;
///
/// #[test]
/// fn my_test() {
///     with_test_module(|module| {
///         let backend = module.backend();
///         // ... read operations
///     });
/// }
/// ```
pub fn with_test_module<F, R>(f: F) -> R
where
    F: FnOnce(&TestModule) -> R,
{
    let module = TestModule::genesis();
    f(&module)
}
