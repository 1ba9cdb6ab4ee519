//! Module writer.
//!
//! Writes raw verse modules (metadata, index and data) so tests can read
//! them back through [`quire_core::RawVerseBackend`].

use quire_core::{
    encode_index_header, BookMetadata, CoreError, CoreResult, IndexEntry, Verse, DATA_FILE,
    INDEX_FILE,
};
use quire_storage::{EncipheredBackend, FileBackend, StorageBackend};
use std::collections::BTreeMap;
use std::fs;

/// Builds a raw verse module in the metadata's data path.
#[derive(Debug)]
pub struct ModuleWriter {
    metadata: BookMetadata,
    texts: BTreeMap<u32, Vec<u8>>,
}

impl ModuleWriter {
    /// Creates a writer for the module described by `metadata`.
    pub fn new(metadata: BookMetadata) -> Self {
        Self {
            metadata,
            texts: BTreeMap::new(),
        }
    }

    /// Sets the plain text of `verse`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReference` if the verse is not in the versification.
    pub fn insert(&mut self, verse: Verse, text: impl AsRef<[u8]>) -> CoreResult<&mut Self> {
        let v11n = self.metadata.versification();
        let ordinal = v11n.ordinal(&verse).ok_or_else(|| {
            CoreError::invalid_reference(format!("{verse:?} is not in {}", v11n.name()))
        })?;
        self.texts.insert(ordinal, text.as_ref().to_vec());
        Ok(self)
    }

    /// Returns the number of verses with text.
    pub fn len(&self) -> usize {
        self.texts.values().filter(|t| !t.is_empty()).count()
    }

    /// Returns true if no verse has text.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes `module.json`, `text.idx` and `text.dat`, replacing existing files.
    ///
    /// Verse text is enciphered when the module has a cipher key.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written or a verse does not fit
    /// the index entry limits.
    pub fn write(&self) -> CoreResult<()> {
        self.metadata.save()?;
        let dir = self.metadata.data_path();

        let data_path = dir.join(DATA_FILE);
        if data_path.exists() {
            fs::remove_file(&data_path)?;
        }
        let file = FileBackend::open_append(&data_path)?;
        let mut data: Box<dyn StorageBackend> = match self.metadata.cipher_key() {
            Some(key) => Box::new(EncipheredBackend::new(Box::new(file), key.clone())),
            None => Box::new(file),
        };

        let count = self.metadata.versification().verse_count();
        let mut index = encode_index_header(count).to_vec();
        for ordinal in 0..count {
            let entry = match self.texts.get(&ordinal).filter(|t| !t.is_empty()) {
                Some(text) => {
                    let size = u16::try_from(text.len()).map_err(|_| {
                        CoreError::corrupted(format!("verse {ordinal} exceeds {} bytes", u16::MAX))
                    })?;
                    let offset = u32::try_from(data.append(text)?)
                        .map_err(|_| CoreError::corrupted("data file exceeds 4 GiB"))?;
                    IndexEntry::new(offset, size)
                }
                None => IndexEntry::default(),
            };
            index.extend_from_slice(&entry.encode());
        }
        data.flush()?;

        fs::write(dir.join(INDEX_FILE), index)?;
        Ok(())
    }
}
