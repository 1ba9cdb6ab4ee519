//! Raw verse modules.
//!
//! A raw verse module is a directory holding two files next to its
//! `module.json`:
//!
//! ```text
//! text.idx
//! ┌──────────────────────────────────────────────┐
//! │ magic "QVIX" | version u16 | reserved u16    │  12 bytes
//! │ count u32                                     │
//! ├──────────────────────────────────────────────┤
//! │ offset u32 | size u16                         │  6 bytes per verse,
//! │ ...                                           │  in ordinal order
//! └──────────────────────────────────────────────┘
//!
//! text.dat
//! ┌──────────────────────────────────────────────┐
//! │ verse bytes, concatenated                     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. A verse with no text has size 0. When the
//! module is enciphered each verse is an independent cipher stream.

use crate::activate::{Activatable, Lock};
use crate::backend::Backend;
use crate::config::{BackendConfig, BookMetadata};
use crate::error::{CoreError, CoreResult};
use crate::key::Verse;
use parking_lot::RwLock;
use quire_storage::{FileBackend, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File name of the verse index.
pub const INDEX_FILE: &str = "text.idx";

/// File name of the verse data.
pub const DATA_FILE: &str = "text.dat";

/// Magic bytes opening the index.
pub const INDEX_MAGIC: [u8; 4] = *b"QVIX";

/// Current index format version.
pub const INDEX_VERSION: u16 = 1;

/// Size of the index header in bytes.
pub const INDEX_HEADER_SIZE: usize = 12;

/// Size of one index entry in bytes.
pub const INDEX_ENTRY_SIZE: usize = 6;

/// Location of one verse in the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexEntry {
    /// Byte offset in the data file.
    pub offset: u32,
    /// Length in bytes; 0 if the verse has no text.
    pub size: u16,
}

impl IndexEntry {
    /// Creates an entry.
    #[must_use]
    pub const fn new(offset: u32, size: u16) -> Self {
        Self { offset, size }
    }

    /// Encodes the entry.
    #[must_use]
    pub fn encode(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut buf = [0u8; INDEX_ENTRY_SIZE];
        buf[0..4].copy_from_slice(&self.offset.to_le_bytes());
        buf[4..6].copy_from_slice(&self.size.to_le_bytes());
        buf
    }

    /// Decodes an entry.
    ///
    /// # Errors
    ///
    /// Returns `Corrupted` if `bytes` is not exactly one entry long.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != INDEX_ENTRY_SIZE {
            return Err(CoreError::corrupted(format!(
                "index entry is {} bytes, expected {INDEX_ENTRY_SIZE}",
                bytes.len()
            )));
        }
        Ok(Self {
            offset: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            size: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }
}

/// Encodes an index header for `count` entries.
#[must_use]
pub fn encode_index_header(count: u32) -> [u8; INDEX_HEADER_SIZE] {
    let mut buf = [0u8; INDEX_HEADER_SIZE];
    buf[0..4].copy_from_slice(&INDEX_MAGIC);
    buf[4..6].copy_from_slice(&INDEX_VERSION.to_le_bytes());
    buf[8..12].copy_from_slice(&count.to_le_bytes());
    buf
}

fn check_index_header(header: &[u8], expected_count: u32, file_size: u64) -> CoreResult<()> {
    if header.len() < INDEX_HEADER_SIZE || header[0..4] != INDEX_MAGIC {
        return Err(CoreError::corrupted("index has no QVIX header"));
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != INDEX_VERSION {
        return Err(CoreError::corrupted(format!(
            "unsupported index version {version}"
        )));
    }
    let count = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    if count != expected_count {
        return Err(CoreError::corrupted(format!(
            "index has {count} entries, versification has {expected_count}"
        )));
    }
    let expected_size = (INDEX_HEADER_SIZE + count as usize * INDEX_ENTRY_SIZE) as u64;
    if file_size != expected_size {
        return Err(CoreError::corrupted(format!(
            "index is {file_size} bytes, expected {expected_size}"
        )));
    }
    Ok(())
}

/// Open handles of one raw verse read.
#[derive(Debug)]
pub struct RawVerseState {
    index: FileBackend,
    data: FileBackend,
}

/// Backend for raw verse modules.
pub struct RawVerseBackend {
    metadata: BookMetadata,
    config: BackendConfig,
    index_cache: RwLock<Option<Arc<Vec<IndexEntry>>>>,
}

impl RawVerseBackend {
    /// Creates a backend for the module described by `metadata`.
    ///
    /// No file is touched until a read or activation.
    #[must_use]
    pub fn new(metadata: BookMetadata) -> Self {
        Self {
            metadata,
            config: BackendConfig::default(),
            index_cache: RwLock::new(None),
        }
    }

    /// Sets the extraction options.
    #[must_use]
    pub fn with_config(mut self, config: BackendConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the path of the index file.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.metadata.data_path().join(INDEX_FILE)
    }

    /// Returns the path of the data file.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.metadata.data_path().join(DATA_FILE)
    }

    /// Returns true if the index is held in memory.
    #[must_use]
    pub fn is_index_cached(&self) -> bool {
        self.index_cache.read().is_some()
    }

    /// Counts the verses that have text.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    pub fn populated_count(&self) -> CoreResult<usize> {
        let entries = self.index_entries()?;
        Ok(entries.iter().filter(|e| e.size > 0).count())
    }

    /// Returns the whole index, from memory if activated.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    pub fn index_entries(&self) -> CoreResult<Arc<Vec<IndexEntry>>> {
        if let Some(entries) = self.index_cache.read().as_ref() {
            return Ok(Arc::clone(entries));
        }
        self.load_index().map(Arc::new)
    }

    fn open_index(&self) -> CoreResult<FileBackend> {
        let index = FileBackend::open_read_only(&self.index_path())?;
        let header = index.read_at(0, INDEX_HEADER_SIZE.min(index.size()? as usize))?;
        check_index_header(&header, self.metadata.versification().verse_count(), index.size()?)?;
        Ok(index)
    }

    fn load_index(&self) -> CoreResult<Vec<IndexEntry>> {
        let index = self.open_index()?;
        let body = index.read_at(INDEX_HEADER_SIZE as u64, index.size()? as usize - INDEX_HEADER_SIZE)?;
        body.chunks_exact(INDEX_ENTRY_SIZE)
            .map(IndexEntry::decode)
            .collect()
    }

    fn entry(&self, state: &RawVerseState, ordinal: u32) -> CoreResult<IndexEntry> {
        if let Some(entries) = self.index_cache.read().as_ref() {
            return entries
                .get(ordinal as usize)
                .copied()
                .ok_or_else(|| CoreError::corrupted(format!("no index entry {ordinal}")));
        }
        let offset = (INDEX_HEADER_SIZE + ordinal as usize * INDEX_ENTRY_SIZE) as u64;
        let bytes = state.index.read_at(offset, INDEX_ENTRY_SIZE)?;
        IndexEntry::decode(&bytes)
    }
}

impl Activatable for RawVerseBackend {
    fn activate(&self, _lock: &Lock) {
        match self.load_index() {
            Ok(entries) => {
                info!(
                    module = self.metadata.name(),
                    entries = entries.len(),
                    "index loaded"
                );
                *self.index_cache.write() = Some(Arc::new(entries));
            }
            Err(e) => {
                warn!(module = self.metadata.name(), error = %e, "index not loaded");
            }
        }
    }

    fn deactivate(&self, _lock: &Lock) {
        if self.index_cache.write().take().is_some() {
            debug!(module = self.metadata.name(), "index released");
        }
    }
}

impl Backend for RawVerseBackend {
    type State = RawVerseState;

    fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    fn config(&self) -> BackendConfig {
        self.config
    }

    fn init_state(&self) -> CoreResult<RawVerseState> {
        let index = self.open_index()?;
        let data = FileBackend::open_read_only(&self.data_path())?;
        Ok(RawVerseState { index, data })
    }

    fn read_raw_unit(&self, state: &mut RawVerseState, verse: &Verse) -> CoreResult<Vec<u8>> {
        let v11n = self.metadata.versification();
        let ordinal = v11n
            .ordinal(verse)
            .ok_or_else(|| CoreError::invalid_reference(format!("{verse:?} is not in {}", v11n.name())))?;

        let entry = self.entry(state, ordinal)?;
        if entry.size == 0 {
            return Ok(Vec::new());
        }
        Ok(state
            .data
            .read_at(u64::from(entry.offset), usize::from(entry.size))?)
    }

    fn contains(&self, verse: &Verse) -> bool {
        let Some(ordinal) = self.metadata.versification().ordinal(verse) else {
            return false;
        };
        self.index_entries()
            .ok()
            .and_then(|entries| entries.get(ordinal as usize).copied())
            .is_some_and(|entry| entry.size > 0)
    }
}

impl std::fmt::Debug for RawVerseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawVerseBackend")
            .field("module", &self.metadata.name())
            .field("path", &self.metadata.data_path())
            .field("index_cached", &self.is_index_cached())
            .finish()
    }
}
