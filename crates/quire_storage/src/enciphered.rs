//! Enciphering storage backend wrapper.
//!
//! Enciphered modules store every entry (one verse) as an independent
//! cipher stream: the engine is rebuilt from the key at the first byte of
//! each entry. This wrapper applies that rule to any other backend.
//!
//! ## Entry Model
//!
//! - `append(data)` enciphers `data` as one entry
//! - `read_at(offset, len)` must address exactly one whole entry; reading
//!   from the middle of an entry yields garbage because the cipher state
//!   depends on every preceding byte of the entry
//! - Offsets and sizes are identical to the wrapped store (the cipher does
//!   not change lengths)

use crate::backend::StorageBackend;
use crate::cipher::{decipher, encipher, CipherKey};
use crate::error::StorageResult;
use parking_lot::RwLock;

/// A storage backend that enciphers each entry of another backend.
///
/// # Example
///
/// ```rust,no_run
/// use quire_storage::{CipherKey, EncipheredBackend, FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let data = FileBackend::open_append(Path::new("locked/text.dat")).unwrap();
/// let mut store = EncipheredBackend::new(Box::new(data), CipherKey::from("key"));
/// let offset = store.append(b"secret verse").unwrap();
/// assert_eq!(store.read_at(offset, 12).unwrap(), b"secret verse");
/// ```
pub struct EncipheredBackend {
    inner: RwLock<Box<dyn StorageBackend>>,
    key: CipherKey,
}

impl EncipheredBackend {
    /// Wraps `inner`, enciphering entries with `key`.
    pub fn new(inner: Box<dyn StorageBackend>, key: CipherKey) -> Self {
        Self {
            inner: RwLock::new(inner),
            key,
        }
    }

    /// Reads the stored (still enciphered) bytes of an entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the wrapped read fails.
    pub fn read_raw_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        self.inner.read().read_at(offset, len)
    }
}

impl StorageBackend for EncipheredBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut data = self.read_raw_at(offset, len)?;
        decipher(&self.key, &mut data);
        Ok(data)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let mut entry = data.to_vec();
        encipher(&self.key, &mut entry);
        self.inner.write().append(&entry)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.inner.write().flush()
    }

    fn size(&self) -> StorageResult<u64> {
        self.inner.read().size()
    }
}

impl std::fmt::Debug for EncipheredBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncipheredBackend")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
