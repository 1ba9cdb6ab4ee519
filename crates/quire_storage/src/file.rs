//! Module files on disk.
//!
//! Readers open `text.idx` and `text.dat` with [`FileBackend::open_read_only`].
//! Authoring tools build them with [`FileBackend::open_append`].

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// How a [`FileBackend`] was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    ReadOnly,
    Append,
}

/// One module file.
///
/// Reads seek a shared cursor, so they are serialized by a mutex. Each
/// retrieval opens its own handles and never contends with another.
///
/// ```no_run
/// use quire_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let data = FileBackend::open_read_only(Path::new("kjv/text.dat")).unwrap();
/// let verse = data.read_at(0, 16).unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: Mutex<File>,
    len: u64,
    mode: Mode,
}

impl FileBackend {
    /// Opens an existing file for reading. Nothing is created.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file is missing or unreadable.
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        let file = File::open(path)?;
        Self::with_file(path, file, Mode::ReadOnly)
    }

    /// Opens a file for appending, creating it and its parent directories.
    ///
    /// Existing content is kept; appends go after it.
    ///
    /// # Errors
    ///
    /// Returns `Io` if a directory or the file cannot be created.
    pub fn open_append(path: &Path) -> StorageResult<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;
        Self::with_file(path, file, Mode::Append)
    }

    fn with_file(path: &Path, file: File, mode: Mode) -> StorageResult<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            len,
            mode,
        })
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file was opened for appending.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.mode == Mode::Append
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let in_bounds = offset
            .checked_add(len as u64)
            .is_some_and(|end| end <= self.len);
        if !in_bounds {
            return Err(StorageError::ReadPastEnd {
                offset,
                len,
                size: self.len,
            });
        }

        let mut buf = vec![0u8; len];
        if len > 0 {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf)?;
        }
        Ok(buf)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if self.mode == Mode::ReadOnly {
            return Err(StorageError::ReadOnly);
        }
        let offset = self.len;
        self.file.get_mut().write_all(data)?;
        self.len += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.mode == Mode::Append {
            self.file.get_mut().flush()?;
        }
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.len)
    }
}
