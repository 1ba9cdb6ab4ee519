//! # Quire Storage
//!
//! Byte stores and the module stream cipher for Quire.
//!
//! This crate provides the lowest-level storage abstraction for Quire.
//! Storage backends are **opaque byte stores** - they do not interpret
//! the data they hold. Module layouts (indices, verse data) are owned
//! by `quire_core`.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - For module files on disk
//! - [`EncipheredBackend`] - Wrapper that enciphers each stored entry
//!
//! ## Cipher
//!
//! [`CipherEngine`] is the symmetric card-shuffle stream cipher used by
//! enciphered modules. [`decipher`] and [`encipher`] transform a buffer in
//! place with a fresh engine and burn it afterwards.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quire_storage::{CipherKey, EncipheredBackend, FileBackend, StorageBackend};
//! use std::path::Path;
//!
//! let data = FileBackend::open_append(Path::new("kjv/text.dat")).unwrap();
//! let mut data = EncipheredBackend::new(Box::new(data), CipherKey::from("ab12cd34"));
//! let offset = data.append(b"In the beginning").unwrap();
//! assert_eq!(data.read_at(offset, 16).unwrap(), b"In the beginning");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod cipher;
mod enciphered;
mod error;
mod file;

pub use backend::StorageBackend;
pub use cipher::{decipher, encipher, CipherEngine, CipherKey};
pub use enciphered::EncipheredBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
