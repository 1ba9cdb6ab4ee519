//! # Quire Core
//!
//! Keyed-document backends for Quire.
//!
//! This crate provides:
//! - References: verses, ranges and passages over a versification
//! - Range decomposition at chapter or book boundaries
//! - The [`Backend`] trait: scoped state, extraction hooks and deciphering
//!   on top of one raw read primitive
//! - [`RawVerseBackend`] for indexed verse modules on disk
//! - Activation of backends by an application-owned [`Activator`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use quire_core::{Backend, BookMetadata, Key, RawTextCollector, RawVerseBackend};
//! use std::path::Path;
//!
//! let metadata = BookMetadata::load(Path::new("modules/kjv")).unwrap();
//! let backend = RawVerseBackend::new(metadata);
//! let v11n = backend.metadata().versification().clone();
//!
//! let key = Key::parse(&v11n, "Gen 1:1-2:3").unwrap();
//! let mut hooks = RawTextCollector::new(v11n);
//! let content = backend.raw_text(&key, &mut hooks).unwrap();
//! println!("{} verses", content.len());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod activate;
mod backend;
mod config;
mod decompose;
mod error;
mod hooks;
mod key;
mod raw;
mod state;
mod versification;

pub use activate::{Activatable, Activator, Lock};
pub use backend::Backend;
pub use config::{BackendConfig, BookMetadata, Encoding, MODULE_CONF_FILE};
pub use decompose::{decompose, split_range, Restriction};
pub use error::{CoreError, CoreResult};
pub use hooks::{ExtractionHooks, RawContent, RawTextCollector};
pub use key::{Key, Passage, Verse, VerseRange, Verses};
pub use raw::{
    encode_index_header, IndexEntry, RawVerseBackend, RawVerseState, DATA_FILE, INDEX_ENTRY_SIZE,
    INDEX_FILE, INDEX_HEADER_SIZE, INDEX_MAGIC, INDEX_VERSION,
};
pub use state::StateGuard;
pub use versification::{BookInfo, Versification};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
