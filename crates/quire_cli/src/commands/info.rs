//! Info command implementation.

use quire_core::{Backend, BookMetadata, Encoding, RawVerseBackend};
use quire_storage::{FileBackend, StorageBackend};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Module inspection result.
#[derive(Debug, Serialize)]
pub struct InfoResult {
    /// Module name.
    pub name: String,
    /// Module path.
    pub path: String,
    /// Versification name.
    pub versification: String,
    /// Text encoding.
    pub encoding: Encoding,
    /// Whether the module is enciphered.
    pub enciphered: bool,
    /// Whether the module is enciphered with an empty key.
    pub locked: bool,
    /// Number of verses in the versification.
    pub verse_count: u32,
    /// Number of verses with text.
    pub populated_count: usize,
    /// Index file size in bytes.
    pub index_size: u64,
    /// Data file size in bytes.
    pub data_size: u64,
}

/// Runs the info command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects metadata and file statistics of the module at `path`.
pub fn inspect(path: &Path) -> Result<InfoResult, Box<dyn std::error::Error>> {
    let metadata = BookMetadata::load(path)?;
    let backend = RawVerseBackend::new(metadata);
    let metadata = backend.metadata();
    debug!(module = metadata.name(), path = %path.display(), "inspecting module");

    Ok(InfoResult {
        name: metadata.name().to_string(),
        path: path.display().to_string(),
        versification: metadata.versification().name().to_string(),
        encoding: metadata.encoding(),
        enciphered: metadata.is_enciphered(),
        locked: metadata.is_locked(),
        verse_count: metadata.versification().verse_count(),
        populated_count: backend.populated_count()?,
        index_size: FileBackend::open_read_only(&backend.index_path())?.size()?,
        data_size: FileBackend::open_read_only(&backend.data_path())?.size()?,
    })
}

fn print_text_output(result: &InfoResult) {
    println!("Module: {}", result.name);
    println!("Path: {}", result.path);
    println!();
    println!("Versification: {}", result.versification);
    println!("Encoding: {:?}", result.encoding);
    let cipher = match (result.enciphered, result.locked) {
        (false, _) => "none",
        (true, false) => "enciphered",
        (true, true) => "enciphered (locked)",
    };
    println!("Cipher: {cipher}");
    println!();
    println!("Verses: {} of {}", result.populated_count, result.verse_count);
    println!("Index size: {} bytes", result.index_size);
    println!("Data size: {} bytes", result.data_size);
}
