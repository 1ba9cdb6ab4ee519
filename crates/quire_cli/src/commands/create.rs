//! Create command implementation.

use quire_core::{Backend, BookMetadata, RawVerseBackend, Versification, MODULE_CONF_FILE};
use quire_storage::CipherKey;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Runs the create command.
pub fn run(
    path: &Path,
    name: &str,
    versification: &Path,
    cipher_key: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let created = create(path, name, versification, cipher_key)?;
    if created {
        println!("Created module {name} at {}", path.display());
    } else {
        println!("Module already exists at {}", path.display());
    }
    Ok(())
}

/// Creates the module directory and writes its metadata if missing.
///
/// Returns false if the module already had metadata, which is left untouched.
pub fn create(
    path: &Path,
    name: &str,
    versification: &Path,
    cipher_key: Option<&str>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let v11n: Versification = serde_json::from_str(&fs::read_to_string(versification)?)?;
    let mut metadata = BookMetadata::new(name, path, v11n);
    if let Some(key) = cipher_key {
        metadata = metadata.with_cipher_key(CipherKey::from(key));
    }

    let backend = RawVerseBackend::new(metadata);
    backend.create()?;

    if path.join(MODULE_CONF_FILE).exists() {
        debug!(path = %path.display(), "module metadata already present");
        return Ok(false);
    }
    backend.metadata().save()?;
    info!(module = name, path = %path.display(), "module created");
    Ok(true)
}
