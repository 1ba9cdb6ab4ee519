//! Module metadata and backend configuration.
//!
//! A module directory carries its metadata in `module.json`:
//!
//! ```text
//! <module>/
//! ├─ module.json   # name, encoding, optional cipher key, versification
//! ├─ text.idx      # verse index
//! └─ text.dat      # verse data
//! ```

use crate::decompose::Restriction;
use crate::error::{CoreError, CoreResult};
use crate::versification::Versification;
use quire_storage::CipherKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the module metadata inside a module directory.
pub const MODULE_CONF_FILE: &str = "module.json";

/// Character encoding of stored text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// UTF-8; invalid sequences are replaced.
    #[default]
    Utf8,
    /// ISO-8859-1.
    Latin1,
}

impl Encoding {
    /// Decodes stored bytes to text.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|b| char::from(*b)).collect(),
        }
    }
}

/// Immutable metadata of one module.
#[derive(Debug, Clone)]
pub struct BookMetadata {
    name: String,
    data_path: PathBuf,
    cipher_key: Option<CipherKey>,
    encoding: Encoding,
    versification: Arc<Versification>,
}

impl BookMetadata {
    /// Creates metadata for an unenciphered UTF-8 module.
    pub fn new(
        name: impl Into<String>,
        data_path: impl Into<PathBuf>,
        versification: impl Into<Arc<Versification>>,
    ) -> Self {
        Self {
            name: name.into(),
            data_path: data_path.into(),
            cipher_key: None,
            encoding: Encoding::default(),
            versification: versification.into(),
        }
    }

    /// Sets the cipher key. An empty key marks the module as locked, but the
    /// cipher stays engaged.
    #[must_use]
    pub fn with_cipher_key(mut self, key: CipherKey) -> Self {
        self.cipher_key = Some(key);
        self
    }

    /// Sets the text encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the directory holding the module files.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Returns the key to decipher with, if the module is enciphered.
    ///
    /// An empty key is still a key: the cipher runs in its hash-initialized
    /// state.
    #[must_use]
    pub fn cipher_key(&self) -> Option<&CipherKey> {
        self.cipher_key.as_ref()
    }

    /// Returns true if the module declares a cipher key, even an empty one.
    #[must_use]
    pub fn is_enciphered(&self) -> bool {
        self.cipher_key.is_some()
    }

    /// Returns true if the module is enciphered with an empty key.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.cipher_key.as_ref().is_some_and(CipherKey::is_empty)
    }

    /// Returns the text encoding.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the versification keys are resolved against.
    #[must_use]
    pub fn versification(&self) -> &Arc<Versification> {
        &self.versification
    }

    /// Loads metadata from `dir/module.json`; the data path is `dir`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `InvalidMetadata` if it
    /// cannot be parsed.
    pub fn load(dir: &Path) -> CoreResult<Self> {
        let text = fs::read_to_string(dir.join(MODULE_CONF_FILE))?;
        let conf: ModuleConf = serde_json::from_str(&text)
            .map_err(|e| CoreError::invalid_metadata(e.to_string()))?;

        let mut metadata = Self::new(conf.name, dir, conf.versification)
            .with_encoding(conf.encoding);
        if let Some(key) = conf.cipher_key {
            metadata = metadata.with_cipher_key(CipherKey::new(key));
        }
        Ok(metadata)
    }

    /// Writes `module.json` into the data path, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory or file cannot be written.
    pub fn save(&self) -> CoreResult<()> {
        let conf = ModuleConf {
            name: self.name.clone(),
            encoding: self.encoding,
            cipher_key: self
                .cipher_key
                .as_ref()
                .map(|key| String::from_utf8_lossy(key.as_bytes()).into_owned()),
            versification: (*self.versification).clone(),
        };
        let text = serde_json::to_string_pretty(&conf)
            .map_err(|e| CoreError::invalid_metadata(e.to_string()))?;

        fs::create_dir_all(&self.data_path)?;
        fs::write(self.data_path.join(MODULE_CONF_FILE), text)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct ModuleConf {
    name: String,
    #[serde(default)]
    encoding: Encoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cipher_key: Option<String>,
    versification: Versification,
}

/// Options controlling how a backend extracts text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendConfig {
    /// Boundary at which keys are cut into sub-ranges.
    pub restriction: Restriction,

    /// Whether surrounding whitespace is trimmed from unit text.
    pub trim_text: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            restriction: Restriction::Chapter,
            trim_text: false,
        }
    }
}

impl BackendConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sub-range boundary.
    #[must_use]
    pub const fn restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = restriction;
        self
    }

    /// Sets whether unit text is trimmed.
    #[must_use]
    pub const fn trim_text(mut self, value: bool) -> Self {
        self.trim_text = value;
        self
    }
}
