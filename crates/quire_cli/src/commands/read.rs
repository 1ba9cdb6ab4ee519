//! Read command implementation.

use quire_core::{Backend, BackendConfig, BookMetadata, Key, RawContent, RawTextCollector, RawVerseBackend};
use std::path::Path;
use tracing::debug;

/// Runs the read command.
pub fn run(
    path: &Path,
    key: &str,
    headings: bool,
    trim: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = read(path, key, headings, trim)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&content)?);
        }
        _ => {
            print!("{}", render_text(&content));
        }
    }

    Ok(())
}

/// Reads the raw text of `key` from the module at `path`.
pub fn read(
    path: &Path,
    key: &str,
    headings: bool,
    trim: bool,
) -> Result<Vec<RawContent>, Box<dyn std::error::Error>> {
    let metadata = BookMetadata::load(path)?;
    let backend = RawVerseBackend::new(metadata).with_config(BackendConfig::new().trim_text(trim));
    let v11n = backend.metadata().versification().clone();
    debug!(module = backend.metadata().name(), path = %path.display(), "module opened");

    let key = Key::parse(&v11n, key)?;
    debug!(key = %key.name(&v11n), headings, trim, "reading");
    let mut hooks = RawTextCollector::new(v11n).with_headings(headings);
    Ok(backend.raw_text(&key, &mut hooks)?)
}

fn render_text(content: &[RawContent]) -> String {
    let mut out = String::new();
    for item in content {
        match item {
            RawContent::Heading { title } => {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&format!("== {title} ==\n"));
            }
            RawContent::Unit { key, text } => {
                out.push_str(&format!("{key}: {text}\n"));
            }
        }
    }
    out
}
