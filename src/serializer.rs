//! Serialization of the generated metadata to YAML or JSON.
//!
//! The output is the `{ controllers, referenceTypes }` model an OpenAPI emitter
//! consumes; producing the OpenAPI document itself is left to that emitter.

use crate::metadata::Metadata;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes metadata to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use openapi_from_decorators::metadata::Metadata;
/// use openapi_from_decorators::serializer::serialize_yaml;
///
/// let yaml = serialize_yaml(&Metadata::default()).unwrap();
/// assert!(yaml.contains("controllers: []"));
/// ```
pub fn serialize_yaml(metadata: &Metadata) -> Result<String> {
    debug!("Serializing metadata to YAML");
    serde_yaml::to_string(metadata).context("Failed to serialize metadata to YAML")
}

/// Serializes metadata to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(metadata: &Metadata) -> Result<String> {
    debug!("Serializing metadata to JSON");
    serde_json::to_string_pretty(metadata).context("Failed to serialize metadata to JSON")
}

/// Writes `content` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be written.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
