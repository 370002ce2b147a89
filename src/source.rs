//! Document sources
//!
//! Parse JSON or YAML text into the untyped mapping the binder consumes.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::BindError;
use crate::options::BindOptions;
use crate::record::{bind_with, Record};

/// Text format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Format for a file extension (`.json`, `.yaml`, `.yml`)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Format::Json)
        } else if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Some(Format::Yaml)
        } else {
            None
        }
    }
}

pub fn parse_json(text: &str) -> Result<Value, BindError> {
    Ok(serde_json::from_str(text)?)
}

pub fn parse_yaml(text: &str) -> Result<Value, BindError> {
    Ok(serde_yaml::from_str(text)?)
}

pub fn parse_document(text: &str, format: Format) -> Result<Value, BindError> {
    match format {
        Format::Json => parse_json(text),
        Format::Yaml => parse_yaml(text),
    }
}

/// Read and parse a document file
///
/// Files without a known extension are read as YAML, which also accepts JSON.
pub fn load_document(path: &Path) -> Result<Value, BindError> {
    let format = Format::from_path(path).unwrap_or(Format::Yaml);
    let text = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), ?format, bytes = text.len(), "document read");
    parse_document(&text, format)
}

/// Parse a document and bind it into `R`
pub fn bind_document<R: Record>(
    text: &str,
    format: Format,
    options: &BindOptions,
) -> Result<R, BindError> {
    let value = parse_document(text, format)?;
    bind_with(&value, options)
}
