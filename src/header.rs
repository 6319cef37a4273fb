//! Reader for the JSON header of `.safetensors` files.
//!
//! A safetensors file starts with an 8-byte little-endian length followed by
//! that many bytes of JSON describing the tensors. Trainers store free-form
//! string metadata under the `__metadata__` key of that JSON object. Only the
//! header is read; tensor data is never touched.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

/// Largest header accepted, matching the limit of the reference loader.
pub const MAX_HEADER_SIZE: u64 = 100_000_000;

const METADATA_KEY: &str = "__metadata__";

/// String metadata embedded in a model header.
pub type Metadata = BTreeMap<String, String>;

/// Errors that can occur while reading a safetensors header.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File ends before the 8-byte length prefix.
    #[error("file too short to contain a header")]
    TooShort,

    #[error("header length {len} exceeds limit of {max} bytes", max = MAX_HEADER_SIZE)]
    TooLarge { len: u64 },

    /// Declared header runs past the end of the file.
    #[error("header length {len} exceeds file size {file_len}")]
    Truncated { len: u64, file_len: u64 },

    #[error("invalid header JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("header is not a JSON object")]
    NotAnObject,

    #[error("__metadata__ is not a JSON object")]
    InvalidMetadata,
}

/// Reads the `__metadata__` map from a safetensors file.
///
/// Returns `Ok(None)` when the header carries no metadata at all. Values that
/// are not JSON strings are kept as their JSON text.
///
/// # Errors
///
/// Returns `HeaderError` if the file cannot be read or the header is malformed.
pub fn read_metadata(path: &Path) -> Result<Option<Metadata>, HeaderError> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let mut len_bytes = [0u8; 8];
    file.read_exact(&mut len_bytes).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => HeaderError::TooShort,
        _ => HeaderError::Io(e),
    })?;
    let len = u64::from_le_bytes(len_bytes);

    if len > MAX_HEADER_SIZE {
        return Err(HeaderError::TooLarge { len });
    }
    if len > file_len.saturating_sub(8) {
        return Err(HeaderError::Truncated { len, file_len });
    }

    // Bounded by MAX_HEADER_SIZE above, so the cast cannot truncate.
    let mut header = vec![0u8; len as usize];
    file.read_exact(&mut header)?;

    parse_header(&header)
}

/// Extracts metadata from raw header bytes.
pub fn parse_header(bytes: &[u8]) -> Result<Option<Metadata>, HeaderError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let obj = value.as_object().ok_or(HeaderError::NotAnObject)?;

    let Some(raw) = obj.get(METADATA_KEY) else {
        return Ok(None);
    };
    let raw = raw.as_object().ok_or(HeaderError::InvalidMetadata)?;

    let metadata = raw
        .iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect();

    Ok(Some(metadata))
}
