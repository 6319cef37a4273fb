//! Sidecar descriptors stored next to model files.
//!
//! Model managers commonly write `{model}.json` beside `{model}.safetensors`
//! with user-facing notes, including an "activation text" prompt fragment.

use std::fs;
use std::path::{Path, PathBuf};

const ACTIVATION_TEXT_KEY: &str = "activation text";

/// Returns the descriptor path for a model file.
pub fn descriptor_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("json")
}

/// Reads the activation text for a model, or `""` if there is none.
///
/// The text is returned as written. A missing descriptor is silent. An
/// unreadable or malformed descriptor is logged and treated as empty.
pub fn activation_text(model_path: &Path) -> String {
    let path = descriptor_path(model_path);
    if !path.is_file() {
        return String::new();
    }

    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read descriptor");
            return String::new();
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid descriptor JSON");
            return String::new();
        }
    };

    value
        .get(ACTIVATION_TEXT_KEY)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}
