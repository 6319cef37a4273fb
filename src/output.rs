//! Naming and writing of the wildcard output file.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use time::macros::format_description;

/// Builds a short token from the last two components of `dir`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use lora_wildcard::output::path_token;
///
/// assert_eq!(path_token(Path::new("/models/lora/style")), "lora_style");
/// assert_eq!(path_token(Path::new("style")), "style");
/// assert_eq!(path_token(Path::new("/")), "");
/// ```
pub fn path_token(dir: &Path) -> String {
    let parts: Vec<_> = dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    let start = parts.len().saturating_sub(2);
    parts[start..].join("_")
}

/// Formats a timestamp as `YYYYmmdd_HHMMSS`.
pub fn format_timestamp(at: OffsetDateTime) -> Result<String> {
    at.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))
    .context("Failed to format timestamp")
}

/// Current local time as `YYYYmmdd_HHMMSS`, falling back to UTC when the
/// local offset is unavailable.
pub fn timestamp() -> Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_timestamp(now)
}

/// Output file name for a scanned directory: `{token}_{timestamp}.txt`.
pub fn output_file_name(dir: &Path, timestamp: &str) -> String {
    format!("{}_{}.txt", path_token(dir), timestamp)
}

/// Writes `lines` joined by `\n` to `path`, replacing it atomically.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written or
/// moved into place.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut file = NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    file.write_all(lines.join("\n").as_bytes())
        .context("Failed to write output")?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn path_token_uses_last_two_components() {
        assert_eq!(path_token(Path::new("a/b/c/d")), "c_d");
        assert_eq!(path_token(Path::new("./loras/anime")), "loras_anime");
        assert_eq!(path_token(Path::new("C")), "C");
        assert_eq!(path_token(Path::new("")), "");
    }

    #[test]
    fn timestamp_is_zero_padded() {
        let ts = format_timestamp(datetime!(2024-03-07 09:05:01 UTC)).unwrap();
        assert_eq!(ts, "20240307_090501");
    }

    #[test]
    fn timestamp_has_expected_shape() {
        let ts = timestamp().unwrap();
        assert_eq!(ts.len(), 15);
        assert_eq!(ts.as_bytes()[8], b'_');
        assert!(ts.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn output_file_name_combines_token_and_timestamp() {
        assert_eq!(
            output_file_name(Path::new("/data/lora/chars"), "20240101_000000"),
            "lora_chars_20240101_000000.txt"
        );
    }

    #[test]
    fn write_lines_joins_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        write_lines(&path, &["one".to_string(), "two".to_string()]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo");
    }

    #[test]
    fn write_lines_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old content that is longer").unwrap();

        write_lines(&path, &["new".to_string()]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn write_lines_empty_input_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");

        write_lines(&path, &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
