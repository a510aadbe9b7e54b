//! Persisting uploaded originals.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::fs;
use tracing::info;

/// Reduce a client-supplied file name to a safe single path component.
///
/// Keeps ASCII letters, digits, `.`, `_` and `-`; whitespace becomes `_`;
/// any directory part is dropped and leading dots/underscores are stripped.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// File name an upload is stored under: `<unix-seconds>_<sanitized name>`.
pub fn upload_file_name(original: &str, unix_seconds: i64) -> String {
    let safe = sanitize_filename(original);
    if safe.is_empty() {
        format!("{unix_seconds}_upload")
    } else {
        format!("{unix_seconds}_{safe}")
    }
}

/// Write an upload into `dir` and return the stored path.
pub async fn save_upload(dir: &Path, original_name: &str, data: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create upload directory: {}", dir.display()))?;

    let path = dir.join(upload_file_name(original_name, Utc::now().timestamp()));
    fs::write(&path, data)
        .await
        .with_context(|| format!("Failed to save upload: {}", path.display()))?;

    info!(path = %path.display(), bytes = data.len(), "File saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories_and_specials() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(r"C:\photos\my sticker (1).png"), "my_sticker_1.png");
        assert_eq!(sanitize_filename(".hidden.jpg"), "hidden.jpg");
    }

    #[test]
    fn prefixes_timestamp() {
        assert_eq!(upload_file_name("sticker.png", 1700000000), "1700000000_sticker.png");
        assert_eq!(upload_file_name("../", 5), "5_upload");
    }

    #[tokio::test]
    async fn saves_bytes_under_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_upload(&dir.path().join("uploads"), "a b.png", b"png").await.unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with("_a_b.png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png");
    }
}
