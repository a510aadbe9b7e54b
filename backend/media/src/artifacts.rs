//! Intermediate artifacts: sticker crops and validated JSON results.
//!
//! Files are keyed only by the 1-based region index, so concurrent requests
//! share and may overwrite them. They are diagnostics, not part of any
//! response.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    stickers_dir: PathBuf,
    results_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(stickers_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            stickers_dir: stickers_dir.into(),
            results_dir: results_dir.into(),
        }
    }

    pub fn stickers_dir(&self) -> &Path {
        &self.stickers_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Create both output directories.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.stickers_dir, &self.results_dir] {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn sticker_path(&self, region: usize) -> PathBuf {
        self.stickers_dir.join(format!("sticker_{region}.png"))
    }

    pub fn result_path(&self, region: usize) -> PathBuf {
        self.results_dir.join(format!("result_{region}.json"))
    }

    /// Store the PNG crop of `region`.
    pub async fn write_sticker(&self, region: usize, png: &[u8]) -> Result<PathBuf> {
        let path = self.sticker_path(region);
        fs::write(&path, png)
            .await
            .with_context(|| format!("Failed to write sticker: {}", path.display()))?;
        debug!(path = %path.display(), "Sticker saved");
        Ok(path)
    }

    /// Store a validated result for `region` as pretty-printed JSON.
    pub async fn write_result<T: Serialize>(&self, region: usize, result: &T) -> Result<PathBuf> {
        let path = self.result_path(region);
        let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
        fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write result: {}", path.display()))?;
        debug!(path = %path.display(), "Result saved");
        Ok(path)
    }
}
