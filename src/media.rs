//! Product and donation images handed to the media store

use serde::Serialize;
use std::path::PathBuf;

use crate::error::{MarketError, Result};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Top-level folders uploads may land in.
pub const FOLDERS: [&str; 2] = ["products", "donations"];

pub fn validate_image(content_type: &str, size: usize) -> Result<()> {
    if !content_type.starts_with("image/") {
        return Err(MarketError::Validation("Please upload an image file (JPEG, PNG, WebP)".into()));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(MarketError::Validation("Please upload an image smaller than 5MB".into()));
    }
    Ok(())
}

/// Keeps ASCII letters, digits, dots, dashes and underscores; everything else becomes `-`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '-' })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '-').to_string();
    if cleaned.is_empty() { "image".into() } else { cleaned }
}

pub fn object_path(folder: &str, file_name: &str, millis: i64) -> String {
    format!("{folder}/{millis}-{}", sanitize_file_name(file_name))
}

#[derive(Clone, Debug, Serialize)]
pub struct StoredMedia {
    pub path: String,
    pub url: String,
    pub size: usize,
}

/// Writes uploads under a directory that is served back at `base_url`.
#[derive(Clone, Debug)]
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self { root: root.into(), base_url: base_url.into() }
    }

    pub fn root(&self) -> &PathBuf { &self.root }

    pub fn public_url(&self, path: &str) -> String { format!("{}/{}", self.base_url.trim_end_matches('/'), path) }

    pub async fn put(&self, folder: Option<&str>, file_name: &str, content_type: &str, bytes: &[u8]) -> Result<StoredMedia> {
        validate_image(content_type, bytes.len())?;
        let folder = folder.filter(|f| !f.is_empty()).unwrap_or(FOLDERS[0]);
        if !FOLDERS.contains(&folder) {
            return Err(MarketError::Validation(format!("Unknown upload folder '{folder}'")));
        }
        let path = object_path(folder, file_name, chrono::Utc::now().timestamp_millis());
        let target = self.root.join(&path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| MarketError::Media(e.to_string()))?;
        }
        tokio::fs::write(&target, bytes).await.map_err(|e| MarketError::Media(e.to_string()))?;
        tracing::info!(%path, size = bytes.len(), "stored upload");
        Ok(StoredMedia { url: self.public_url(&path), path, size: bytes.len() })
    }
}
