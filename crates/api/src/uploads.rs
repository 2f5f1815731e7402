//! Image uploads attached to posts.
//!
//! Files are written under the configured upload directory with a random
//! prefix, so two uploads with the same original name never collide and a
//! crafted name cannot escape the directory.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors produced while persisting an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory-backed receiver for uploaded images.
#[derive(Clone, Debug)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist.
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Write one image and return the stored path.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let file_name = format!("{}-{}", Uuid::new_v4().simple(), sanitize(original_name));
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "image stored");
        Ok(path.to_string_lossy().into_owned())
    }

    /// Delete previously stored images. Failures are logged and skipped; a
    /// path outside the upload directory is never touched.
    pub async fn remove(&self, paths: &[String]) {
        for path in paths.iter().map(Path::new) {
            if !path.starts_with(&self.dir) {
                warn!(path = %path.display(), "refusing to delete file outside upload directory");
                continue;
            }
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "image removed"),
                Err(e) => warn!(path = %path.display(), error = %e, "image not removed"),
            }
        }
    }
}

/// Keep ASCII alphanumerics, `.`, `-`, `_`; replace everything else. Leading
/// dots are stripped so the result is never hidden or a parent reference.
fn sanitize(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "image".into()
    } else {
        trimmed.into()
    }
}
