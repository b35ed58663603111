//! Local storage for uploaded branding assets
//!
//! Files live under `<uploads>/branding` and are served back to clients
//! through the `/static` URL prefix.

use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info, warn};

use error_common::ClinicError;

/// URL prefix under which the uploads directory is served
pub const STATIC_PREFIX: &str = "/static/";
/// Upper bound for a single branding image
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const BRANDING_DIR: &str = "branding";
const ALLOWED_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unsupported file type")]
    UnsupportedType,

    #[error("file is empty")]
    Empty,

    #[error("file exceeds 5 MiB")]
    TooLarge,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ClinicError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => ClinicError::internal("store file", e),
            other => ClinicError::invalid_request("upload", other),
        }
    }
}

/// Lowercased extension with its dot, if it is an accepted image type
pub fn image_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    let ext = format!(".{ext}");
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Filesystem-backed branding store
#[derive(Debug, Clone)]
pub struct BrandingStorage {
    uploads_dir: PathBuf,
}

impl BrandingStorage {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Persist an image and return its public `/static/branding/...` URL
    pub async fn save_image(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let ext = image_extension(file_name).ok_or(StorageError::UnsupportedType)?;
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::TooLarge);
        }

        let dir = self.uploads_dir.join(BRANDING_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let name = format!("{nanos}{ext}");
        tokio::fs::write(dir.join(&name), bytes).await?;

        info!(file = %name, size = bytes.len(), "Stored branding image");
        Ok(format!("{STATIC_PREFIX}{BRANDING_DIR}/{name}"))
    }

    /// Map a `/static/...` URL onto the uploads directory.
    ///
    /// Anything outside the prefix, or any path that would escape the
    /// uploads directory, yields `None`.
    pub fn local_path(&self, url: &str) -> Option<PathBuf> {
        let rel = url.trim().strip_prefix(STATIC_PREFIX)?;
        if rel.is_empty() {
            return None;
        }
        let rel = Path::new(rel);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.uploads_dir.join(rel))
    }

    /// Best-effort removal of a previously stored asset
    pub async fn remove(&self, url: &str) {
        let Some(path) = self.local_path(url) else {
            debug!(url, "Skipping removal of non-local asset");
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(path = %path.display(), "Removed replaced branding asset"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove branding asset"),
        }
    }
}
