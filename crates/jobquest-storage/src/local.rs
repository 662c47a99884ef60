//! Local filesystem image store.
//!
//! Files live under a root directory and are served by the API at
//! `/uploads/<key>`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::image::{validate_key, ImageUpload};
use crate::store::{ImageStore, PUBLIC_PREFIX};

/// Default images shipped with the frontend are never deleted.
const DEFAULT_IMAGE_PREFIX: &str = "default-";

/// Image store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory served under the public prefix.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn public_url(key: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, key)
    }

    fn key_from_url(url: &str) -> Option<&str> {
        let key = url.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        let file = key.rsplit('/').next().unwrap_or(key);
        if file.starts_with(DEFAULT_IMAGE_PREFIX) {
            return None;
        }
        Some(key)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, image: &ImageUpload) -> StorageResult<String> {
        let path = self.path_for(key)?;
        debug!("Writing {} bytes to {}", image.bytes.len(), path.display());

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &image.bytes)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", path.display(), e)))?;

        info!("Stored image {}", key);
        Ok(Self::public_url(key))
    }

    async fn delete_url(&self, url: &str) -> StorageResult<()> {
        let Some(key) = Self::key_from_url(url) else {
            return Ok(());
        };
        let path = self.path_for(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted image {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::delete_failed(format!("{}: {}", path.display(), e))),
        }
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> ImageUpload {
        ImageUpload::new(vec![137, 80, 78, 71], Some("image/png"), None).unwrap()
    }

    #[tokio::test]
    async fn test_put_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());

        let url = store.put("profiles/a.png", &png()).await.unwrap();

        assert_eq!(url, "/uploads/profiles/a.png");
        let written = tokio::fs::read(dir.path().join("profiles/a.png")).await.unwrap();
        assert_eq!(written, vec![137, 80, 78, 71]);
    }

    #[tokio::test]
    async fn test_delete_url_is_idempotent_and_skips_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());
        let url = store.put("profiles/b.png", &png()).await.unwrap();

        store.delete_url(&url).await.unwrap();
        assert!(!dir.path().join("profiles/b.png").exists());
        store.delete_url(&url).await.unwrap();

        let default = store.put("profiles/default-profile.jpg", &png()).await.unwrap();
        store.delete_url(&default).await.unwrap();
        assert!(dir.path().join("profiles/default-profile.jpg").exists());

        store.delete_url("https://cdn.example.com/x.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_put_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path());
        assert!(matches!(
            store.put("../escape.png", &png()).await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
