//! Image store abstraction.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::image::ImageUpload;

/// Public URL prefix under which locally stored images are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Backend that persists uploaded images and hands back a public URL.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the image under `key` and return the URL clients should use.
    async fn put(&self, key: &str, image: &ImageUpload) -> StorageResult<String>;

    /// Remove a previously stored image by its public URL.
    ///
    /// URLs that this store did not issue (defaults, external links) are ignored.
    async fn delete_url(&self, url: &str) -> StorageResult<()>;

    /// Cheap reachability check used by readiness.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
