//! Image upload validation and key naming.

use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Maximum accepted image size (5 MB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Key prefix for profile pictures and company logos.
pub const PROFILE_PREFIX: &str = "profiles";

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    /// Resolve from a content type, falling back to the file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> StorageResult<Self> {
        if let Some(kind) = content_type.and_then(Self::from_content_type) {
            return Ok(kind);
        }
        if let Some(kind) = file_name
            .and_then(|n| n.rsplit_once('.'))
            .and_then(|(_, ext)| Self::from_extension(ext))
        {
            return Ok(kind);
        }
        Err(StorageError::UnsupportedType(
            content_type
                .or(file_name)
                .unwrap_or("unknown")
                .to_string(),
        ))
    }

    fn from_content_type(ct: &str) -> Option<Self> {
        match ct.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            "image/gif" => Some(ImageKind::Gif),
            "image/webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
        }
    }
}

/// A validated image ready to be stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validate type and size of an uploaded file.
    pub fn new(
        bytes: Vec<u8>,
        content_type: Option<&str>,
        file_name: Option<&str>,
    ) -> StorageResult<Self> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }
        let kind = ImageKind::detect(content_type, file_name)?;
        Ok(Self { kind, bytes })
    }

    /// Fresh object key for this image, e.g. `profiles/logo-<uuid>.png`.
    pub fn key(&self, label: &str) -> String {
        format!(
            "{}/{}-{}.{}",
            PROFILE_PREFIX,
            label,
            Uuid::new_v4(),
            self.kind.extension()
        )
    }
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
