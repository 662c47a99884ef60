//! Multipart form collection for signup and image uploads.

use std::collections::HashMap;

use axum::extract::Multipart;

use jobquest_storage::ImageUpload;

use crate::error::ApiResult;

/// A raw file part, validated on demand.
#[derive(Debug)]
struct FilePart {
    bytes: Vec<u8>,
    content_type: Option<String>,
    file_name: Option<String>,
}

/// Text fields and file parts of a submitted form.
///
/// File parts with no content are treated as absent, which is what browsers
/// send for an untouched file input.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

impl FormData {
    /// Drain the multipart stream.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    FilePart {
                        bytes: bytes.to_vec(),
                        content_type,
                        file_name,
                    },
                );
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Trimmed text value; blank values read as absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Untrimmed text value, for passwords.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Remove and validate the named image, if one was sent.
    pub fn take_image(&mut self, name: &str) -> ApiResult<Option<ImageUpload>> {
        match self.files.remove(name) {
            Some(part) => Ok(Some(ImageUpload::new(
                part.bytes,
                part.content_type.as_deref(),
                part.file_name.as_deref(),
            )?)),
            None => Ok(None),
        }
    }
}
