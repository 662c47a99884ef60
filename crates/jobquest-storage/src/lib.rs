//! Image storage for profile pictures and company logos.
//!
//! This crate provides:
//! - Upload validation (jpeg/png/gif/webp, 5 MB limit)
//! - A local directory store served under `/uploads`
//! - A Cloudflare R2 store for deployments with a CDN

pub mod client;
pub mod error;
pub mod image;
pub mod local;
pub mod store;

pub use client::{R2Config, R2ImageStore};
pub use error::{StorageError, StorageResult};
pub use image::{ImageKind, ImageUpload, MAX_IMAGE_BYTES};
pub use local::LocalImageStore;
pub use store::{ImageStore, PUBLIC_PREFIX};
