//! Persistence for the JobQuest backend.
//!
//! This crate provides:
//! - Storage traits ([`UserStore`], [`ResumeStore`], [`JobStore`],
//!   [`ApplicationStore`], [`SettingsStore`]) combined as [`DataStore`]
//! - A Firestore REST client with token caching, retry and metrics
//! - Firestore repositories with an email index and atomic dual writes
//! - An in-memory store with the same uniqueness rules

pub mod application_repo;
pub mod client;
mod codec;
pub mod error;
pub mod firestore_store;
pub mod job_repo;
pub mod memory;
pub mod metrics;
pub mod retry;
pub mod settings_repo;
pub mod store;
pub mod token_cache;
pub mod types;
pub mod user_repo;

#[cfg(test)]
mod client_tests;

pub use application_repo::ApplicationRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use firestore_store::FirestoreStore;
pub use job_repo::JobRepository;
pub use memory::MemoryStore;
pub use settings_repo::SettingsRepository;
pub use store::{
    ApplicationFilter, ApplicationStore, DataStore, JobStore, ResumeStore, SettingsStore,
    StoreError, StoreResult, UserStore,
};
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
pub use user_repo::UserRepository;
