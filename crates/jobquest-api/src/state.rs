//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use jobquest_firestore::{DataStore, FirestoreStore, MemoryStore};
use jobquest_storage::{ImageStore, LocalImageStore, R2ImageStore};

use crate::auth::TokenIssuer;
use crate::cache::TtlCache;
use crate::config::{ApiConfig, StoreBackend};
use crate::services::{
    AdminService, ApplicationService, HttpMailer, IdentityService, JobService, LogMailer, Mailer,
    ProfileService, ResumeService, StatsService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn DataStore>,
    pub images: Arc<dyn ImageStore>,
    pub tokens: TokenIssuer,
    pub identity: IdentityService,
    pub profiles: ProfileService,
    pub resumes: ResumeService,
    pub jobs: JobService,
    pub applications: ApplicationService,
    pub stats: StatsService,
    pub admin: AdminService,
}

impl AppState {
    /// Create application state from configuration, connecting to the
    /// configured backends.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn DataStore> = match config.store_backend {
            StoreBackend::Firestore => Arc::new(
                FirestoreStore::from_env()
                    .await
                    .context("Failed to connect to Firestore")?,
            ),
            StoreBackend::Memory => {
                warn!("Using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let images: Arc<dyn ImageStore> = if std::env::var("R2_BUCKET_NAME").is_ok() {
            Arc::new(R2ImageStore::from_env().context("Invalid R2 configuration")?)
        } else {
            Arc::new(LocalImageStore::new(config.uploads_dir.clone()))
        };

        let mailer: Arc<dyn Mailer> = match &config.mail {
            Some(mail) => Arc::new(HttpMailer::new(mail.clone())?),
            None => {
                warn!("MAIL_API_URL not set; emails will only be logged");
                Arc::new(LogMailer)
            }
        };

        info!(store = store.backend(), "Backends initialized");
        Ok(Self::from_parts(config, store, images, mailer))
    }

    /// Assemble state around already-built backends.
    pub fn from_parts(
        config: ApiConfig,
        store: Arc<dyn DataStore>,
        images: Arc<dyn ImageStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl);
        let jobs = JobService::new(Arc::clone(&store), config.default_page_size);

        Self {
            identity: IdentityService::new(
                Arc::clone(&store),
                Arc::clone(&images),
                mailer,
                tokens.clone(),
                config.admin.clone(),
            ),
            profiles: ProfileService::new(Arc::clone(&store), Arc::clone(&images), jobs.clone()),
            resumes: ResumeService::new(Arc::clone(&store)),
            applications: ApplicationService::new(Arc::clone(&store), config.transition_policy),
            stats: StatsService::new(
                Arc::clone(&store),
                Arc::new(TtlCache::new(config.stats_cache_ttl)),
            ),
            admin: AdminService::new(Arc::clone(&store), jobs.clone(), config.admin.clone()),
            jobs,
            tokens,
            store,
            images,
            config,
        }
    }
}
