//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use jobquest_models::TransitionPolicy;

/// Secret used when `JWT_SECRET` is unset outside production.
const DEV_JWT_SECRET: &str = "jobquest-dev-secret";

/// Which persistence backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

impl StoreBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "firestore" => Some(StoreBackend::Firestore),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// Outbound mail service settings. Absent means log-only delivery.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

/// Admin panel credentials.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Lifetime of user tokens
    pub token_ttl: Duration,
    /// How long a computed stats snapshot is served
    pub stats_cache_ttl: Duration,
    /// Directory served under `/uploads`
    pub uploads_dir: PathBuf,
    /// Page size when a search does not ask for one
    pub default_page_size: u32,
    /// Which application status changes recruiters may make
    pub transition_policy: TransitionPolicy,
    pub store_backend: StoreBackend,
    pub mail: Option<MailConfig>,
    pub admin: Option<AdminConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            stats_cache_ttl: Duration::from_secs(300),
            uploads_dir: PathBuf::from("uploads"),
            default_page_size: 10,
            transition_policy: TransitionPolicy::Permissive,
            store_backend: StoreBackend::Firestore,
            mail: None,
            admin: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// Fails only when production is missing a signing secret.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| defaults.environment.clone());
        let is_production = environment.to_lowercase() == "production";

        let jwt_secret = match env_non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if is_production => anyhow::bail!("JWT_SECRET must be set in production"),
            None => defaults.jwt_secret.clone(),
        };

        let mail = match (
            env_non_empty("MAIL_API_URL"),
            env_non_empty("MAIL_API_KEY"),
            env_non_empty("MAIL_FROM"),
        ) {
            (Some(api_url), Some(api_key), Some(from)) => Some(MailConfig {
                api_url,
                api_key,
                from,
            }),
            _ => None,
        };

        let admin = match (env_non_empty("ADMIN_EMAIL"), env_non_empty("ADMIN_PASSWORD_HASH")) {
            (Some(email), Some(password_hash)) => Some(AdminConfig {
                email: jobquest_models::normalize_email(&email),
                password_hash,
            }),
            _ => None,
        };

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| defaults.host.clone()),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment,
            jwt_secret,
            token_ttl: env_parse::<u64>("TOKEN_TTL_DAYS")
                .map(|days| Duration::from_secs(days * 24 * 60 * 60))
                .unwrap_or(defaults.token_ttl),
            stats_cache_ttl: env_parse("STATS_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.stats_cache_ttl),
            uploads_dir: env_non_empty("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            default_page_size: env_parse("DEFAULT_PAGE_SIZE").unwrap_or(defaults.default_page_size),
            transition_policy: env_parse("APPLICATION_TRANSITIONS")
                .unwrap_or(defaults.transition_policy),
            store_backend: std::env::var("STORE_BACKEND")
                .ok()
                .and_then(|s| StoreBackend::parse(&s))
                .unwrap_or(defaults.store_backend),
            mail,
            admin,
        })
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
