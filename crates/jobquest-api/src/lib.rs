//! Axum HTTP API server for the JobQuest job portal.
//!
//! This crate provides:
//! - Accounts for job seekers and recruiters with bearer-token auth
//! - Résumés, job postings with search, and the application workflow
//! - Homepage statistics and an admin panel
//! - Security headers, request ids and Prometheus metrics

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod form;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{HttpMailer, LogMailer, Mailer};
pub use state::AppState;
