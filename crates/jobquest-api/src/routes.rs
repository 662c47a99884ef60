//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::admin::{
    admin_candidates, admin_companies, admin_dashboard, admin_delete_company, admin_delete_job,
    admin_jobs, admin_login, admin_set_candidate_status, admin_set_company_status,
    admin_set_job_status, admin_settings, admin_update_company, admin_update_job,
    admin_update_settings,
};
use crate::handlers::applications::{
    apply_for_job, my_applications, recruiter_applications, update_application_status,
};
use crate::handlers::auth::{
    change_password, forgot_password, get_profile, get_saved_jobs, login, remove_saved_job,
    save_job, signup, update_profile, upload_company_logo, upload_profile_picture,
};
use crate::handlers::jobs::{
    create_job, get_job, job_filters, list_jobs, recruiter_jobs, top_companies, update_job,
};
use crate::handlers::recruiters::{job_seekers, recruiter_profile};
use crate::handlers::resume::{get_resume, save_resume};
use crate::handlers::stats::home_stats;
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;
use jobquest_storage::PUBLIC_PREFIX;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_routes = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/password", put(change_password))
        .route("/auth/profile", get(get_profile).put(update_profile))
        .route("/auth/profile-picture", put(upload_profile_picture))
        .route("/auth/company-logo", put(upload_company_logo))
        .route("/auth/saved-jobs", get(get_saved_jobs).post(save_job))
        .route("/auth/saved-jobs/:job_id", delete(remove_saved_job));

    let resume_routes = Router::new().route("/resume", get(get_resume).post(save_resume));

    // Static segments take priority over `/jobs/:id`
    let job_routes = Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/filters", get(job_filters))
        .route("/jobs/top-companies", get(top_companies))
        .route("/jobs/recruiter-jobs", get(recruiter_jobs))
        .route("/jobs/:id", get(get_job).patch(update_job));

    let application_routes = Router::new()
        .route("/applications/apply/:job_id", post(apply_for_job))
        .route("/applications/my-applications", get(my_applications))
        .route("/applications/recruiter-applications", get(recruiter_applications))
        .route(
            "/applications/status/:application_id",
            patch(update_application_status),
        );

    let recruiter_routes = Router::new()
        .route("/recruiters/job-seekers", get(job_seekers))
        .route("/recruiters/profile/:id", get(recruiter_profile));

    let admin_routes = Router::new()
        .route("/admin/login", post(admin_login))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/admin/companies", get(admin_companies))
        .route(
            "/admin/companies/:id",
            put(admin_update_company).delete(admin_delete_company),
        )
        .route("/admin/companies/:id/status", patch(admin_set_company_status))
        .route("/admin/jobs", get(admin_jobs))
        .route("/admin/jobs/:id", put(admin_update_job).delete(admin_delete_job))
        .route("/admin/jobs/:id/status", patch(admin_set_job_status))
        .route("/admin/candidates", get(admin_candidates))
        .route("/admin/candidates/:id/status", patch(admin_set_candidate_status))
        .route("/admin/settings", get(admin_settings).put(admin_update_settings));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(resume_routes)
        .merge(job_routes)
        .merge(application_routes)
        .merge(recruiter_routes)
        .merge(admin_routes)
        .route("/stats", get(home_stats))
        // Multipart uploads are bounded by the outer body limit instead
        .layer(DefaultBodyLimit::max(state.config.max_body_size));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(&state.config.uploads_dir))
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
