//! Shared data models for the JobQuest backend.
//!
//! This crate provides Serde-serializable types for:
//! - Users with a role-specific profile (résumé or company)
//! - Job postings, experience levels and listing status
//! - Applications and their review status workflow
//! - Free-text salary parsing and job search composition
//! - Admin panel settings

pub mod application;
pub mod company;
pub mod error;
pub mod experience;
pub mod ids;
pub mod job;
pub mod job_status;
pub mod resume;
pub mod salary;
pub mod search;
pub mod settings;
pub mod user;

// Re-export common types
pub use application::{Application, ApplicationStatus, TransitionPolicy};
pub use company::{Company, CompanyStatus, DEFAULT_COMPANY_LOGO};
pub use error::{ModelError, ModelResult};
pub use experience::ExperienceLevel;
pub use ids::{ApplicationId, JobId, UserId};
pub use job::Job;
pub use job_status::JobStatus;
pub use resume::{Education, Experience, Resume};
pub use salary::{parse_salary, SalaryRange};
pub use search::{facets, Facets, JobListing, JobQuery, JobSearch, Pagination, SearchPage, SortOrder};
pub use settings::AdminSettings;
pub use user::{
    normalize_email, CandidateStatus, Profile, Role, User, DEFAULT_PROFILE_PICTURE,
};
