//! Model error types.

use thiserror::Error;

/// Result type for model parsing.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when decoding enumerated or free-form model fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Invalid application status: {0}")]
    InvalidApplicationStatus(String),

    #[error("Invalid experience level: {0}")]
    InvalidExperience(String),

    #[error("Invalid job status: {0}")]
    InvalidJobStatus(String),

    #[error("Invalid company status: {0}")]
    InvalidCompanyStatus(String),

    #[error("Invalid candidate status: {0}")]
    InvalidCandidateStatus(String),
}
