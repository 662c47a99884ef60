//! Request handlers.

pub mod admin;
pub mod applications;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod recruiters;
pub mod resume;
pub mod stats;

pub use admin::*;
pub use applications::*;
pub use auth::*;
pub use health::*;
pub use jobs::*;
pub use recruiters::*;
pub use resume::*;
pub use stats::*;

use crate::error::{ApiError, ApiResult};
use crate::security::is_valid_id;

/// Reject malformed document ids taken from the URL path.
pub(crate) fn checked_id<'a>(raw: &'a str, what: &str) -> ApiResult<&'a str> {
    if is_valid_id(raw) {
        Ok(raw)
    } else {
        Err(ApiError::bad_request(format!("Invalid {} ID format", what)))
    }
}
