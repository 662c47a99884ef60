//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a new random ID.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Create from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a user account.
    UserId
);

string_id!(
    /// Unique identifier for a job posting.
    JobId
);

string_id!(
    /// Unique identifier for an application.
    ApplicationId
);

impl ApplicationId {
    /// Deterministic ID for the (job seeker, job) pair.
    ///
    /// Two applies for the same pair always target the same document, so a
    /// create-if-absent write is enough to enforce uniqueness.
    pub fn for_pair(job_seeker_id: &UserId, job_id: &JobId) -> Self {
        Self(format!("{}_{}", job_seeker_id.as_str(), job_id.as_str()))
    }
}
