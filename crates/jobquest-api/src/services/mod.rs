//! Business logic services.

pub mod admin;
pub mod applications;
pub mod identity;
pub mod jobs;
pub mod mailer;
pub mod profile;
pub mod resume;
pub mod stats;

use std::collections::{HashMap, HashSet};

use jobquest_firestore::{DataStore, JobStore, UserStore};
use jobquest_models::{Job, JobId, User, UserId};

use crate::error::ApiResult;

pub use admin::AdminService;
pub use applications::ApplicationService;
pub use identity::IdentityService;
pub use jobs::JobService;
pub use mailer::{HttpMailer, LogMailer, Mailer};
pub use profile::ProfileService;
pub use resume::ResumeService;
pub use stats::StatsService;

/// Fetch users by id, deduplicated. Missing ids are absent from the map.
pub(crate) async fn users_by_id(
    store: &dyn DataStore,
    ids: impl IntoIterator<Item = UserId>,
) -> ApiResult<HashMap<UserId, User>> {
    let ids: Vec<UserId> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = store.get_users(&ids).await?;
    Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
}

/// Fetch jobs by id, deduplicated. Missing ids are absent from the map.
pub(crate) async fn jobs_by_id(
    store: &dyn DataStore,
    ids: impl IntoIterator<Item = JobId>,
) -> ApiResult<HashMap<JobId, Job>> {
    let ids: Vec<JobId> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let jobs = store.get_jobs(&ids).await?;
    Ok(jobs.into_iter().map(|j| (j.id.clone(), j)).collect())
}
