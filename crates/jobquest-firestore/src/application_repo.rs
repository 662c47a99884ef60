//! Application documents.
//!
//! Ids are `{seeker}_{job}`, so the create-if-absent insert is what keeps a
//! seeker to one application per job.

use tracing::info;

use jobquest_models::{Application, ApplicationId};

use crate::client::FirestoreClient;
use crate::codec::{application_to_fields, document_to_application};
use crate::error::FirestoreResult;
use crate::store::ApplicationFilter;
use crate::types::{StructuredQuery, ToFirestoreValue, Write};

const APPLICATIONS: &str = "applications";

/// Repository for applications.
#[derive(Clone)]
pub struct ApplicationRepository {
    client: FirestoreClient,
}

impl ApplicationRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Insert. `AlreadyExists` if this seeker already applied to this job.
    pub async fn create(&self, application: &Application) -> FirestoreResult<()> {
        self.client
            .create_document(
                APPLICATIONS,
                application.id.as_str(),
                application_to_fields(application),
            )
            .await?;
        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            "Created application"
        );
        Ok(())
    }

    /// A delete of this application, for committing alongside other writes.
    pub fn delete_write(&self, id: &ApplicationId) -> Write {
        Write::delete(self.client.full_document_name(APPLICATIONS, id.as_str()))
    }

    pub async fn get(&self, id: &ApplicationId) -> FirestoreResult<Option<Application>> {
        self.client
            .get_document(APPLICATIONS, id.as_str())
            .await?
            .map(|doc| document_to_application(&doc))
            .transpose()
    }

    pub async fn update(&self, application: &Application) -> FirestoreResult<()> {
        self.client
            .update_document(
                APPLICATIONS,
                application.id.as_str(),
                application_to_fields(application),
                None,
            )
            .await?;
        Ok(())
    }

    /// Newest first.
    pub async fn list(&self, filter: &ApplicationFilter) -> FirestoreResult<Vec<Application>> {
        let field = match filter {
            ApplicationFilter::All => None,
            ApplicationFilter::BySeeker(id) => Some(("job_seeker_id", id.as_str())),
            ApplicationFilter::ByRecruiter(id) => Some(("recruiter_id", id.as_str())),
            ApplicationFilter::ByJob(id) => Some(("job_id", id.as_str())),
        };

        let mut query = StructuredQuery::collection(APPLICATIONS);
        if let Some((path, value)) = field {
            query = query.where_eq(path, value.to_firestore_value());
        }
        let documents = self.client.run_query(None, query).await?;

        let mut applications = documents
            .iter()
            .map(document_to_application)
            .collect::<FirestoreResult<Vec<_>>>()?;
        // Sorted in process so equality filters need no composite index.
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(applications)
    }
}
