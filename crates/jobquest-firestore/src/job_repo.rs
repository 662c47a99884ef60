//! Job posting documents.

use chrono::{DateTime, Utc};
use tracing::info;

use jobquest_models::{Job, JobId, JobStatus, UserId};

use crate::client::FirestoreClient;
use crate::codec::{document_to_job, job_status_fields, job_to_fields};
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Direction, Document, Precondition, StructuredQuery, ToFirestoreValue, Write};

const JOBS: &str = "jobs";

/// Repository for job postings.
#[derive(Clone)]
pub struct JobRepository {
    client: FirestoreClient,
}

impl JobRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, job: &Job) -> FirestoreResult<()> {
        self.client
            .create_document(JOBS, job.id.as_str(), job_to_fields(job))
            .await?;
        info!(job_id = %job.id, recruiter_id = %job.recruiter_id, "Created job");
        Ok(())
    }

    pub async fn get(&self, job_id: &JobId) -> FirestoreResult<Option<Job>> {
        self.client
            .get_document(JOBS, job_id.as_str())
            .await?
            .map(|doc| document_to_job(&doc))
            .transpose()
    }

    pub async fn update(&self, job: &Job) -> FirestoreResult<()> {
        self.client
            .update_document(JOBS, job.id.as_str(), job_to_fields(job), None)
            .await?;
        Ok(())
    }

    pub async fn list(&self, status: Option<JobStatus>) -> FirestoreResult<Vec<Job>> {
        let documents = match status {
            Some(status) => {
                let query = StructuredQuery::collection(JOBS)
                    .where_eq("status", status.as_str().to_firestore_value());
                self.client.run_query(None, query).await?
            }
            None => self.client.list_all_documents(JOBS).await?,
        };
        documents.iter().map(document_to_job).collect()
    }

    pub async fn list_by_recruiter(&self, recruiter_id: &UserId) -> FirestoreResult<Vec<Job>> {
        let query = StructuredQuery::collection(JOBS)
            .where_eq("recruiter_id", recruiter_id.as_str().to_firestore_value());
        let documents = self.client.run_query(None, query).await?;
        documents.iter().map(document_to_job).collect()
    }

    pub async fn get_many(&self, ids: &[JobId]) -> FirestoreResult<Vec<Job>> {
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        let documents = self.client.batch_get_documents(JOBS, &ids).await?;
        documents.iter().map(document_to_job).collect()
    }

    /// Newest first, using a `created_at` ordered query.
    pub async fn recent(&self, limit: usize) -> FirestoreResult<Vec<Job>> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let query = StructuredQuery::collection(JOBS)
            .order_by("created_at", Direction::Descending)
            .limit(limit);
        let documents = self.client.run_query(None, query).await?;
        documents.iter().map(document_to_job).collect()
    }

    /// Patch `status` and `updated_at` on every job in one commit.
    pub async fn set_status(
        &self,
        ids: &[JobId],
        status: JobStatus,
        at: DateTime<Utc>,
    ) -> FirestoreResult<()> {
        let mask = vec!["status".to_string(), "updated_at".to_string()];
        let writes = ids
            .iter()
            .map(|id| {
                Write::patch(
                    Document::named(
                        self.client.full_document_name(JOBS, id.as_str()),
                        job_status_fields(status, at),
                    ),
                    mask.clone(),
                )
            })
            .collect();

        match self.client.batch_write(writes).await {
            Err(FirestoreError::PreconditionFailed(msg)) => Err(FirestoreError::not_found(msg)),
            other => other.map(|_| ()),
        }?;
        info!(count = ids.len(), status = status.as_str(), "Updated job status");
        Ok(())
    }

    /// Delete the job, committing `dependents` in the same batch.
    pub async fn delete(&self, job_id: &JobId, dependents: Vec<Write>) -> FirestoreResult<()> {
        let job = Write {
            current_document: Some(Precondition::exists(true)),
            ..Write::delete(self.client.full_document_name(JOBS, job_id.as_str()))
        };
        let count = dependents.len();
        let mut writes = dependents;
        writes.push(job);

        match self.client.batch_write(writes).await {
            Err(FirestoreError::PreconditionFailed(msg)) => Err(FirestoreError::not_found(msg)),
            other => other.map(|_| ()),
        }?;
        info!(job_id = %job_id, dependents = count, "Deleted job");
        Ok(())
    }
}
