//! User documents, the email index and résumés.
//!
//! `user_emails/{email}` maps a normalized email to its owner. Index and
//! user are written in one commit, so two signups racing for the same email
//! cannot both succeed.

use tracing::info;

use jobquest_models::{normalize_email, Profile, Resume, Role, User, UserId};

use crate::client::FirestoreClient;
use crate::codec::{
    document_to_indexed_user_id, document_to_resume, document_to_user, email_index_fields,
    resume_to_fields, user_to_fields,
};
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, StructuredQuery, ToFirestoreValue, Write};

const USERS: &str = "users";
const USER_EMAILS: &str = "user_emails";
const RESUMES: &str = "resumes";

/// Repository for user accounts.
#[derive(Clone)]
pub struct UserRepository {
    client: FirestoreClient,
}

impl UserRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    fn user_document(&self, user: &User) -> Document {
        Document::named(
            self.client.full_document_name(USERS, user.id.as_str()),
            user_to_fields(user),
        )
    }

    fn email_index_document(&self, email: &str, user_id: &UserId) -> Document {
        Document::named(
            self.client.full_document_name(USER_EMAILS, email),
            email_index_fields(user_id),
        )
    }

    /// Create the user and claim its email. `AlreadyExists` if the email is taken.
    pub async fn create(&self, user: &User) -> FirestoreResult<()> {
        let email = normalize_email(&user.email);
        let writes = vec![
            Write::create(self.email_index_document(&email, &user.id)),
            Write::create(self.user_document(user)),
        ];

        match self.client.batch_write(writes).await {
            Err(FirestoreError::PreconditionFailed(msg)) => Err(FirestoreError::AlreadyExists(msg)),
            other => other.map(|_| ()),
        }?;

        info!(user_id = %user.id, role = %user.role(), "Created user");
        Ok(())
    }

    pub async fn get(&self, user_id: &UserId) -> FirestoreResult<Option<User>> {
        self.client
            .get_document(USERS, user_id.as_str())
            .await?
            .map(|doc| document_to_user(&doc))
            .transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> FirestoreResult<Option<User>> {
        let email = normalize_email(email);
        let Some(index) = self.client.get_document(USER_EMAILS, &email).await? else {
            return Ok(None);
        };
        let user_id = document_to_indexed_user_id(&index)?;
        self.get(&user_id).await
    }

    /// Overwrite the user. A changed email moves the index entry in the same commit.
    pub async fn update(&self, user: &User) -> FirestoreResult<()> {
        let current = self
            .get(&user.id)
            .await?
            .ok_or_else(|| FirestoreError::not_found(format!("{}/{}", USERS, user.id)))?;

        let email = normalize_email(&user.email);
        let mut writes = Vec::with_capacity(3);
        if email != current.email {
            writes.push(Write::create(self.email_index_document(&email, &user.id)));
            writes.push(Write::delete(
                self.client.full_document_name(USER_EMAILS, &current.email),
            ));
        }
        writes.push(Write::upsert(self.user_document(user)));

        match self.client.batch_write(writes).await {
            Err(FirestoreError::PreconditionFailed(msg)) => Err(FirestoreError::AlreadyExists(msg)),
            other => other.map(|_| ()),
        }
    }

    pub async fn list(&self, role: Option<Role>) -> FirestoreResult<Vec<User>> {
        let documents = match role {
            Some(role) => {
                let query = StructuredQuery::collection(USERS)
                    .where_eq("role", role.as_str().to_firestore_value());
                self.client.run_query(None, query).await?
            }
            None => self.client.list_all_documents(USERS).await?,
        };
        documents.iter().map(document_to_user).collect()
    }

    pub async fn get_many(&self, ids: &[UserId]) -> FirestoreResult<Vec<User>> {
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        let documents = self.client.batch_get_documents(USERS, &ids).await?;
        documents.iter().map(document_to_user).collect()
    }

    /// Write the résumé record and the profile copy in one commit.
    pub async fn save_resume(&self, user_id: &UserId, resume: &Resume) -> FirestoreResult<()> {
        let mut user = self
            .get(user_id)
            .await?
            .ok_or_else(|| FirestoreError::not_found(format!("{}/{}", USERS, user_id)))?;
        user.profile = Profile::JobSeeker {
            resume: Some(resume.clone()),
        };
        user.updated_at = resume.updated_at.unwrap_or(user.updated_at);

        let writes = vec![
            Write::upsert(Document::named(
                self.client.full_document_name(RESUMES, user_id.as_str()),
                resume_to_fields(resume),
            )),
            Write::upsert(self.user_document(&user)),
        ];
        self.client.batch_write(writes).await?;

        info!(user_id = %user_id, skills = resume.skills.len(), "Saved resume");
        Ok(())
    }

    pub async fn get_resume(&self, user_id: &UserId) -> FirestoreResult<Option<Resume>> {
        self.client
            .get_document(RESUMES, user_id.as_str())
            .await?
            .map(|doc| document_to_resume(&doc))
            .transpose()
    }
}
