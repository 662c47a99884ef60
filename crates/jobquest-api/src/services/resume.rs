//! Résumé builder.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use jobquest_firestore::{DataStore, ResumeStore};
use jobquest_models::{Resume, Role, User};

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct ResumeService {
    store: Arc<dyn DataStore>,
}

impl ResumeService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Validate and store the caller's résumé, replacing any previous one.
    pub async fn save(&self, user: &User, resume: Resume) -> ApiResult<Resume> {
        if user.role() != Role::JobSeeker {
            return Err(ApiError::forbidden("Only job seekers can create a resume"));
        }

        let errors = resume.validation_errors();
        if !errors.is_empty() {
            return Err(ApiError::validation("Please complete all required resume fields", errors));
        }

        let mut resume = resume.sanitized();
        resume.updated_at = Some(Utc::now());
        self.store.save_resume(&user.id, &resume).await?;
        info!(user_id = %user.id, skills = resume.skills.len(), "Resume saved");
        Ok(resume)
    }

    pub async fn get(&self, user: &User) -> ApiResult<Resume> {
        self.store
            .get_resume(&user.id)
            .await?
            .ok_or_else(|| ApiError::not_found("Resume not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobquest_firestore::{MemoryStore, UserStore};
    use jobquest_models::{Company, Education, Experience, Profile};

    fn complete() -> Resume {
        Resume {
            full_name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone_number: "5550100".into(),
            education: vec![Education {
                degree: "BSc Mathematics".into(),
                institution: "University of London".into(),
                year: Some("1835".into()),
            }],
            experience: vec![Experience {
                title: "Analyst".into(),
                company: "Analytical Engines Ltd".into(),
                duration: None,
            }],
            skills: vec!["Mathematics".into(), " Programming ".into()],
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_save_updates_record_and_profile_copy() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("ada@example.com", "h", "Ada", "5550100", Profile::JobSeeker { resume: None });
        store.create_user(&user).await.unwrap();
        let service = ResumeService::new(store.clone());

        let saved = service.save(&user, complete()).await.unwrap();
        assert_eq!(saved.skills, vec!["Mathematics".to_string(), "Programming".to_string()]);
        assert!(saved.updated_at.is_some());

        assert_eq!(service.get(&user).await.unwrap(), saved);
        let stored_user = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(stored_user.resume(), Some(&saved));
    }

    #[tokio::test]
    async fn test_save_reports_field_errors() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new("ada@example.com", "h", "Ada", "5550100", Profile::JobSeeker { resume: None });
        store.create_user(&user).await.unwrap();
        let service = ResumeService::new(store);

        let resume = Resume {
            skills: vec![],
            experience: vec![Experience::default()],
            ..complete()
        };
        match service.save(&user, resume).await {
            Err(ApiError::Validation { details, .. }) => {
                assert!(details.contains_key("skills"));
                assert!(details.contains_key("experience"));
                assert!(!details.contains_key("education"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(matches!(service.get(&user).await, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_recruiters_cannot_save() {
        let store = Arc::new(MemoryStore::new());
        let user = User::new(
            "rita@corp.example",
            "h",
            "Rita",
            "5550100",
            Profile::Recruiter {
                company: Some(Company::new("Acme", "Widgets")),
            },
        );
        let service = ResumeService::new(store);
        assert!(matches!(
            service.save(&user, complete()).await,
            Err(ApiError::Forbidden(_))
        ));
    }
}
