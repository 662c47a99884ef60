//! Field maps for stored documents.
//!
//! Every entity is stored flat with snake_case field names. Enums are
//! stored by their display string.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use jobquest_models::{
    AdminSettings, Application, ApplicationId, ApplicationStatus, Company, CompanyStatus,
    Education, Experience, ExperienceLevel, Job, JobId, JobStatus, Profile, Resume, Role, User,
    UserId, DEFAULT_COMPANY_LOGO, DEFAULT_PROFILE_PICTURE,
};

use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, Fields, ToFirestoreValue, Value};

type FieldMap = HashMap<String, Value>;

fn put(fields: &mut FieldMap, key: &str, value: impl ToFirestoreValue) {
    fields.insert(key.to_string(), value.to_firestore_value());
}

fn parse<T: FromStr>(reader: &Fields<'_>, key: &str) -> FirestoreResult<T>
where
    T::Err: std::fmt::Display,
{
    let raw: String = reader.require(key)?;
    raw.parse()
        .map_err(|e| FirestoreError::invalid_response(format!("field `{}`: {}", key, e)))
}

fn document_id(doc: &Document) -> FirestoreResult<String> {
    doc.id()
        .map(str::to_string)
        .ok_or_else(|| FirestoreError::invalid_response("Document has no name"))
}

fn timestamp_or_now(reader: &Fields<'_>, key: &str) -> DateTime<Utc> {
    reader.get(key).unwrap_or_else(Utc::now)
}

// ============================================================================
// Résumé and company (embedded maps)
// ============================================================================

pub(crate) fn resume_to_fields(resume: &Resume) -> FieldMap {
    let mut fields = FieldMap::new();
    put(&mut fields, "full_name", resume.full_name.as_str());
    put(&mut fields, "email", resume.email.as_str());
    put(&mut fields, "phone_number", resume.phone_number.as_str());
    fields.insert(
        "education".to_string(),
        Value::ArrayValue(crate::types::ArrayValue {
            values: Some(
                resume
                    .education
                    .iter()
                    .map(|e| {
                        let mut entry = FieldMap::new();
                        put(&mut entry, "degree", e.degree.as_str());
                        put(&mut entry, "institution", e.institution.as_str());
                        put(&mut entry, "year", e.year.clone());
                        Value::map(entry)
                    })
                    .collect(),
            ),
        }),
    );
    fields.insert(
        "experience".to_string(),
        Value::ArrayValue(crate::types::ArrayValue {
            values: Some(
                resume
                    .experience
                    .iter()
                    .map(|e| {
                        let mut entry = FieldMap::new();
                        put(&mut entry, "title", e.title.as_str());
                        put(&mut entry, "company", e.company.as_str());
                        put(&mut entry, "duration", e.duration.clone());
                        Value::map(entry)
                    })
                    .collect(),
            ),
        }),
    );
    put(&mut fields, "skills", resume.skills.clone());
    put(&mut fields, "updated_at", resume.updated_at);
    fields
}

pub(crate) fn fields_to_resume(reader: &Fields<'_>) -> Resume {
    Resume {
        full_name: reader.string("full_name"),
        email: reader.string("email"),
        phone_number: reader.string("phone_number"),
        education: reader
            .maps("education")
            .iter()
            .map(|e| Education {
                degree: e.string("degree"),
                institution: e.string("institution"),
                year: e.get("year"),
            })
            .collect(),
        experience: reader
            .maps("experience")
            .iter()
            .map(|e| Experience {
                title: e.string("title"),
                company: e.string("company"),
                duration: e.get("duration"),
            })
            .collect(),
        skills: reader.get("skills").unwrap_or_default(),
        updated_at: reader.get("updated_at"),
    }
}

pub(crate) fn document_to_resume(doc: &Document) -> FirestoreResult<Resume> {
    Ok(fields_to_resume(&doc.reader()?))
}

fn company_to_fields(company: &Company) -> FieldMap {
    let mut fields = FieldMap::new();
    put(&mut fields, "name", company.name.as_str());
    put(&mut fields, "description", company.description.as_str());
    put(&mut fields, "location", company.location.clone());
    put(&mut fields, "website", company.website.clone());
    put(&mut fields, "industry", company.industry.clone());
    put(&mut fields, "size", company.size.clone());
    put(&mut fields, "employees", company.employees);
    put(&mut fields, "logo", company.logo.as_str());
    put(&mut fields, "status", company.status.as_str());
    fields
}

fn fields_to_company(reader: &Fields<'_>) -> Company {
    Company {
        name: reader.string("name"),
        description: reader.string("description"),
        location: reader.get("location"),
        website: reader.get("website"),
        industry: reader.get("industry"),
        size: reader.get("size"),
        employees: reader.get("employees"),
        logo: reader
            .get("logo")
            .unwrap_or_else(|| DEFAULT_COMPANY_LOGO.to_string()),
        status: reader
            .get::<String>("status")
            .and_then(|s| s.parse().ok())
            .unwrap_or(CompanyStatus::Active),
    }
}

// ============================================================================
// Users
// ============================================================================

pub(crate) fn user_to_fields(user: &User) -> FieldMap {
    let mut fields = FieldMap::new();
    put(&mut fields, "email", user.email.as_str());
    put(&mut fields, "password_hash", user.password_hash.as_str());
    put(&mut fields, "full_name", user.full_name.as_str());
    put(&mut fields, "phone_number", user.phone_number.as_str());
    put(&mut fields, "profile_picture", user.profile_picture.as_str());
    put(&mut fields, "role", user.role().as_str());

    match &user.profile {
        Profile::JobSeeker { resume } => {
            let value = resume
                .as_ref()
                .map(|r| Value::map(resume_to_fields(r)))
                .unwrap_or(Value::NullValue(()));
            fields.insert("resume".to_string(), value);
        }
        Profile::Recruiter { company } => {
            let value = company
                .as_ref()
                .map(|c| Value::map(company_to_fields(c)))
                .unwrap_or(Value::NullValue(()));
            fields.insert("company".to_string(), value);
        }
    }

    put(
        &mut fields,
        "saved_jobs",
        user.saved_jobs
            .iter()
            .map(|id| id.as_str().to_string())
            .collect::<Vec<_>>(),
    );
    put(&mut fields, "reset_password_expiry", user.reset_password_expiry);
    put(&mut fields, "review_status", user.review_status.as_str());
    put(&mut fields, "created_at", user.created_at);
    put(&mut fields, "updated_at", user.updated_at);
    fields
}

pub(crate) fn document_to_user(doc: &Document) -> FirestoreResult<User> {
    let reader = doc.reader()?;
    let role: Role = parse(&reader, "role")?;

    let profile = match role {
        Role::JobSeeker => Profile::JobSeeker {
            resume: reader.map("resume").map(|r| fields_to_resume(&r)),
        },
        Role::Recruiter => Profile::Recruiter {
            company: reader.map("company").map(|c| fields_to_company(&c)),
        },
    };

    Ok(User {
        id: UserId::from_string(document_id(doc)?),
        email: reader.require("email")?,
        password_hash: reader.string("password_hash"),
        full_name: reader.string("full_name"),
        phone_number: reader.string("phone_number"),
        profile_picture: reader
            .get("profile_picture")
            .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
        profile,
        saved_jobs: reader
            .get::<Vec<String>>("saved_jobs")
            .unwrap_or_default()
            .into_iter()
            .map(JobId::from_string)
            .collect(),
        reset_password_expiry: reader.get("reset_password_expiry"),
        review_status: reader
            .get::<String>("review_status")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
        created_at: timestamp_or_now(&reader, "created_at"),
        updated_at: timestamp_or_now(&reader, "updated_at"),
    })
}

pub(crate) fn email_index_fields(user_id: &UserId) -> FieldMap {
    let mut fields = FieldMap::new();
    put(&mut fields, "user_id", user_id.as_str());
    fields
}

pub(crate) fn document_to_indexed_user_id(doc: &Document) -> FirestoreResult<UserId> {
    Ok(UserId::from_string(doc.reader()?.require::<String>("user_id")?))
}

// ============================================================================
// Jobs
// ============================================================================

pub(crate) fn job_to_fields(job: &Job) -> FieldMap {
    let mut fields = FieldMap::new();
    put(&mut fields, "recruiter_id", job.recruiter_id.as_str());
    put(&mut fields, "title", job.title.as_str());
    put(&mut fields, "industry", job.industry.as_str());
    put(&mut fields, "job_type", job.job_type.as_str());
    put(&mut fields, "experience", job.experience.as_str());
    put(&mut fields, "salary", job.salary.as_str());
    put(&mut fields, "location", job.location.as_str());
    put(&mut fields, "description", job.description.as_str());
    put(&mut fields, "status", job.status.as_str());
    put(&mut fields, "application_deadline", job.application_deadline);
    put(&mut fields, "skills", job.skills.clone());
    put(&mut fields, "requirements", job.requirements.clone());
    put(&mut fields, "responsibilities", job.responsibilities.clone());
    put(&mut fields, "created_at", job.created_at);
    put(&mut fields, "updated_at", job.updated_at);
    fields
}

pub(crate) fn document_to_job(doc: &Document) -> FirestoreResult<Job> {
    let reader = doc.reader()?;
    let created_at = timestamp_or_now(&reader, "created_at");

    Ok(Job {
        id: JobId::from_string(document_id(doc)?),
        recruiter_id: UserId::from_string(reader.require::<String>("recruiter_id")?),
        title: reader.string("title"),
        industry: reader.string("industry"),
        job_type: reader.string("job_type"),
        experience: parse::<ExperienceLevel>(&reader, "experience")?,
        salary: reader.string("salary"),
        location: reader.string("location"),
        description: reader.string("description"),
        status: reader
            .get::<String>("status")
            .and_then(|s| s.parse().ok())
            .unwrap_or(JobStatus::Active),
        application_deadline: reader
            .get("application_deadline")
            .unwrap_or_else(|| Job::default_deadline(created_at)),
        skills: reader.get("skills").unwrap_or_default(),
        requirements: reader.get("requirements").unwrap_or_default(),
        responsibilities: reader.get("responsibilities").unwrap_or_default(),
        created_at,
        updated_at: timestamp_or_now(&reader, "updated_at"),
    })
}

/// The masked fields written when only a job's listing status changes.
pub(crate) fn job_status_fields(status: JobStatus, updated_at: DateTime<Utc>) -> FieldMap {
    let mut fields = FieldMap::new();
    put(&mut fields, "status", status.as_str());
    put(&mut fields, "updated_at", updated_at);
    fields
}

// ============================================================================
// Applications
// ============================================================================

pub(crate) fn application_to_fields(application: &Application) -> FieldMap {
    let mut fields = FieldMap::new();
    put(&mut fields, "job_seeker_id", application.job_seeker_id.as_str());
    put(&mut fields, "recruiter_id", application.recruiter_id.as_str());
    put(&mut fields, "job_id", application.job_id.as_str());
    put(&mut fields, "status", application.status.as_str());
    put(&mut fields, "status_message", application.status_message.as_str());
    put(&mut fields, "notification_sent", application.notification_sent);
    put(&mut fields, "created_at", application.created_at);
    put(&mut fields, "updated_at", application.updated_at);
    fields
}

pub(crate) fn document_to_application(doc: &Document) -> FirestoreResult<Application> {
    let reader = doc.reader()?;
    let status: ApplicationStatus = parse(&reader, "status")?;

    Ok(Application {
        id: ApplicationId::from_string(document_id(doc)?),
        job_seeker_id: UserId::from_string(reader.require::<String>("job_seeker_id")?),
        recruiter_id: UserId::from_string(reader.require::<String>("recruiter_id")?),
        job_id: JobId::from_string(reader.require::<String>("job_id")?),
        status,
        status_message: reader
            .get("status_message")
            .unwrap_or_else(|| status.message().to_string()),
        notification_sent: reader.get("notification_sent").unwrap_or(false),
        created_at: timestamp_or_now(&reader, "created_at"),
        updated_at: timestamp_or_now(&reader, "updated_at"),
    })
}

// ============================================================================
// Admin settings
// ============================================================================

pub(crate) fn settings_to_fields(settings: &AdminSettings) -> FieldMap {
    let mut fields = FieldMap::new();
    put(&mut fields, "company", settings.company.as_str());
    put(&mut fields, "email", settings.email.as_str());
    put(&mut fields, "password_hash", settings.password_hash.as_str());
    put(&mut fields, "email_notifications", settings.email_notifications);
    fields
}

pub(crate) fn document_to_settings(doc: &Document) -> FirestoreResult<AdminSettings> {
    let reader = doc.reader()?;
    Ok(AdminSettings {
        company: reader.string("company"),
        email: reader.require("email")?,
        password_hash: reader.require("password_hash")?,
        email_notifications: reader.get("email_notifications").unwrap_or(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(collection: &str, id: &str, fields: FieldMap) -> Document {
        Document::named(
            format!("projects/p/databases/(default)/documents/{}/{}", collection, id),
            fields,
        )
    }

    #[test]
    fn test_recruiter_profile_survives_storage() {
        let mut company = Company::new("Acme", "Widgets");
        company.employees = Some(40);
        company.website = Some("https://acme.test".into());
        let mut user = User::new(
            "hr@acme.test",
            "$argon2id$hash",
            "Rita",
            "555-0100",
            Profile::Recruiter {
                company: Some(company),
            },
        );
        user.save_job(JobId::from_string("j1"));

        let doc = named("users", user.id.as_str(), user_to_fields(&user));
        let decoded = document_to_user(&doc).unwrap();

        assert_eq!(decoded.id, user.id);
        assert_eq!(decoded.password_hash, "$argon2id$hash");
        assert_eq!(decoded.company().unwrap().employees, Some(40));
        assert_eq!(decoded.saved_jobs, vec![JobId::from_string("j1")]);
        assert_eq!(decoded.role(), Role::Recruiter);
    }

    #[test]
    fn test_seeker_without_resume_stores_null() {
        let user = User::new("a@b.c", "h", "Ada", "555", Profile::JobSeeker { resume: None });
        let fields = user_to_fields(&user);
        assert_eq!(fields.get("resume"), Some(&Value::NullValue(())));
        assert!(!fields.contains_key("company"));

        let decoded = document_to_user(&named("users", "u1", fields)).unwrap();
        assert_eq!(decoded.profile, Profile::JobSeeker { resume: None });
    }

    #[test]
    fn test_resume_entries_keep_optional_fields() {
        let resume = Resume {
            full_name: "Ada".into(),
            education: vec![Education {
                degree: "BSc".into(),
                institution: "MIT".into(),
                year: None,
            }],
            experience: vec![Experience {
                title: "Engineer".into(),
                company: "Acme".into(),
                duration: Some("2y".into()),
            }],
            skills: vec!["Rust".into()],
            ..Default::default()
        };
        let decoded = document_to_resume(&named("resumes", "u1", resume_to_fields(&resume))).unwrap();
        assert_eq!(decoded, resume);
    }

    #[test]
    fn test_job_with_unknown_status_reads_as_active() {
        let job = jobquest_models::Job {
            id: JobId::from_string("j1"),
            recruiter_id: UserId::from_string("r1"),
            title: "Dev".into(),
            industry: "Technology".into(),
            job_type: "full-time".into(),
            experience: ExperienceLevel::Mid,
            salary: "$50,000 - $60,000".into(),
            location: "Remote".into(),
            description: "Build".into(),
            status: JobStatus::Inactive,
            application_deadline: Utc::now(),
            skills: vec!["Rust".into()],
            requirements: vec![],
            responsibilities: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut fields = job_to_fields(&job);
        let decoded = document_to_job(&named("jobs", "j1", fields.clone())).unwrap();
        assert_eq!(decoded.status, JobStatus::Inactive);
        assert_eq!(decoded.experience, ExperienceLevel::Mid);

        put(&mut fields, "status", "archived");
        let decoded = document_to_job(&named("jobs", "j1", fields)).unwrap();
        assert_eq!(decoded.status, JobStatus::Active);
    }

    #[test]
    fn test_application_requires_known_status() {
        let app = Application::new(
            UserId::from_string("s1"),
            JobId::from_string("j1"),
            UserId::from_string("r1"),
        );
        let mut fields = application_to_fields(&app);
        let decoded = document_to_application(&named("applications", app.id.as_str(), fields.clone())).unwrap();
        assert_eq!(decoded, app);

        put(&mut fields, "status", "Bogus");
        assert!(document_to_application(&named("applications", "x", fields)).is_err());
    }

    #[test]
    fn test_review_status_defaults_when_absent() {
        let mut user = User::new("a@b.c", "h", "Ada", "555", Profile::JobSeeker { resume: None });
        user.review_status = jobquest_models::CandidateStatus::Approved;
        let mut fields = user_to_fields(&user);
        let decoded = document_to_user(&named("users", "u1", fields.clone())).unwrap();
        assert_eq!(decoded.review_status, jobquest_models::CandidateStatus::Approved);

        fields.remove("review_status");
        let decoded = document_to_user(&named("users", "u1", fields)).unwrap();
        assert_eq!(decoded.review_status, jobquest_models::CandidateStatus::Reviewing);
    }

    #[test]
    fn test_settings_keep_their_hash() {
        let mut settings = AdminSettings::new("admin@jobquest.io", "$argon2id$hash");
        settings.company = "JobQuest".into();
        settings.email_notifications = false;
        let decoded =
            document_to_settings(&named("settings", "admin", settings_to_fields(&settings))).unwrap();
        assert_eq!(decoded, settings);
    }
}
