//! Accounts: signup, login, password reset and admin sign-in.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use jobquest_firestore::{DataStore, ResumeStore, StoreError, UserStore};
use jobquest_models::{normalize_email, Company, Profile, Resume, Role, User, UserId};
use jobquest_storage::{ImageStore, ImageUpload};

use crate::auth::{TokenIssuer, ADMIN_ROLE};
use crate::config::AdminConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::password::{hash_password, temporary_password, verify_password, MIN_PASSWORD_LEN};
use crate::security::{is_valid_email, is_valid_phone, sanitize_text, MAX_LONG_TEXT, MAX_SHORT_TEXT};
use crate::services::admin::admin_account;
use crate::services::mailer::{reset_password_email, Mailer};

/// How long a temporary password from a reset stays valid.
pub const RESET_PASSWORD_TTL_MINUTES: i64 = 10;

const INVALID_LOGIN: &str = "Invalid email or password";

/// Fields of the signup form.
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
}

/// Validated signup input.
struct NewAccount {
    full_name: String,
    email: String,
    phone_number: String,
    password: String,
    role: Role,
    company: Option<Company>,
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

impl SignupForm {
    fn validate(&self) -> ApiResult<NewAccount> {
        let mut details = BTreeMap::new();
        let mut error = |field: &str, message: &str| {
            details.insert(field.to_string(), message.to_string());
        };

        let full_name = trimmed(&self.full_name);
        if full_name.is_empty() {
            error("fullName", "Full name is required");
        }
        let email = trimmed(&self.email);
        if !is_valid_email(email) {
            error("email", "Please provide a valid email address");
        }
        let phone_number = trimmed(&self.phone_number);
        if !is_valid_phone(phone_number) {
            error("phoneNumber", "Please provide a valid phone number");
        }
        let password = self.password.as_deref().unwrap_or("");
        if password.len() < MIN_PASSWORD_LEN {
            error("password", "Password must be at least 6 characters long");
        }
        let role = trimmed(&self.role).parse::<Role>().ok();
        if role.is_none() {
            error("role", "Role must be Job Seeker or Recruiter");
        }

        let company_name = trimmed(&self.company_name);
        let company_description = trimmed(&self.company_description);
        let mut company_missing = false;
        if role == Some(Role::Recruiter) {
            if company_name.is_empty() {
                error("companyName", "Company name is required");
                company_missing = true;
            }
            if company_description.is_empty() {
                error("companyDescription", "Company description is required");
                company_missing = true;
            }
        }

        match role {
            Some(role) if details.is_empty() => Ok(NewAccount {
                full_name: sanitize_text(full_name, MAX_SHORT_TEXT),
                email: normalize_email(email),
                phone_number: phone_number.to_string(),
                password: password.to_string(),
                role,
                company: (role == Role::Recruiter).then(|| {
                    Company::new(
                        sanitize_text(company_name, MAX_SHORT_TEXT),
                        sanitize_text(company_description, MAX_LONG_TEXT),
                    )
                }),
            }),
            _ => {
                let message = if company_missing && details.len() <= 2 {
                    "Company name and description are required for recruiters"
                } else {
                    "Please correct the highlighted fields"
                };
                Err(ApiError::validation(message, details))
            }
        }
    }
}

/// Account summary returned on signup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: UserId,
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub profile_picture: String,
}

impl AccountSummary {
    fn of(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub token: String,
    pub user: AccountSummary,
}

/// Account details plus where the client should go next.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    #[serde(flatten)]
    pub account: AccountSummary,
    pub company: Option<Company>,
    pub is_profile_complete: bool,
    pub redirect_path: &'static str,
    pub first_login: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminIdentity {
    pub email: String,
    pub role: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub admin: AdminIdentity,
}

/// Account lifecycle operations.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn DataStore>,
    images: Arc<dyn ImageStore>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenIssuer,
    admin: Option<AdminConfig>,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn DataStore>,
        images: Arc<dyn ImageStore>,
        mailer: Arc<dyn Mailer>,
        tokens: TokenIssuer,
        admin: Option<AdminConfig>,
    ) -> Self {
        Self {
            store,
            images,
            mailer,
            tokens,
            admin,
        }
    }

    /// Create an account and sign it in.
    ///
    /// Job seekers get an empty résumé carrying their contact details;
    /// recruiters must supply a company name and description.
    pub async fn signup(
        &self,
        form: SignupForm,
        picture: Option<ImageUpload>,
        logo: Option<ImageUpload>,
    ) -> ApiResult<SignupResponse> {
        let account = form.validate()?;
        if self.store.find_user_by_email(&account.email).await?.is_some() {
            return Err(ApiError::conflict("User already exists"));
        }

        let password_hash = hash_password(&account.password)?;
        let mut user = User::new(
            &account.email,
            password_hash,
            account.full_name,
            account.phone_number,
            match account.company {
                Some(company) => Profile::Recruiter {
                    company: Some(company),
                },
                None => Profile::JobSeeker { resume: None },
            },
        );

        let mut uploaded = Vec::new();
        let created = match self.store_signup_images(&mut user, picture, logo, &mut uploaded).await {
            Ok(()) => self.store.create_user(&user).await.map_err(|e| match e {
                StoreError::Conflict(_) => ApiError::conflict("User already exists"),
                e => e.into(),
            }),
            Err(e) => Err(e),
        };
        if let Err(e) = created {
            self.discard_images(&uploaded).await;
            return Err(e);
        }

        if account.role == Role::JobSeeker {
            let mut resume = Resume::seeded(&user.full_name, &user.email, &user.phone_number);
            resume.updated_at = Some(Utc::now());
            match self.store.save_resume(&user.id, &resume).await {
                Ok(()) => {
                    user.profile = Profile::JobSeeker {
                        resume: Some(resume),
                    }
                }
                Err(e) => warn!(user_id = %user.id, "Failed to seed résumé: {}", e),
            }
        }

        metrics::record_signup(account.role.as_str());
        info!(user_id = %user.id, role = %account.role, "Account created");

        Ok(SignupResponse {
            token: self.tokens.issue_for(&user)?,
            user: AccountSummary::of(&user),
        })
    }

    async fn store_signup_images(
        &self,
        user: &mut User,
        picture: Option<ImageUpload>,
        logo: Option<ImageUpload>,
        uploaded: &mut Vec<String>,
    ) -> ApiResult<()> {
        if let (Some(logo), Profile::Recruiter { company: Some(company) }) = (logo, &mut user.profile) {
            company.logo = self.images.put(&logo.key("logo"), &logo).await?;
            uploaded.push(company.logo.clone());
        }
        if let Some(picture) = picture {
            user.profile_picture = self.images.put(&picture.key("profile"), &picture).await?;
            uploaded.push(user.profile_picture.clone());
        }
        Ok(())
    }

    /// Best-effort removal of images stored for an account that was never created.
    async fn discard_images(&self, urls: &[String]) {
        for url in urls {
            if let Err(e) = self.images.delete_url(url).await {
                warn!(url = %url, "Failed to remove orphaned upload: {}", e);
            }
        }
    }

    /// Exchange credentials for a token.
    ///
    /// Unknown email, wrong password and an expired temporary password all
    /// fail the same way.
    pub async fn login(&self, email: Option<&str>, password: Option<&str>) -> ApiResult<LoginResponse> {
        let (email, password) = match (email.map(str::trim), password) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
            _ => return Err(ApiError::bad_request("Email and password are required")),
        };

        let user = match self.store.find_user_by_email(&normalize_email(email)).await? {
            Some(user)
                if verify_password(password, &user.password_hash)
                    && !user.password_expired(Utc::now()) =>
            {
                user
            }
            _ => {
                metrics::record_login("failure");
                return Err(ApiError::unauthorized(INVALID_LOGIN));
            }
        };

        // Completeness is judged on the stored résumé, not the profile copy.
        let profile = match &user.profile {
            Profile::JobSeeker { .. } => Profile::JobSeeker {
                resume: self.store.get_resume(&user.id).await?,
            },
            recruiter => recruiter.clone(),
        };
        let (is_profile_complete, redirect_path) = profile.landing();

        metrics::record_login("success");
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            token: self.tokens.issue_for(&user)?,
            user: LoginUser {
                account: AccountSummary::of(&user),
                company: user.company().cloned(),
                is_profile_complete,
                redirect_path,
                first_login: !is_profile_complete,
            },
        })
    }

    /// Replace the password with a temporary one and email it.
    ///
    /// If delivery fails the previous credentials are restored.
    pub async fn forgot_password(&self, email: Option<&str>) -> ApiResult<()> {
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ApiError::bad_request("Email is required"))?;

        let mut user = self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| ApiError::not_found("No account found with this email address"))?;

        let previous = (user.password_hash.clone(), user.reset_password_expiry);
        let temp = temporary_password();
        user.password_hash = hash_password(&temp)?;
        user.reset_password_expiry = Some(Utc::now() + Duration::minutes(RESET_PASSWORD_TTL_MINUTES));
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;

        let message = reset_password_email(&user.email, &user.full_name, &temp);
        if let Err(e) = self.mailer.send(message).await {
            metrics::record_password_reset("failure");
            (user.password_hash, user.reset_password_expiry) = previous;
            if let Err(restore) = self.store.update_user(&user).await {
                warn!(user_id = %user.id, "Failed to restore password after mail failure: {}", restore);
            }
            return Err(ApiError::Upstream(format!("Failed to send reset email: {}", e)));
        }

        metrics::record_password_reset("success");
        info!(user_id = %user.id, "Temporary password issued");
        Ok(())
    }

    /// Change the caller's password. Clears any pending reset expiry.
    pub async fn change_password(
        &self,
        user: &User,
        current: Option<&str>,
        new: Option<&str>,
    ) -> ApiResult<()> {
        let (current, new) = match (current, new) {
            (Some(c), Some(n)) if !c.is_empty() && !n.is_empty() => (c, n),
            _ => return Err(ApiError::missing_fields(&["currentPassword", "newPassword"])),
        };
        if !verify_password(current, &user.password_hash) {
            return Err(ApiError::bad_request("Current password is incorrect"));
        }
        if new.len() < MIN_PASSWORD_LEN {
            let mut details = BTreeMap::new();
            details.insert(
                "newPassword".to_string(),
                "Password must be at least 6 characters long".to_string(),
            );
            return Err(ApiError::validation("Password is too short", details));
        }

        let mut user = user.clone();
        user.password_hash = hash_password(new)?;
        user.reset_password_expiry = None;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;
        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Sign in to the admin panel. Saved settings take precedence over the
    /// configured credentials.
    pub async fn admin_login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> ApiResult<AdminLoginResponse> {
        let admin = admin_account(self.store.as_ref(), self.admin.as_ref())
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
        let email = normalize_email(email.unwrap_or(""));
        let password = password.unwrap_or("");

        if email != admin.email || !verify_password(password, &admin.password_hash) {
            metrics::record_login("failure");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }

        info!("Admin logged in");
        Ok(AdminLoginResponse {
            token: self.tokens.issue_admin(&admin.email)?,
            admin: AdminIdentity {
                email: admin.email,
                role: ADMIN_ROLE,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mailer::{LogMailer, MailError, MockMailer, RESET_SUBJECT};
    use jobquest_firestore::{MemoryStore, SettingsStore};
    use jobquest_storage::LocalImageStore;
    use std::sync::Mutex;

    struct Harness {
        service: IdentityService,
        store: Arc<MemoryStore>,
        _uploads: tempfile::TempDir,
    }

    fn harness(mailer: Arc<dyn Mailer>, admin: Option<AdminConfig>) -> Harness {
        let uploads = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let service = IdentityService::new(
            store.clone(),
            Arc::new(LocalImageStore::new(uploads.path())),
            mailer,
            TokenIssuer::new("test-secret", std::time::Duration::from_secs(3600)),
            admin,
        );
        Harness {
            service,
            store,
            _uploads: uploads,
        }
    }

    fn seeker_form(email: &str) -> SignupForm {
        SignupForm {
            full_name: Some("Ada Lovelace".into()),
            email: Some(email.into()),
            phone_number: Some("+1 555-0100".into()),
            password: Some("secret1".into()),
            role: Some("Job Seeker".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_signup_seeds_resume_and_rejects_duplicates() {
        let h = harness(Arc::new(LogMailer), None);

        let response = h.service.signup(seeker_form("Ada@Example.com"), None, None).await.unwrap();
        assert_eq!(response.user.email, "ada@example.com");
        assert_eq!(response.user.role, Role::JobSeeker);
        assert_eq!(response.user.profile_picture, jobquest_models::DEFAULT_PROFILE_PICTURE);

        let resume = h.store.get_resume(&response.user.id).await.unwrap().unwrap();
        assert_eq!(resume.full_name, "Ada Lovelace");
        assert!(resume.skills.is_empty());

        let err = h
            .service
            .signup(seeker_form(" ada@example.COM "), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_losing_signup_race_removes_its_uploads() {
        let h = harness(Arc::new(LogMailer), None);
        let png = || ImageUpload::new(vec![137, 80, 78, 71], Some("image/png"), None).unwrap();
        let form = || SignupForm {
            role: Some("Recruiter".into()),
            company_name: Some("Acme".into()),
            company_description: Some("Widgets".into()),
            ..seeker_form("rita@acme.example")
        };

        let (first, second) = tokio::join!(
            h.service.signup(form(), Some(png()), Some(png())),
            h.service.signup(form(), Some(png()), Some(png())),
        );
        let outcomes = [first.is_ok(), second.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        let err = first.err().or(second.err()).unwrap();
        assert!(matches!(err, ApiError::Conflict(_)));

        // Only the winner's picture and logo remain
        let stored = std::fs::read_dir(h._uploads.path().join("profiles"))
            .unwrap()
            .count();
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn test_signup_validation_details() {
        let h = harness(Arc::new(LogMailer), None);
        let form = SignupForm {
            email: Some("not-an-email".into()),
            password: Some("123".into()),
            ..seeker_form("x@example.com")
        };
        match h.service.signup(form, None, None).await {
            Err(ApiError::Validation { details, .. }) => {
                assert!(details.contains_key("email"));
                assert!(details.contains_key("password"));
                assert!(!details.contains_key("fullName"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|r| r.user)),
        }

        let recruiter = SignupForm {
            role: Some("Recruiter".into()),
            company_name: Some("Acme".into()),
            ..seeker_form("rita@example.com")
        };
        match h.service.signup(recruiter, None, None).await {
            Err(ApiError::Validation { message, details }) => {
                assert_eq!(message, "Company name and description are required for recruiters");
                assert!(details.contains_key("companyDescription"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|r| r.user)),
        }
    }

    #[tokio::test]
    async fn test_login_landing_and_unified_errors() {
        let h = harness(Arc::new(LogMailer), None);
        h.service.signup(seeker_form("ada@example.com"), None, None).await.unwrap();

        let login = h
            .service
            .login(Some("ADA@example.com"), Some("secret1"))
            .await
            .unwrap();
        assert!(!login.user.is_profile_complete);
        assert!(login.user.first_login);
        assert_eq!(login.user.redirect_path, "/resume-builder");

        for (email, password) in [("ada@example.com", "wrong"), ("nobody@example.com", "secret1")] {
            match h.service.login(Some(email), Some(password)).await {
                Err(ApiError::Unauthorized(msg)) => assert_eq!(msg, INVALID_LOGIN),
                other => panic!("expected 401, got {:?}", other.map(|r| r.token)),
            }
        }
    }

    #[tokio::test]
    async fn test_recruiter_login_lands_on_dashboard() {
        let h = harness(Arc::new(LogMailer), None);
        let form = SignupForm {
            role: Some("Recruiter".into()),
            company_name: Some("Acme".into()),
            company_description: Some("Widgets".into()),
            ..seeker_form("rita@example.com")
        };
        h.service.signup(form, None, None).await.unwrap();

        let login = h.service.login(Some("rita@example.com"), Some("secret1")).await.unwrap();
        assert!(login.user.is_profile_complete);
        assert_eq!(login.user.redirect_path, "/recruiter-dashboard");
        assert_eq!(login.user.company.map(|c| c.name), Some("Acme".to_string()));
    }

    #[tokio::test]
    async fn test_forgot_password_issues_working_temporary_password() {
        let sent = Arc::new(Mutex::new(None::<String>));
        let captured = Arc::clone(&sent);
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| email.subject == RESET_SUBJECT && email.to == "ada@example.com")
            .times(1)
            .returning(move |email| {
                let start = email.html.find("<strong>").map(|i| i + "<strong>".len());
                let end = email.html.find("</strong>");
                if let (Some(start), Some(end)) = (start, end) {
                    *captured.lock().unwrap() = Some(email.html[start..end].to_string());
                }
                Ok(())
            });

        let h = harness(Arc::new(mailer), None);
        h.service.signup(seeker_form("ada@example.com"), None, None).await.unwrap();
        h.service.forgot_password(Some("ada@example.com")).await.unwrap();

        let temp = sent.lock().unwrap().clone().unwrap();
        assert_eq!(temp.len(), 8);
        assert!(h.service.login(Some("ada@example.com"), Some("secret1")).await.is_err());
        h.service.login(Some("ada@example.com"), Some(&temp)).await.unwrap();

        // Once the reset window closes the temporary password stops working.
        let mut user = h.store.find_user_by_email("ada@example.com").await.unwrap().unwrap();
        user.reset_password_expiry = Some(Utc::now() - Duration::minutes(1));
        h.store.update_user(&user).await.unwrap();
        assert!(matches!(
            h.service.login(Some("ada@example.com"), Some(&temp)).await,
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_forgot_password_errors() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_| Err(MailError("smtp down".into())));
        let h = harness(Arc::new(mailer), None);
        h.service.signup(seeker_form("ada@example.com"), None, None).await.unwrap();

        assert!(matches!(
            h.service.forgot_password(None).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            h.service.forgot_password(Some("ghost@example.com")).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            h.service.forgot_password(Some("ada@example.com")).await,
            Err(ApiError::Upstream(_))
        ));
        // The original password survives a failed delivery.
        h.service.login(Some("ada@example.com"), Some("secret1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = harness(Arc::new(LogMailer), None);
        let created = h.service.signup(seeker_form("ada@example.com"), None, None).await.unwrap();
        let user = h.store.get_user(&created.user.id).await.unwrap().unwrap();

        assert!(matches!(
            h.service.change_password(&user, Some("nope"), Some("another1")).await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            h.service.change_password(&user, Some("secret1"), Some("abc")).await,
            Err(ApiError::Validation { .. })
        ));
        h.service
            .change_password(&user, Some("secret1"), Some("another1"))
            .await
            .unwrap();
        h.service.login(Some("ada@example.com"), Some("another1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_login() {
        let admin = AdminConfig {
            email: "admin@jobquest.dev".into(),
            password_hash: hash_password("admin-pass").unwrap(),
        };
        let h = harness(Arc::new(LogMailer), Some(admin));

        let response = h
            .service
            .admin_login(Some("Admin@JobQuest.dev"), Some("admin-pass"))
            .await
            .unwrap();
        assert_eq!(response.admin.role, ADMIN_ROLE);
        let claims = h.service.tokens.verify(&response.token).unwrap();
        assert_eq!(claims.role, ADMIN_ROLE);

        assert!(matches!(
            h.service.admin_login(Some("admin@jobquest.dev"), Some("guess")).await,
            Err(ApiError::Unauthorized(_))
        ));

        let disabled = harness(Arc::new(LogMailer), None);
        assert!(disabled
            .service
            .admin_login(Some("a@b.co"), Some("x"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_saved_admin_settings_replace_configured_password() {
        let admin = AdminConfig {
            email: "admin@jobquest.dev".into(),
            password_hash: hash_password("admin-pass").unwrap(),
        };
        let h = harness(Arc::new(LogMailer), Some(admin));
        let saved = jobquest_models::AdminSettings::new(
            "ops@jobquest.dev",
            hash_password("rotated-pass").unwrap(),
        );
        h.store.save_admin_settings(&saved).await.unwrap();

        assert!(h
            .service
            .admin_login(Some("admin@jobquest.dev"), Some("admin-pass"))
            .await
            .is_err());
        let response = h
            .service
            .admin_login(Some("ops@jobquest.dev"), Some("rotated-pass"))
            .await
            .unwrap();
        assert_eq!(response.admin.email, "ops@jobquest.dev");
    }
}
