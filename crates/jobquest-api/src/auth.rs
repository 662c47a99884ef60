//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs. User tokens carry the account id and role and live
//! for the configured TTL; admin tokens carry the `Admin` role and live one hour.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use jobquest_firestore::UserStore;
use jobquest_models::{Role, User, UserId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Role claim carried by admin tokens.
pub const ADMIN_ROLE: &str = "Admin";

/// Admin sessions are short-lived.
pub const ADMIN_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Decoded token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id, or the admin email for admin tokens
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    user_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, user_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            user_ttl,
        }
    }

    fn sign(&self, sub: &str, role: &str, ttl: Duration) -> ApiResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Token for a registered account.
    pub fn issue_for(&self, user: &User) -> ApiResult<String> {
        self.sign(user.id.as_str(), user.role().as_str(), self.user_ttl)
    }

    /// Token for the admin panel.
    pub fn issue_admin(&self, email: &str) -> ApiResult<String> {
        self.sign(email, ADMIN_ROLE, ADMIN_TOKEN_TTL)
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                ApiError::unauthorized("Not authorized, token invalid")
            })
    }
}

async fn bearer_claims(parts: &mut Parts, state: &AppState) -> ApiResult<Claims> {
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::unauthorized("Not authorized, no token"))?;
    state.tokens.verify(bearer.token())
}

/// Authenticated account extracted from the bearer token.
///
/// The account is re-read on every request so that a deleted user or a
/// stale role claim cannot act.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> &UserId {
        &self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role()
    }

    /// Fail with 403 unless the caller has `role`.
    pub fn require(&self, role: Role, message: &str) -> ApiResult<()> {
        if self.role() == role {
            Ok(())
        } else {
            Err(ApiError::forbidden(message))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state).await?;
        if claims.role == ADMIN_ROLE {
            return Err(ApiError::forbidden("Admin tokens cannot be used here"));
        }

        let user = state
            .store
            .get_user(&UserId::from_string(claims.sub))
            .await?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        Ok(Self { user })
    }
}

/// Authenticated admin panel operator.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub email: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state).await?;
        if claims.role != ADMIN_ROLE {
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(Self { email: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobquest_models::Profile;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::from_secs(30 * 24 * 60 * 60))
    }

    #[test]
    fn test_user_token_round_trip() {
        let user = User::new(
            "ada@example.com",
            "hash",
            "Ada",
            "555-0100",
            Profile::JobSeeker { resume: None },
        );
        let tokens = issuer();
        let claims = tokens.verify(&tokens.issue_for(&user).unwrap()).unwrap();

        assert_eq!(claims.sub, user.id.as_str());
        assert_eq!(claims.role, "Job Seeker");
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_admin_token_lives_one_hour() {
        let tokens = issuer();
        let claims = tokens.verify(&tokens.issue_admin("root@jobquest.dev").unwrap()).unwrap();
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_rejects_foreign_signature_and_expired_tokens() {
        let other = TokenIssuer::new("other-secret", Duration::from_secs(60));
        let foreign = other.issue_admin("x@example.com").unwrap();
        assert!(matches!(issuer().verify(&foreign), Err(ApiError::Unauthorized(_))));

        let expired = Claims {
            sub: "u1".into(),
            role: "Recruiter".into(),
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &expired,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(issuer().verify(&token).is_err());
        assert!(issuer().verify("not-a-token").is_err());
    }
}
