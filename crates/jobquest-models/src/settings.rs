//! Admin panel settings.

use serde::{Deserialize, Serialize};

/// Settings owned by the single admin account.
///
/// Until the first save the admin logs in with the configured credentials;
/// afterwards `password_hash` here takes precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub company: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(default = "default_notifications")]
    pub email_notifications: bool,
}

fn default_notifications() -> bool {
    true
}

impl AdminSettings {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            company: String::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            email_notifications: default_notifications(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_never_serialized() {
        let settings = AdminSettings::new("admin@jobquest.io", "$argon2id$...");
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["email"], "admin@jobquest.io");
        assert_eq!(json["emailNotifications"], true);
        assert!(json.get("passwordHash").is_none());
    }
}
