//! Input validation and sanitization.
//!
//! This module provides:
//! - Email and phone format checks used at signup and profile update
//! - Company website validation (http/https only)
//! - Text sanitization for free-form fields
//! - Path id validation

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Maximum URL length accepted for a company website.
const MAX_URL_LENGTH: usize = 2048;

/// Maximum length of short text fields (names, titles, locations).
pub const MAX_SHORT_TEXT: usize = 200;

/// Maximum length of long text fields (descriptions).
pub const MAX_LONG_TEXT: usize = 10_000;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s-]{7,15}$").expect("valid phone regex"));

/// Loose `local@domain.tld` check on a trimmed address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

/// Digits, spaces and dashes with an optional leading `+`, 7 to 15 characters.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone.trim())
}

/// Validate a company website. Returns the normalized URL.
pub fn validate_website(url: &str) -> Result<String, String> {
    let url = url.trim();
    if url.len() > MAX_URL_LENGTH {
        return Err(format!(
            "Website exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        ));
    }

    let parsed = Url::parse(url).map_err(|e| format!("Invalid website URL: {}", e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(format!(
                "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
                scheme
            ))
        }
    }
    if parsed.host_str().is_none() {
        return Err("Website must have a valid domain".to_string());
    }

    Ok(parsed.to_string())
}

/// Strip control characters (keeping newlines and tabs), trim, and cap length.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_len)
        .collect()
}

/// Document ids arriving in paths: alphanumerics, hyphens and underscores, 1-128 chars.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
