//! Outbound email delivery.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::MailConfig;

/// Subject line of the password reset email.
pub const RESET_SUBJECT: &str = "JobQuest - Password Reset Request";

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery failure, surfaced to the caller as a 500.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MailError(pub String);

/// Sends email through an external service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Mailer posting JSON to an HTTP mail API with a bearer key.
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MailError(format!("Failed to build mail client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let request = SendRequest {
            from: &self.config.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError(format!("Mail service unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Mail service rejected message: {}", body);
            return Err(MailError(format!("Mail service returned {}", status)));
        }

        info!(subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Mailer for development: logs instead of sending.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(to = %email.to, subject = %email.subject, "Mail delivery disabled, logging message");
        tracing::debug!(html = %email.html, "Email body");
        Ok(())
    }
}

/// Password reset email carrying a temporary password.
pub fn reset_password_email(to: &str, full_name: &str, temp_password: &str) -> Email {
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background-color: #2557a7; padding: 20px; text-align: center; color: white;">
      <h1>JobQuest</h1>
    </div>
    <h2>Password Reset Request</h2>
    <p>Hello {name},</p>
    <p>We received a request to reset your password for your JobQuest account.</p>
    <div style="background-color: #f5f5f5; padding: 15px; text-align: center; font-size: 18px;">
      Your temporary password is: <strong>{password}</strong>
    </div>
    <ul>
      <li>Please login with this temporary password</li>
      <li>This temporary password will expire in 10 minutes</li>
      <li>You must change your password immediately after logging in</li>
    </ul>
    <p>If you didn't request this password reset, please contact our support team immediately.</p>
    <p style="font-size: 12px; color: #666666;">&copy; {year} JobQuest. All rights reserved.</p>
  </div>
</body>
</html>"#,
        name = html_escape(full_name),
        password = temp_password,
        year = Utc::now().year(),
    );

    Email {
        to: to.to_string(),
        subject: RESET_SUBJECT.to_string(),
        html,
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> MailConfig {
        MailConfig {
            api_url: format!("{}/send", server.uri()),
            api_key: "mail-key".to_string(),
            from: "noreply@jobquest.dev".to_string(),
        }
    }

    #[test]
    fn test_reset_email_contents() {
        let email = reset_password_email("ada@example.com", "Ada <Admin>", "Ab3dE6gH");
        assert_eq!(email.subject, RESET_SUBJECT);
        assert!(email.html.contains("Ab3dE6gH"));
        assert!(email.html.contains("Ada &lt;Admin&gt;"));
        assert!(email.html.contains("expire in 10 minutes"));
    }

    #[tokio::test]
    async fn test_http_mailer_posts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("authorization", "Bearer mail-key"))
            .and(body_partial_json(serde_json::json!({
                "from": "noreply@jobquest.dev",
                "to": "ada@example.com",
                "subject": RESET_SUBJECT
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(config(&server)).unwrap();
        mailer
            .send(reset_password_email("ada@example.com", "Ada", "temp1234"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_http_mailer_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(config(&server)).unwrap();
        let err = mailer
            .send(reset_password_email("ada@example.com", "Ada", "temp1234"))
            .await
            .unwrap_err();
        assert!(err.0.contains("401"));
    }
}
