//! Outbound email delivery via the Resend HTTP API.
//!
//! The dispatcher talks to the transport through the [`MailTransport`] trait
//! so tests can substitute an in-memory fake. [`ResendMailer`] is the
//! production implementation: one authenticated POST per message, bounded by
//! the client timeout, non-2xx responses reported as [`MailError::Provider`].

use std::future::Future;
use std::time::Duration;

use serde_json::json;

use gigboard_common::config::AppConfig;
use gigboard_common::error::AppError;

const RESEND_BASE_URL: &str = "https://api.resend.com";

/// Errors produced by a mail transport.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail provider rejected request ({status}): {body}")]
    Provider { status: u16, body: String },
}

/// Outbound mail sender. One call per message, success or failure.
pub trait MailTransport {
    fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
    ) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Mail transport backed by the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: RESEND_BASE_URL.to_string(),
            api_key,
            from,
        })
    }

    /// Build a mailer from application config. Errors when `RESEND_API_KEY`
    /// is not configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let api_key = config
            .resend_api_key
            .clone()
            .ok_or_else(|| AppError::Config("RESEND_API_KEY is required for email delivery".to_string()))?;

        Self::new(
            api_key,
            config.email_from.clone(),
            Duration::from_secs(config.mail_timeout_secs),
        )
    }

    /// Override the API base URL. Used by tests to point at a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(&self, to: &str, subject: &str, html: &str) -> serde_json::Value {
        json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
            "html": html,
        })
    }
}

impl MailTransport for ResendMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(to, subject, html))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(to, subject, "Email accepted by provider");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_mailer() -> ResendMailer {
        ResendMailer::new(
            "re_test_key".to_string(),
            "Gigboard <notifications@gigboard.app>".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let mailer = test_mailer();
        let body = mailer.request_body("dev@example.com", "Hello", "<p>Hi</p>");

        assert_eq!(body["from"], "Gigboard <notifications@gigboard.app>");
        assert_eq!(body["to"], serde_json::json!(["dev@example.com"]));
        assert_eq!(body["subject"], "Hello");
        assert_eq!(body["html"], "<p>Hi</p>");
    }

    #[test]
    fn test_base_url_override() {
        let mailer = test_mailer().with_base_url("http://localhost:9999");
        assert_eq!(mailer.base_url, "http://localhost:9999");
    }
}
