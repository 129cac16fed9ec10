//! Transactional email client.
//!
//! Sends contact-form submissions to the shop inbox through the Resend HTTP
//! API. A send failure is reported to the caller but must never roll back
//! whatever triggered the email.

use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::EmailConfig;

/// Resend API base URL.
const BASE_URL: &str = "https://api.resend.com";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Client for the transactional email API.
#[derive(Clone)]
pub struct EmailClient {
    client: reqwest::Client,
    config: EmailConfig,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl EmailClient {
    /// Create a new email client.
    #[must_use]
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    /// Forward a contact-form submission to the shop inbox.
    ///
    /// The customer's address goes in `Reply-To` so staff can answer
    /// directly; the `From` stays on our sending domain.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the send.
    #[instrument(skip(self, message), fields(reply_to = %reply_to))]
    pub async fn send_contact_message(
        &self,
        reply_to: &str,
        subject: &str,
        message: &str,
    ) -> Result<(), EmailError> {
        let request = SendRequest {
            from: &self.config.from_address,
            to: &self.config.contact_address,
            reply_to,
            subject,
            text: message,
        };

        let response = self
            .client
            .post(format!("{BASE_URL}/emails"))
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_error_display() {
        let err = EmailError::Api {
            status: 422,
            message: "invalid from address".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 422 - invalid from address");
    }
}
