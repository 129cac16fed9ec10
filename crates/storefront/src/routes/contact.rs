//! Contact form route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use driftwood_core::types::Email;

use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

/// Response for form submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Submit the contact form.
///
/// POST /api/contact
///
/// Forwards the submission to the shop inbox. A failed send is reported to
/// the caller; nothing is rolled back.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> impl IntoResponse {
    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ContactResponse {
                    success: false,
                    message: Some(err.to_string()),
                }),
            );
        }
    };

    if form.name.trim().is_empty() || form.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ContactResponse {
                success: false,
                message: Some("Name and message are required.".to_string()),
            }),
        );
    }

    let subject = match form.subject.as_deref().map(str::trim) {
        Some(subject) if !subject.is_empty() => format!("Contact form: {subject}"),
        _ => "Contact form submission".to_string(),
    };
    let body = format!(
        "From: {} <{}>\n\n{}",
        form.name.trim(),
        email.as_str(),
        form.message.trim()
    );

    match state
        .email()
        .send_contact_message(email.as_str(), &subject, &body)
        .await
    {
        Ok(()) => {
            tracing::info!(email = %email.as_str(), "Contact message forwarded");
            (
                StatusCode::OK,
                Json(ContactResponse {
                    success: true,
                    message: None,
                }),
            )
        }
        Err(err) => {
            tracing::error!(email = %email.as_str(), error = %err, "Failed to forward contact message");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ContactResponse {
                    success: false,
                    message: Some("Something went wrong. Please try again.".to_string()),
                }),
            )
        }
    }
}
