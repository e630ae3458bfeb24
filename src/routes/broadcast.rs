use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::signup::{json_body, required};
use crate::broadcast::{dispatch, select_recipients};
use crate::constants::ERR_SUBJECT_MESSAGE_REQUIRED;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastRequest {
    #[serde(default)]
    pub subject: Option<String>,
    /// Raw HTML body
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub from_email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastResponse {
    pub success: bool,
    pub message: String,
    pub recipient_count: usize,
    pub sent_count: usize,
    pub skipped_count: usize,
    pub email_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Email every stored signup
///
/// Invalid, blocked and duplicate addresses are skipped. Sending stops at the
/// first failing chunk; the response then carries `success: false` with the
/// counts of what was already delivered (502).
pub async fn send_broadcast(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BroadcastRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BroadcastResponse>)> {
    let payload = json_body(payload, ERR_SUBJECT_MESSAGE_REQUIRED)?;
    let (Some(subject), Some(message)) = (
        required(payload.subject.as_deref()),
        required(payload.message.as_deref()),
    ) else {
        return Err(AppError::InvalidInput(ERR_SUBJECT_MESSAGE_REQUIRED.to_string()));
    };

    let signups = state.store.list_signups().await?;
    let recipients = select_recipients(&signups);
    let skipped_count = signups.len() - recipients.len();

    if recipients.is_empty() {
        tracing::warn!("Broadcast rejected: {} signups, none deliverable", signups.len());
        return Err(AppError::NoRecipients);
    }

    let mailer = state.mailer.as_ref().ok_or(AppError::EmailNotConfigured)?;

    let outcome = dispatch(
        state.store.as_ref(),
        mailer,
        subject,
        message,
        payload.from_email.as_deref(),
        &recipients,
    )
    .await?;

    let (status, message) = match &outcome.failure {
        None => (
            StatusCode::OK,
            format!("Email sent successfully to {} recipients!", outcome.sent_count),
        ),
        Some(_) => (
            StatusCode::BAD_GATEWAY,
            format!(
                "Broadcast stopped after {} of {} recipients",
                outcome.sent_count, outcome.recipient_count
            ),
        ),
    };

    Ok((
        status,
        Json(BroadcastResponse {
            success: outcome.is_complete(),
            message,
            recipient_count: outcome.recipient_count,
            sent_count: outcome.sent_count,
            skipped_count,
            email_ids: outcome.email_ids,
            error: outcome.failure,
        }),
    ))
}
