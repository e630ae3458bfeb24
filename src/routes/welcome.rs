use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::signup::{json_body, required};
use crate::constants::{ERR_EMAIL_REQUIRED, FALLBACK_DISPLAY_NAME};
use crate::email::{send_welcome, DispatchStatus};
use crate::error::{AppError, Result};
use crate::models::EmailType;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResendWelcomeRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendWelcomeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub email_status: DispatchStatus,
}

/// Send the welcome email again
///
/// The greeting uses the name from the request, else the stored signup's
/// name, else a generic fallback. Responds 200 when the provider accepted the
/// message and 500 otherwise.
pub async fn resend_welcome(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResendWelcomeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ResendWelcomeResponse>)> {
    let payload = json_body(payload, ERR_EMAIL_REQUIRED)?;
    let email = required(payload.email.as_deref())
        .ok_or_else(|| AppError::InvalidInput(ERR_EMAIL_REQUIRED.to_string()))?;

    let display_name = match required(payload.name.as_deref()) {
        Some(name) => name.to_string(),
        None => state
            .store
            .find_signup_by_email(email)
            .await?
            .map(|s| s.name)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string()),
    };

    let email_status = send_welcome(
        state.store.as_ref(),
        state.mailer.as_ref(),
        email,
        &display_name,
        EmailType::ResendWelcome,
    )
    .await;

    let status = if email_status.sent {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((
        status,
        Json(ResendWelcomeResponse {
            success: email_status.sent,
            error: email_status.error.clone(),
            email_status,
        }),
    ))
}
