use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use crate::constants::ERR_NAME_EMAIL_REQUIRED;
use crate::email::{send_welcome, DispatchStatus};
use crate::error::{AppError, Result};
use crate::geo::ClientIp;
use crate::models::{EmailType, NewSignup, Signup};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub success: bool,
    pub data: Signup,
    pub email_status: DispatchStatus,
}

/// Unwrap a JSON body, turning any rejection (bad JSON, wrong field types,
/// missing content type) into a 400 carrying `message`
pub(crate) fn json_body<T>(
    payload: std::result::Result<Json<T>, JsonRejection>,
    message: &str,
) -> Result<T> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::InvalidInput(message.to_string())
    })
}

/// Trimmed, non-empty form field
pub(crate) fn required(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}

/// Best candidate for the caller's address: proxy headers first, then the peer.
/// Header values that are not literal IP addresses are skipped.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip)
        .or_else(|| header("x-real-ip").and_then(parse_ip))
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
}

/// Register for early access
///
/// Upserts the signup keyed on email, enriched with a best-effort IP
/// geolocation, then sends the welcome email. The email outcome is reported
/// in `emailStatus` and never turns a stored signup into an error response.
///
/// Returns 400 when name or email is missing, before any lookup or write.
pub async fn signup(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>> {
    let payload = json_body(payload, ERR_NAME_EMAIL_REQUIRED)?;
    let (Some(name), Some(email)) = (
        required(payload.name.as_deref()),
        required(payload.email.as_deref()),
    ) else {
        return Err(AppError::InvalidInput(ERR_NAME_EMAIL_REQUIRED.to_string()));
    };

    let client_ip = ClientIp::from_candidate(client_ip(&headers, peer.map(|c| c.0)).as_deref());
    tracing::debug!("Signup from {:?}", client_ip);

    let geo = state.geo.resolve(&client_ip).await;
    if geo.is_none() {
        tracing::info!("No geolocation for signup {}", email);
    }

    let new_signup = NewSignup::new(name, email, client_ip.known().map(str::to_string), geo);
    let stored = state.store.upsert_signup(&new_signup).await?;

    tracing::info!("Signup stored: {} (id {})", stored.email, stored.id);

    let email_status = send_welcome(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &stored.email,
        &stored.name,
        EmailType::Welcome,
    )
    .await;

    Ok(Json(SignupResponse {
        success: true,
        data: stored,
        email_status,
    }))
}
