use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::security::{issue_token, secrets_match, verify_token};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub token: String,
    pub expires_at: String,
}

/// Exchange the admin credential for a bearer token
///
/// POST /api/admin/login. Returns 404 when no admin password is configured,
/// in which case the admin routes are open.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>> {
    let admin = state
        .config
        .admin
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Admin login disabled".to_string()))?;

    let email_ok = admin.email.is_empty()
        || admin.email.trim().eq_ignore_ascii_case(payload.email.trim());
    let password_ok = secrets_match(&payload.password, &admin.password, &admin.token_secret);

    if !(email_ok && password_ok) {
        tracing::warn!("Invalid admin login attempt");
        return Err(AppError::Unauthorized);
    }

    let (token, expires_at) = issue_token(
        &admin.token_secret,
        Utc::now().timestamp(),
        admin.token_ttl_secs,
    )
    .ok_or(AppError::Unauthorized)?;

    tracing::info!("Admin login succeeded");

    Ok(Json(AdminLoginResponse {
        token,
        expires_at: DateTime::from_timestamp(expires_at, 0)
            .unwrap_or_else(Utc::now)
            .to_rfc3339(),
    }))
}

/// Require a valid admin bearer token when an admin password is configured
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let Some(admin) = state.config.admin.as_ref() else {
        return Ok(next.run(request).await);
    };

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| {
            verify_token(token.trim(), &admin.token_secret, Utc::now().timestamp())
        });

    if !authorized {
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
