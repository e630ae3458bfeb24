use axum::{extract::State, Json};

use crate::constants::EMAIL_LOG_LIMIT;
use crate::error::Result;
use crate::models::EmailLogEntry;
use crate::AppState;

/// Most recent email audit rows, newest first
pub async fn list_email_logs(State(state): State<AppState>) -> Result<Json<Vec<EmailLogEntry>>> {
    let logs = state.store.recent_email_logs(EMAIL_LOG_LIMIT).await?;
    Ok(Json(logs))
}
