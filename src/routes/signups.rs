use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Signup;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListSignupsQuery {
    /// Case-insensitive filter over name, email, location and IP
    pub search: Option<String>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupStats {
    pub total: usize,
    pub today: usize,
    pub this_week: usize,
}

impl SignupStats {
    pub fn compute(signups: &[Signup], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let week_ago = now - Duration::days(7);

        Self {
            total: signups.len(),
            today: signups
                .iter()
                .filter(|s| s.created_at.date_naive() == today)
                .count(),
            this_week: signups.iter().filter(|s| s.created_at >= week_ago).count(),
        }
    }
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render signups as CSV, one numbered row per signup
pub fn signups_to_csv(signups: &[Signup]) -> String {
    let mut rows = vec!["#,Name,Email,Location,IP,Signup Date".to_string()];

    for (index, signup) in signups.iter().enumerate() {
        let row = [
            (index + 1).to_string(),
            csv_field(&signup.name),
            csv_field(&signup.email),
            csv_field(&signup.location()),
            csv_field(signup.ip.as_deref().unwrap_or_default()),
            csv_field(&signup.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ];
        rows.push(row.join(","));
    }

    rows.join("\n")
}

/// All signups, newest first, optionally filtered by `?search=`
pub async fn list_signups(
    State(state): State<AppState>,
    Query(params): Query<ListSignupsQuery>,
) -> Result<Json<Vec<Signup>>> {
    let mut signups = state.store.list_signups().await?;

    if let Some(term) = params.search.as_deref() {
        signups.retain(|s| s.matches(term));
    }

    Ok(Json(signups))
}

/// CSV download of every signup
pub async fn export_signups(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let signups = state.store.list_signups().await?;
    let filename = format!("signups_{}.csv", Utc::now().format("%Y-%m-%d"));

    tracing::info!("Exporting {} signups as CSV", signups.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        signups_to_csv(&signups),
    ))
}

/// Signup counters for the dashboard
pub async fn signup_stats(State(state): State<AppState>) -> Result<Json<SignupStats>> {
    let signups = state.store.list_signups().await?;
    Ok(Json(SignupStats::compute(&signups, Utc::now())))
}
