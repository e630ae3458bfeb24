use crate::db::SignupStore;
use crate::models::NewEmailLog;

/// Append an audit row for a send attempt.
///
/// Returns the row id, or `None` when the write failed. A failed write is
/// logged and never propagated: the audit trail must not break the send path.
pub async fn record(store: &dyn SignupStore, entry: NewEmailLog) -> Option<i32> {
    match store.insert_email_log(&entry).await {
        Ok(id) => {
            tracing::debug!(
                "Email event logged: {} to {} - {}",
                entry.email_type.as_str(),
                entry.email,
                entry.status.as_str()
            );
            Some(id)
        }
        Err(e) => {
            tracing::warn!("Email logging skipped for {}: {}", entry.email, e);
            None
        }
    }
}
