use serde_json::json;

use super::{audit, templates, DispatchStatus, EmailError, EmailMessage, Mailer};
use crate::constants::{ERR_EMAIL_NOT_CONFIGURED, WELCOME_SUBJECT};
use crate::db::SignupStore;
use crate::models::{EmailType, NewEmailLog};

/// Send the welcome email to `email` and record the attempt.
///
/// Never fails: provider errors and a missing email configuration are
/// reported through the returned status and the audit trail.
pub async fn send_welcome(
    store: &dyn SignupStore,
    mailer: Option<&Mailer>,
    email: &str,
    display_name: &str,
    email_type: EmailType,
) -> DispatchStatus {
    let recipient_name = Some(display_name.to_string());

    let Some(mailer) = mailer else {
        tracing::warn!("Email service not configured, skipping {} email", email_type.as_str());
        audit::record(
            store,
            NewEmailLog::failed(email, recipient_name, email_type, WELCOME_SUBJECT, ERR_EMAIL_NOT_CONFIGURED),
        )
        .await;
        return DispatchStatus::failed(ERR_EMAIL_NOT_CONFIGURED);
    };

    let html = match templates::welcome_html(display_name) {
        Ok(html) => html,
        Err(e) => {
            let error = EmailError::from(e).to_string();
            tracing::error!("{}", error);
            audit::record(
                store,
                NewEmailLog::failed(email, recipient_name, email_type, WELCOME_SUBJECT, error.clone()),
            )
            .await;
            return DispatchStatus::failed(error);
        }
    };

    let delivered_to = mailer.delivery_address(email);
    let message = EmailMessage {
        from: mailer.from_address().to_string(),
        to: vec![delivered_to.clone()],
        subject: WELCOME_SUBJECT.to_string(),
        html,
    };
    let metadata = json!({
        "deliveredTo": delivered_to,
        "testMode": mailer.test_mode(),
    });

    tracing::info!("Sending {} email to {} for {}", email_type.as_str(), delivered_to, email);

    let (status, entry) = match mailer.sender().send(&message).await {
        Ok(id) => (
            DispatchStatus::sent(id.clone()),
            NewEmailLog::sent(email, recipient_name, email_type, WELCOME_SUBJECT, id),
        ),
        Err(e) => {
            tracing::warn!("Welcome email to {} failed: {}", email, e);
            let error = e.to_string();
            (
                DispatchStatus::failed(error.clone()),
                NewEmailLog::failed(email, recipient_name, email_type, WELCOME_SUBJECT, error),
            )
        }
    };

    audit::record(store, entry.with_metadata(metadata)).await;
    status
}
