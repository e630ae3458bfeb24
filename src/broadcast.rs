//! One-to-many email to the whole signup list.
//!
//! Recipients are validated, filtered against [`BLOCKED_DOMAINS`] and
//! de-duplicated, then sent in provider-sized chunks one after another. A
//! failing chunk stops the run; chunks already sent stay sent.

use serde_json::json;
use std::collections::HashSet;

use crate::constants::{BLOCKED_DOMAINS, BROADCAST_BATCH_SIZE};
use crate::db::SignupStore;
use crate::email::{audit, templates, EmailError, EmailMessage, Mailer};
use crate::error::{AppError, Result};
use crate::models::{EmailType, NewEmailLog, Signup};

#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// Result of a broadcast run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BroadcastOutcome {
    pub recipient_count: usize,
    pub sent_count: usize,
    pub email_ids: Vec<String>,
    /// Provider error that stopped the run, if any
    pub failure: Option<String>,
}

impl BroadcastOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.sent_count == self.recipient_count
    }
}

/// Deliverable address: RFC-valid per `validator`, with a dotted domain
pub fn is_valid_email(address: &str) -> bool {
    validator::validate_email(address)
        && address
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domain.contains('.'))
}

/// Disposable, example and `.test` domains
pub fn is_blocked_domain(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    domain.ends_with(".test") || BLOCKED_DOMAINS.contains(&domain.as_str())
}

/// Valid, unblocked, de-duplicated recipients in signup order
pub fn select_recipients(signups: &[Signup]) -> Vec<Recipient> {
    let mut seen = HashSet::new();

    signups
        .iter()
        .filter_map(|signup| {
            let email = signup.email.trim();
            if !is_valid_email(email) {
                tracing::debug!("Skipping invalid address: {}", email);
                return None;
            }

            let domain = email.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
            if is_blocked_domain(domain) {
                tracing::debug!("Skipping blocked domain: {}", email);
                return None;
            }

            if !seen.insert(email.to_lowercase()) {
                return None;
            }

            Some(Recipient {
                email: email.to_string(),
                name: signup.name.clone(),
            })
        })
        .collect()
}

/// Send `message_html` to every recipient in chunks of [`BROADCAST_BATCH_SIZE`].
///
/// Fails with [`AppError::NoRecipients`] before contacting the provider when the
/// list is empty. Provider errors end the run and are reported in the outcome.
pub async fn dispatch(
    store: &dyn SignupStore,
    mailer: &Mailer,
    subject: &str,
    message_html: &str,
    from: Option<&str>,
    recipients: &[Recipient],
) -> Result<BroadcastOutcome> {
    if recipients.is_empty() {
        return Err(AppError::NoRecipients);
    }

    let from = from
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| mailer.from_address())
        .to_string();
    let mut outcome = BroadcastOutcome {
        recipient_count: recipients.len(),
        ..Default::default()
    };

    let html = match templates::broadcast_html(message_html) {
        Ok(html) => html,
        Err(e) => {
            let error = EmailError::from(e).to_string();
            tracing::error!("Broadcast not sent: {}", error);
            outcome.failure = Some(error);
            return Ok(outcome);
        }
    };

    let chunk_count = recipients.len().div_ceil(BROADCAST_BATCH_SIZE);
    tracing::info!(
        "Broadcasting '{}' to {} recipients in {} chunk(s)",
        subject,
        recipients.len(),
        chunk_count
    );

    for (index, chunk) in recipients.chunks(BROADCAST_BATCH_SIZE).enumerate() {
        let messages: Vec<EmailMessage> = chunk
            .iter()
            .map(|r| EmailMessage {
                from: from.clone(),
                to: vec![mailer.delivery_address(&r.email)],
                subject: subject.to_string(),
                html: html.clone(),
            })
            .collect();

        match mailer.sender().send_batch(&messages).await {
            Ok(ids) => {
                for (i, recipient) in chunk.iter().enumerate() {
                    let id = ids.get(i).cloned();
                    let entry = NewEmailLog::sent(
                        &recipient.email,
                        Some(recipient.name.clone()),
                        EmailType::Broadcast,
                        subject,
                        id,
                    )
                    .with_metadata(json!({
                        "chunk": index,
                        "deliveredTo": messages[i].to[0],
                        "testMode": mailer.test_mode(),
                    }));
                    audit::record(store, entry).await;
                }
                outcome.sent_count += chunk.len();
                outcome.email_ids.extend(ids);
                tracing::info!("Broadcast chunk {}/{} sent", index + 1, chunk_count);
            }
            Err(e) => {
                tracing::error!(
                    "Broadcast chunk {}/{} failed, stopping: {}",
                    index + 1,
                    chunk_count,
                    e
                );
                let error = e.to_string();
                for recipient in chunk {
                    let entry = NewEmailLog::failed(
                        &recipient.email,
                        Some(recipient.name.clone()),
                        EmailType::Broadcast,
                        subject,
                        error.clone(),
                    )
                    .with_metadata(json!({ "chunk": index }));
                    audit::record(store, entry).await;
                }
                outcome.failure = Some(error);
                break;
            }
        }
    }

    Ok(outcome)
}
