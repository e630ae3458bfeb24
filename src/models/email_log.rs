use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of message an audit row refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
    Welcome,
    ResendWelcome,
    Broadcast,
}

impl EmailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailType::Welcome => "welcome",
            EmailType::ResendWelcome => "resend_welcome",
            EmailType::Broadcast => "broadcast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Sent,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }
}

/// Append-only audit row for every send attempt
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailLogEntry {
    pub id: i32,
    pub email: String,
    pub recipient_name: Option<String>,
    pub email_type: String,
    pub subject: Option<String>,
    pub status: String,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEmailLog {
    pub email: String,
    pub recipient_name: Option<String>,
    pub email_type: EmailType,
    pub subject: Option<String>,
    pub status: EmailStatus,
    pub provider_message_id: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Value,
}

impl NewEmailLog {
    pub fn sent(
        email: impl Into<String>,
        recipient_name: Option<String>,
        email_type: EmailType,
        subject: impl Into<String>,
        provider_message_id: Option<String>,
    ) -> Self {
        Self {
            email: email.into(),
            recipient_name,
            email_type,
            subject: Some(subject.into()),
            status: EmailStatus::Sent,
            provider_message_id,
            error_message: None,
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn failed(
        email: impl Into<String>,
        recipient_name: Option<String>,
        email_type: EmailType,
        subject: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            recipient_name,
            email_type,
            subject: Some(subject.into()),
            status: EmailStatus::Failed,
            provider_message_id: None,
            error_message: Some(error_message.into()),
            metadata: Value::Object(Default::default()),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Materialize as a stored row (used by the in-memory store)
    pub fn into_entry(self, id: i32, created_at: DateTime<Utc>) -> EmailLogEntry {
        EmailLogEntry {
            id,
            email: self.email,
            recipient_name: self.recipient_name,
            email_type: self.email_type.as_str().to_string(),
            subject: self.subject,
            status: self.status.as_str().to_string(),
            provider_message_id: self.provider_message_id,
            error_message: self.error_message,
            metadata: Some(self.metadata),
            created_at,
        }
    }
}
