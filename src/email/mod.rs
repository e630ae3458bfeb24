//! Outbound transactional email.

pub mod audit;
pub mod resend;
pub mod templates;
pub mod welcome;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::constants::SANDBOX_ADDRESS;

pub use resend::ResendClient;
pub use welcome::send_welcome;

/// One message as accepted by the provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Email provider rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Failed to render email: {0}")]
    Template(#[from] askama::Error),
}

/// Transactional email provider
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// Send a single message. The id is `None` when the provider accepted the
    /// message without returning one.
    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, EmailError>;

    /// Send up to one provider batch; ids are returned in message order and may
    /// be empty when the provider did not report them
    async fn send_batch(&self, messages: &[EmailMessage]) -> Result<Vec<String>, EmailError>;
}

/// Configured sender plus the addressing rules every send goes through
#[derive(Clone)]
pub struct Mailer {
    sender: Arc<dyn EmailSender>,
    from_address: String,
    test_mode: bool,
}

impl Mailer {
    pub fn new(sender: Arc<dyn EmailSender>, from_address: impl Into<String>, test_mode: bool) -> Self {
        Self {
            sender,
            from_address: from_address.into(),
            test_mode,
        }
    }

    /// Build the Resend-backed mailer, or `None` when no usable API key is configured
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, EmailError> {
        let Some(api_key) = config.usable_api_key() else {
            tracing::warn!("RESEND_API_KEY not set or too short, emails disabled");
            return Ok(None);
        };

        let client = ResendClient::new(&config.api_url, api_key)?;
        Ok(Some(Self::new(
            Arc::new(client),
            config.from_address.clone(),
            config.test_mode,
        )))
    }

    pub fn sender(&self) -> &dyn EmailSender {
        self.sender.as_ref()
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Where a message for `recipient` is actually delivered
    pub fn delivery_address(&self, recipient: &str) -> String {
        if self.test_mode {
            SANDBOX_ADDRESS.to_string()
        } else {
            recipient.to_string()
        }
    }
}

/// Email outcome reported alongside an API response
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStatus {
    pub sent: bool,
    pub error: Option<String>,
    pub id: Option<String>,
}

impl DispatchStatus {
    pub fn sent(id: Option<String>) -> Self {
        Self {
            sent: true,
            error: None,
            id,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            sent: false,
            error: Some(error.into()),
            id: None,
        }
    }
}
