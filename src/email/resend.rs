use async_trait::async_trait;
use serde::Deserialize;

use super::{EmailError, EmailMessage, EmailSender};

/// HTTP client for the Resend API
#[derive(Debug, Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    data: Vec<SendResponse>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
    name: Option<String>,
}

impl ResendClient {
    pub fn new(api_url: &str, api_key: &str) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// POST `body` to `path`. A non-2xx status is an error; a 2xx whose body
    /// does not decode still counts as accepted and yields `None`.
    async fn post<B, R>(&self, path: &str, body: &B) -> Result<Option<R>, EmailError>
    where
        B: serde::Serialize + ?Sized + Sync,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|e| e.message.or(e.name))
                .unwrap_or(text);
            return Err(EmailError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_str::<R>(&text) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                tracing::warn!(
                    "Email provider accepted {} ({}) but the response did not decode: {}",
                    path,
                    status,
                    e
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, message: &EmailMessage) -> Result<Option<String>, EmailError> {
        let response: Option<SendResponse> = self.post("/emails", message).await?;
        Ok(response.map(|r| r.id))
    }

    async fn send_batch(&self, messages: &[EmailMessage]) -> Result<Vec<String>, EmailError> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let response: Option<BatchResponse> = self.post("/emails/batch", messages).await?;
        Ok(response
            .map(|r| r.data.into_iter().map(|item| item.id).collect())
            .unwrap_or_default())
    }
}
