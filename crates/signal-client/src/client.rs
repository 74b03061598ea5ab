//! Signal HTTP client.

use crate::error::SignalError;
use crate::types::*;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use urlencoding::encode;

/// Signal CLI REST API client bound to one bot account.
#[derive(Clone)]
pub struct SignalClient {
    client: Client,
    base_url: String,
    phone_number: String,
}

impl SignalClient {
    pub fn new(
        base_url: impl Into<String>,
        phone_number: impl Into<String>,
    ) -> Result<Self, SignalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            phone_number: phone_number.into(),
        })
    }

    /// The bot account's phone number.
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// Check if the Signal API is healthy.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/v1/health", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Receive pending messages for the bot account.
    #[instrument(skip(self))]
    pub async fn receive(&self) -> Result<Vec<IncomingMessage>, SignalError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/receive/{}",
                self.base_url,
                encode(&self.phone_number)
            ))
            .send()
            .await?;

        let response = ensure_success(response, SignalError::Api).await?;
        let messages: Vec<IncomingMessage> = response.json().await?;
        debug!("Received {} messages", messages.len());
        Ok(messages)
    }

    /// Send a message. Returns the timestamp identifying the new message,
    /// which is the handle later edits refer to.
    #[instrument(skip(self, message))]
    pub async fn send(&self, recipient: &str, message: &str) -> Result<Option<i64>, SignalError> {
        let sent = self.post_message(recipient, message, None).await?;
        debug!("Sent message to {}", recipient);
        Ok(sent)
    }

    /// Replace the text of a message the bot sent earlier.
    #[instrument(skip(self, message))]
    pub async fn edit(
        &self,
        recipient: &str,
        target_timestamp: i64,
        message: &str,
    ) -> Result<(), SignalError> {
        self.post_message(recipient, message, Some(target_timestamp))
            .await?;
        debug!("Edited message {} in {}", target_timestamp, recipient);
        Ok(())
    }

    /// Set a group's description.
    #[instrument(skip(self, description))]
    pub async fn update_group_description(
        &self,
        group_id: &str,
        description: &str,
    ) -> Result<(), SignalError> {
        let request = UpdateGroupRequest {
            description: description.to_string(),
        };

        let response = self
            .client
            .put(format!(
                "{}/v1/groups/{}/{}",
                self.base_url,
                encode(&self.phone_number),
                encode(group_id)
            ))
            .json(&request)
            .send()
            .await?;

        ensure_success(response, SignalError::GroupUpdateFailed).await?;
        debug!("Updated description of {}", group_id);
        Ok(())
    }

    async fn post_message(
        &self,
        recipient: &str,
        message: &str,
        edit_timestamp: Option<i64>,
    ) -> Result<Option<i64>, SignalError> {
        let request = SendMessageRequest {
            message: message.to_string(),
            number: Some(self.phone_number.clone()),
            recipients: Some(vec![recipient.to_string()]),
            edit_timestamp,
        };

        let response = self
            .client
            .post(format!("{}/v2/send", self.base_url))
            .json(&request)
            .send()
            .await?;

        let response = ensure_success(response, SignalError::SendFailed).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let parsed: SendMessageResponse = serde_json::from_str(&body)?;
        Ok(parsed.sent_at())
    }
}

async fn ensure_success(
    response: Response,
    error: fn(String) -> SignalError,
) -> Result<Response, SignalError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let msg = response.text().await.unwrap_or_default();
    warn!("Signal API returned {}: {}", status, msg);
    Err(error(msg))
}
