//! Notification sinks: console log and Discord-style webhook.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::ports::{Notification, NotifierPort, NotifyError};

/// Logs every notification at info level
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifierPort for ConsoleNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.flags.is_empty() {
            info!("[{}] {}", notification.title, notification.message);
        } else {
            info!(
                "[{}] {} ({})",
                notification.title,
                notification.message,
                notification.flags.join(", ")
            );
        }
        Ok(())
    }
}

/// Body posted to the webhook
pub fn webhook_payload(notification: &Notification) -> serde_json::Value {
    json!({ "content": format!("**{}**\n{}", notification.title, notification.message) })
}

#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    http: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Delivery(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl NotifierPort for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.url)
            .json(&webhook_payload(notification))
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
