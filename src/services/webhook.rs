// src/services/webhook.rs

//! Webhook notification sender.
//!
//! Posts short status messages to a Slack, Discord or generic JSON
//! endpoint. Notification failures are reported to the caller but never
//! affect the relay pipeline.

use serde_json::json;

use crate::error::{AppError, Result};
use crate::models::WebhookConfig;
use crate::utils::http;

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Supported webhook payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    Slack,
    Discord,
    Generic,
}

impl WebhookKind {
    /// Parse a configured kind name. Unknown values use the generic shape.
    pub fn parse(s: &str) -> Self {
        match s {
            "slack" => Self::Slack,
            "discord" => Self::Discord,
            _ => Self::Generic,
        }
    }
}

/// Sender for outbound webhook notifications.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    kind: WebhookKind,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(AppError::config("Webhook URL not configured"));
        }

        let user_agent = concat!("meme-relay/", env!("CARGO_PKG_VERSION"));
        let client = http::create_client(user_agent, WEBHOOK_TIMEOUT_SECS)?;

        Ok(Self {
            client,
            url: config.url.clone(),
            kind: WebhookKind::parse(&config.kind),
        })
    }

    /// Build the payload for this notifier's endpoint type.
    fn payload(&self, message: &str, level: &str) -> serde_json::Value {
        match self.kind {
            WebhookKind::Slack => json!({
                "text": format!("🤖 Meme Relay: {message}"),
                "username": "Meme Bot",
            }),
            WebhookKind::Discord => json!({
                "content": format!("🤖 **Meme Relay**: {message}"),
            }),
            WebhookKind::Generic => json!({
                "message": message,
                "level": level,
            }),
        }
    }

    /// Post a notification.
    pub async fn send(&self, message: &str, level: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(message, level))
            .send()
            .await?;

        response
            .error_for_status()
            .map_err(|e| AppError::Webhook(e.to_string()))?;
        Ok(())
    }
}
