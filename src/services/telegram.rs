// src/services/telegram.rs

//! Telegram delivery service.
//!
//! Sends each meme through a three-tier fallback chain: inline photo,
//! then document (only for media rejections the Bot API is known to emit
//! for remote photos), then a plain text message with links. A short
//! pacing delay follows every successful send to stay under rate limits.

use std::env;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::{Config, Meme};
use crate::utils::http;

/// Telegram caption hard limit.
const CAPTION_LIMIT: usize = 1024;

const ELLIPSIS: &str = "...";

/// Which fallback tier ultimately delivered a meme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Photo,
    Document,
    Text,
}

/// The three send primitives of the delivery endpoint.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    async fn send_photo(&self, chat_id: &str, photo: &str, caption: &str) -> Result<()>;
    async fn send_document(&self, chat_id: &str, document: &str, caption: &str) -> Result<()>;
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API transport over HTTPS.
pub struct BotApi {
    client: reqwest::Client,
    base: String,
}

impl BotApi {
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self> {
        let user_agent = concat!("meme-relay/", env!("CARGO_PKG_VERSION"));
        let client = http::create_client(user_agent, timeout_secs)?;
        Ok(Self {
            client,
            base: format!("https://api.telegram.org/bot{token}"),
        })
    }

    async fn call(&self, method: &str, payload: serde_json::Value) -> Result<()> {
        let url = format!("{}/{}", self.base, method);
        let response: ApiResponse = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if response.ok {
            Ok(())
        } else {
            Err(AppError::telegram(
                response
                    .description
                    .unwrap_or_else(|| "unknown Bot API error".to_string()),
            ))
        }
    }
}

#[async_trait]
impl TelegramApi for BotApi {
    async fn send_photo(&self, chat_id: &str, photo: &str, caption: &str) -> Result<()> {
        self.call(
            "sendPhoto",
            json!({
                "chat_id": chat_id,
                "photo": photo,
                "caption": caption,
                "parse_mode": "Markdown",
            }),
        )
        .await
    }

    async fn send_document(&self, chat_id: &str, document: &str, caption: &str) -> Result<()> {
        self.call(
            "sendDocument",
            json!({
                "chat_id": chat_id,
                "document": document,
                "caption": caption,
                "parse_mode": "Markdown",
            }),
        )
        .await
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
                "disable_web_page_preview": false,
            }),
        )
        .await
    }
}

/// Service for delivering memes to a Telegram chat.
pub struct TelegramSender {
    api: Box<dyn TelegramApi>,
    chat_id: String,
    enabled: bool,
    pacing: Duration,
}

impl TelegramSender {
    /// Build a sender from environment credentials.
    ///
    /// Requires `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`; a missing
    /// value is fatal.
    pub fn new(config: &Config) -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::config("TELEGRAM_BOT_TOKEN is not set"))?;
        let chat_id = env::var("TELEGRAM_CHAT_ID")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::config("TELEGRAM_CHAT_ID is not set"))?;

        let api = BotApi::new(&token, config.telegram.timeout_secs)?;

        log::info!("Telegram sender initialized");
        Ok(Self::with_api(config, Box::new(api), chat_id))
    }

    /// Create a sender over an arbitrary transport.
    pub fn with_api(config: &Config, api: Box<dyn TelegramApi>, chat_id: String) -> Self {
        Self {
            api,
            chat_id,
            enabled: config.telegram.enabled,
            pacing: Duration::from_millis(config.telegram.pacing_ms),
        }
    }

    /// Deliver memes one at a time, in order.
    ///
    /// Returns one outcome per input meme. When delivery is disabled or
    /// the input is empty, this is a logged no-op returning no outcomes.
    pub async fn send_memes(&self, memes: &[Meme]) -> Vec<Result<Tier>> {
        if !self.enabled {
            log::info!("Telegram sending is disabled");
            return Vec::new();
        }
        if memes.is_empty() {
            log::info!("No memes to send");
            return Vec::new();
        }

        let mut outcomes = Vec::with_capacity(memes.len());
        for meme in memes {
            let outcome = self.send_one(meme).await;
            match &outcome {
                Ok(tier) => {
                    log::info!("Sent meme via {tier:?}: {}", preview(&meme.title));
                    tokio::time::sleep(self.pacing).await;
                }
                Err(e) => {
                    log::error!("Failed to send meme {}: {e}", meme.id);
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Run one meme through the fallback chain.
    async fn send_one(&self, meme: &Meme) -> Result<Tier> {
        let caption = format_caption(meme);

        match self
            .api
            .send_photo(&self.chat_id, &meme.image_url, &caption)
            .await
        {
            Ok(()) => return Ok(Tier::Photo),
            Err(e) if e.is_media_fallback() => {
                log::warn!("Photo rejected for {} ({e}), retrying as document", meme.id);
            }
            // Anything else is not a media problem; do not fall back.
            Err(e) => return Err(e),
        }

        match self
            .api
            .send_document(&self.chat_id, &meme.image_url, &caption)
            .await
        {
            Ok(()) => Ok(Tier::Document),
            Err(e) => {
                log::warn!(
                    "Document send failed for {} ({e}), falling back to text",
                    meme.id
                );
                self.api
                    .send_message(&self.chat_id, &format_text_message(meme))
                    .await?;
                Ok(Tier::Text)
            }
        }
    }
}

/// Format the caption used by the photo and document tiers.
pub fn format_caption(meme: &Meme) -> String {
    let caption = format!(
        "*{}*\n\n📍 r/{}\n⬆️ {} upvotes\n👤 u/{}\n\n[View on Reddit]({})",
        meme.title, meme.subreddit, meme.score, meme.author, meme.permalink
    );
    truncate_caption(&caption, CAPTION_LIMIT)
}

/// Format the text-tier message.
fn format_text_message(meme: &Meme) -> String {
    format!(
        "*{}*\n\nr/{} • {} upvotes\n[View Image]({})\n[Reddit Post]({})",
        meme.title, meme.subreddit, meme.score, meme.image_url, meme.permalink
    )
}

/// Truncate a caption to `limit` characters, ellipsis included.
///
/// Truncation applies to the formatted string as a whole; a caption at the
/// limit is returned untouched.
fn truncate_caption(text: &str, limit: usize) -> String {
    if text.graphemes(true).count() <= limit {
        return text.to_string();
    }

    let keep: String = text.graphemes(true).take(limit - ELLIPSIS.len()).collect();
    format!("{keep}{ELLIPSIS}")
}

/// Shortened title for log lines.
fn preview(title: &str) -> String {
    if title.chars().count() <= 50 {
        title.to_string()
    } else {
        let head: String = title.chars().take(50).collect();
        format!("{head}...")
    }
}
