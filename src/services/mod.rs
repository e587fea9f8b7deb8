//! Service layer for the relay application.
//!
//! This module contains the external collaborators:
//! - Reddit scraping (`RedditScraper`)
//! - Telegram delivery (`TelegramSender`)
//! - Webhook notifications (`WebhookNotifier`)

mod reddit;
mod telegram;
mod webhook;

pub use reddit::{
    ListingSource, Preview, PreviewImage, PreviewSource, RawPost, RedditClient, RedditScraper,
    SortMode,
};
pub use telegram::{BotApi, TelegramApi, TelegramSender, Tier, format_caption};
pub use webhook::{WebhookKind, WebhookNotifier};
