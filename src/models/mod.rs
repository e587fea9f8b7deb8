// src/models/mod.rs

//! Domain models for the relay application.

mod config;
mod meme;
mod stats;

// Re-export all public types
pub use config::{
    Config, FilterConfig, MonitoringConfig, RedditConfig, ScheduleConfig, StorageConfig,
    TelegramConfig, WebhookConfig,
};
pub use meme::Meme;
pub use stats::{ErrorEntry, RecentItem, RelayStats};
