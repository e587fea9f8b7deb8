//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Reddit listing settings
    #[serde(default)]
    pub reddit: RedditConfig,

    /// Post filtering settings
    #[serde(default)]
    pub filters: FilterConfig,

    /// Telegram delivery settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Scheduling settings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Monitoring / webhook settings
    #[serde(default)]
    pub monitoring: MonitoringConfig,

    /// Local persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing or unreadable file is a fatal startup error; the relay
    /// refuses to run on implicit defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.reddit.subreddits.is_empty() {
            return Err(AppError::validation("reddit.subreddits is empty"));
        }
        if self.reddit.subreddits.iter().any(|s| s.trim().is_empty()) {
            return Err(AppError::validation(
                "reddit.subreddits contains an empty name",
            ));
        }
        if self.reddit.limit == 0 {
            return Err(AppError::validation("reddit.limit must be > 0"));
        }
        if self.reddit.min_score < 0 {
            return Err(AppError::validation("reddit.min_score must be >= 0"));
        }
        if self.reddit.timeout_secs == 0 {
            return Err(AppError::validation("reddit.timeout_secs must be > 0"));
        }
        if self.filters.max_title_length == 0 {
            return Err(AppError::validation("filters.max_title_length must be > 0"));
        }
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        if self.monitoring.webhook.enabled && self.monitoring.webhook.url.trim().is_empty() {
            return Err(AppError::validation(
                "monitoring.webhook.url is required when the webhook is enabled",
            ));
        }
        Ok(())
    }
}

/// Reddit listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// Subreddits to poll, in order
    #[serde(default = "defaults::subreddits")]
    pub subreddits: Vec<String>,

    /// Listing sort: "hot", "new" or "top" (unknown values fall back to hot)
    #[serde(default = "defaults::sort_by")]
    pub sort_by: String,

    /// Maximum posts requested per subreddit
    #[serde(default = "defaults::limit")]
    pub limit: u32,

    /// Minimum post score to keep
    #[serde(default = "defaults::min_score")]
    pub min_score: i64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            subreddits: defaults::subreddits(),
            sort_by: defaults::sort_by(),
            limit: defaults::limit(),
            min_score: defaults::min_score(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Post filtering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Drop posts marked NSFW
    #[serde(default = "defaults::yes")]
    pub exclude_nsfw: bool,

    /// Maximum title length in characters
    #[serde(default = "defaults::max_title_length")]
    pub max_title_length: usize,

    /// Require a direct image link before extraction
    #[serde(default = "defaults::yes")]
    pub image_only: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_nsfw: defaults::yes(),
            max_title_length: defaults::max_title_length(),
            image_only: defaults::yes(),
        }
    }
}

/// Telegram delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Master switch; when false, delivery is a logged no-op
    #[serde(default = "defaults::yes")]
    pub enabled: bool,

    /// Delay between consecutive successful sends, in milliseconds
    #[serde(default = "defaults::pacing")]
    pub pacing_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::yes(),
            pacing_ms: defaults::pacing(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between relay cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

/// Monitoring settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonitoringConfig {
    /// Outbound webhook notifications
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Webhook notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Enable webhook notifications
    #[serde(default)]
    pub enabled: bool,

    /// Webhook endpoint URL
    #[serde(default)]
    pub url: String,

    /// Payload shape: "slack", "discord" or "generic"
    #[serde(rename = "type", default = "defaults::webhook_type")]
    pub kind: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            kind: defaults::webhook_type(),
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the sent-post ID file
    #[serde(default = "defaults::sent_posts_path")]
    pub sent_posts_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sent_posts_path: defaults::sent_posts_path(),
        }
    }
}

mod defaults {
    // Reddit defaults
    pub fn subreddits() -> Vec<String> {
        vec!["memes".into()]
    }
    pub fn sort_by() -> String {
        "hot".into()
    }
    pub fn limit() -> u32 {
        10
    }
    pub fn min_score() -> i64 {
        100
    }
    pub fn timeout() -> u64 {
        30
    }

    // Filter defaults
    pub fn yes() -> bool {
        true
    }
    pub fn max_title_length() -> usize {
        200
    }

    // Telegram defaults
    pub fn pacing() -> u64 {
        1000
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        3600
    }

    // Monitoring defaults
    pub fn webhook_type() -> String {
        "slack".into()
    }

    // Storage defaults
    pub fn sent_posts_path() -> String {
        "sent_posts.json".into()
    }
}
