//! Cumulative relay statistics.
//!
//! Process-lifetime counters and bounded trailing windows consumed by the
//! monitoring sink. Nothing here is persisted; a restart starts from zero.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Maximum retained error entries.
const ERROR_WINDOW: usize = 10;

/// Maximum retained recently-relayed items.
const RECENT_WINDOW: usize = 20;

/// A recorded delivery failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// A recently relayed meme, kept for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RecentItem {
    pub at: DateTime<Utc>,
    pub title: String,
    pub subreddit: String,
}

/// Cumulative statistics over the process lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct RelayStats {
    /// Total memes found by the scraper
    pub scraped: u64,

    /// Total memes delivered
    pub sent: u64,

    /// Total delivery failures
    pub failed: u64,

    /// Completion time of the last cycle
    pub last_run: Option<DateTime<Utc>>,

    /// Most recent error message
    pub last_error: Option<String>,

    /// Delivered memes per subreddit
    pub subreddit_stats: HashMap<String, u64>,

    /// Trailing window of errors
    pub errors: VecDeque<ErrorEntry>,

    /// Trailing window of relayed items
    pub recent: VecDeque<RecentItem>,

    /// Process start time
    pub uptime_start: DateTime<Utc>,
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            scraped: 0,
            sent: 0,
            failed: 0,
            last_run: None,
            last_error: None,
            subreddit_stats: HashMap::new(),
            errors: VecDeque::new(),
            recent: VecDeque::new(),
            uptime_start: Utc::now(),
        }
    }

    /// Record memes found by the scraper.
    pub fn record_scraped(&mut self, count: u64) {
        self.scraped += count;
    }

    /// Record a successful delivery.
    pub fn record_sent(&mut self, title: &str, subreddit: &str) {
        self.sent += 1;
        *self
            .subreddit_stats
            .entry(subreddit.to_string())
            .or_insert(0) += 1;

        self.recent.push_back(RecentItem {
            at: Utc::now(),
            title: title.to_string(),
            subreddit: subreddit.to_string(),
        });
        while self.recent.len() > RECENT_WINDOW {
            self.recent.pop_front();
        }
    }

    /// Record a delivery failure.
    pub fn record_failed(&mut self, message: &str) {
        self.failed += 1;
        self.last_error = Some(message.to_string());

        self.errors.push_back(ErrorEntry {
            at: Utc::now(),
            message: message.to_string(),
        });
        while self.errors.len() > ERROR_WINDOW {
            self.errors.pop_front();
        }
    }

    /// Mark a cycle as completed.
    pub fn record_run_complete(&mut self) {
        self.last_run = Some(Utc::now());
    }

    /// Subreddit with the most deliveries, if any.
    pub fn top_subreddit(&self) -> Option<(&str, u64)> {
        self.subreddit_stats
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(name, count)| (name.as_str(), *count))
    }

    /// Uptime since process start.
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.uptime_start
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}
