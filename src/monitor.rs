// src/monitor.rs

//! Observability sink.
//!
//! Consumes cycle outcomes, keeps the cumulative [`RelayStats`], and emits
//! webhook notifications for notable events. Nothing in here can fail the
//! pipeline: webhook errors are logged and swallowed.

use crate::models::{MonitoringConfig, RelayStats};
use crate::pipeline::CycleOutcome;
use crate::services::WebhookNotifier;

/// Statistics aggregator and alert dispatcher.
pub struct Monitor {
    stats: RelayStats,
    webhook: Option<WebhookNotifier>,
}

impl Monitor {
    pub fn new(config: &MonitoringConfig) -> Self {
        let webhook = if config.webhook.enabled {
            match WebhookNotifier::new(&config.webhook) {
                Ok(notifier) => Some(notifier),
                Err(e) => {
                    log::warn!("Webhook disabled: {e}");
                    None
                }
            }
        } else {
            None
        };

        Self {
            stats: RelayStats::new(),
            webhook,
        }
    }

    /// Current cumulative statistics.
    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Fold a cycle outcome into the stats and alert when warranted.
    pub async fn record_cycle(&mut self, outcome: &CycleOutcome) {
        self.stats.record_scraped(outcome.found as u64);
        for meme in &outcome.relayed {
            self.stats.record_sent(&meme.title, &meme.subreddit);
        }
        for error in &outcome.errors {
            self.stats.record_failed(error);
        }
        self.stats.record_run_complete();

        if outcome.failed > 0 {
            self.notify(
                &format!(
                    "⚠️ Sent {}/{} memes. {} failed.",
                    outcome.sent, outcome.found, outcome.failed
                ),
                "warning",
            )
            .await;
        } else if outcome.sent > 0 {
            self.notify(
                &format!("✅ Successfully sent {} memes", outcome.sent),
                "info",
            )
            .await;
        }
    }

    /// Announce process startup.
    pub async fn notify_startup(&self) {
        self.notify("🚀 Meme relay started successfully", "info").await;
    }

    /// Send a webhook notification, if one is configured.
    pub async fn notify(&self, message: &str, level: &str) {
        if let Some(webhook) = &self.webhook {
            if let Err(e) = webhook.send(message, level).await {
                log::error!("Webhook notification failed: {e}");
            }
        }
    }

    /// Format a cumulative status report.
    pub fn report(&self) -> String {
        let uptime = self.stats.uptime();
        let mut report = format!(
            "📊 Status Report\nUptime: {}d {}h\nScraped: {} memes\nSent: {} memes\nFailed: {} memes\n",
            uptime.num_days(),
            uptime.num_hours() % 24,
            self.stats.scraped,
            self.stats.sent,
            self.stats.failed,
        );

        if let Some((subreddit, count)) = self.stats.top_subreddit() {
            report.push_str(&format!("Top subreddit: r/{subreddit} ({count} memes)\n"));
        }

        if let Some(last_error) = &self.stats.last_error {
            let head: String = last_error.chars().take(100).collect();
            report.push_str(&format!("Last error: {head}\n"));
        }

        report
    }
}
