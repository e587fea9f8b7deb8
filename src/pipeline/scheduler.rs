// src/pipeline/scheduler.rs

//! Relay scheduler.
//!
//! Drives `run_cycle` on a fixed wall-clock interval. The first cycle
//! runs immediately. Cycles never overlap: there is a single task, and
//! each tick awaits the full cycle before the next one can fire.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::models::Config;
use crate::monitor::Monitor;
use crate::services::{RedditScraper, TelegramSender};
use crate::storage::SentStore;

use super::cycle::run_cycle;

/// Run relay cycles forever on the configured interval.
pub async fn run_forever(
    config: &Config,
    scraper: RedditScraper,
    sender: TelegramSender,
    mut store: SentStore,
    mut monitor: Monitor,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.schedule.interval_secs));
    // A slow cycle should push the next one out, not trigger a burst.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        log::info!("Starting relay cycle");
        let outcome = run_cycle(&scraper, &sender, &mut store).await;
        monitor.record_cycle(&outcome).await;
        log::info!("Cycle complete: {}", outcome.summary());
        log::debug!("{}", monitor.report());
    }
}
