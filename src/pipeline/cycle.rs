// src/pipeline/cycle.rs

//! One relay cycle: fetch, filter, deliver, count.

use crate::models::Meme;
use crate::services::{RedditScraper, TelegramSender};
use crate::storage::SentStore;

/// Aggregate result of a single cycle.
///
/// `found`, `sent` and `failed` are the headline counts; `relayed` and
/// `errors` carry the detail the monitoring sink needs.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// New memes returned by the scraper
    pub found: usize,

    /// Memes delivered on some tier
    pub sent: usize,

    /// Memes whose delivery failed terminally
    pub failed: usize,

    /// The delivered memes, in send order
    pub relayed: Vec<Meme>,

    /// Error text for each failed delivery
    pub errors: Vec<String>,
}

impl CycleOutcome {
    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "found={} sent={} failed={}",
            self.found, self.sent, self.failed
        )
    }
}

/// Run one poll-filter-deliver cycle.
///
/// Never fails: every internal error has already been converted into a
/// logged, counted outcome by the time this returns.
pub async fn run_cycle(
    scraper: &RedditScraper,
    sender: &TelegramSender,
    store: &mut SentStore,
) -> CycleOutcome {
    let memes = scraper.fetch_new_memes(store).await;
    if memes.is_empty() {
        log::info!("No new memes found");
        return CycleOutcome::default();
    }

    let results = sender.send_memes(&memes).await;

    let mut outcome = CycleOutcome {
        found: memes.len(),
        ..CycleOutcome::default()
    };

    for (meme, result) in memes.iter().zip(&results) {
        match result {
            Ok(_tier) => {
                outcome.sent += 1;
                outcome.relayed.push(meme.clone());
            }
            Err(e) => {
                outcome.failed += 1;
                outcome.errors.push(e.to_string());
            }
        }
    }

    log::info!(
        "Sent {} memes successfully, {} failed",
        outcome.sent,
        outcome.failed
    );
    outcome
}
