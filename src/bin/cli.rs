//! meme-relay CLI
//!
//! Local execution entry point: runs the relay loop, a single cycle, or a
//! configuration check.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use meme_relay::{
    error::Result,
    models::Config,
    monitor::Monitor,
    pipeline,
    services::{RedditScraper, TelegramSender},
    storage::SentStore,
};

/// meme-relay - Reddit to Telegram meme relay
#[derive(Parser, Debug)]
#[command(name = "meme-relay", version, about = "Reddit → Telegram meme relay")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll and relay on the configured interval
    Run,

    /// Run a single relay cycle and exit
    Once,

    /// Validate configuration and credentials, then exit
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may live in a local .env file.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("meme-relay starting...");

    let config = Config::load(&cli.config)?;
    config.validate()?;
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Validate => {
            RedditScraper::new(&config)?;
            TelegramSender::new(&config)?;
            log::info!("Configuration OK");
        }

        Command::Once => {
            let scraper = RedditScraper::new(&config)?;
            let sender = TelegramSender::new(&config)?;
            let mut store = SentStore::load(&config.storage.sent_posts_path).await;
            let mut monitor = Monitor::new(&config.monitoring);

            let outcome = pipeline::run_cycle(&scraper, &sender, &mut store).await;
            monitor.record_cycle(&outcome).await;
            log::info!("Cycle complete: {}", outcome.summary());
            log::info!("{}", monitor.report());
        }

        Command::Run => {
            let scraper = RedditScraper::new(&config)?;
            let sender = TelegramSender::new(&config)?;
            let store = SentStore::load(&config.storage.sent_posts_path).await;
            let monitor = Monitor::new(&config.monitoring);

            monitor.notify_startup().await;
            log::info!(
                "Scheduler set up to run every {} seconds",
                config.schedule.interval_secs
            );

            pipeline::run_forever(&config, scraper, sender, store, monitor).await;
        }
    }

    Ok(())
}
