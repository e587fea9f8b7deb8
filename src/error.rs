// src/error.rs

//! Unified error handling for the relay application.

use std::fmt;

use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Reddit authentication error
    #[error("Reddit auth error: {0}")]
    Auth(String),

    /// Scraping error for a single subreddit
    #[error("Scrape error for r/{subreddit}: {message}")]
    Scrape { subreddit: String, message: String },

    /// Telegram Bot API rejected a request
    #[error("Telegram error: {description}")]
    Telegram { description: String },

    /// Webhook notification error
    #[error("Webhook error: {0}")]
    Webhook(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create a scrape error with subreddit context.
    pub fn scrape(subreddit: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Scrape {
            subreddit: subreddit.into(),
            message: message.to_string(),
        }
    }

    /// Create a Telegram API error.
    pub fn telegram(description: impl Into<String>) -> Self {
        Self::Telegram {
            description: description.into(),
        }
    }

    /// Whether this error is a Telegram media rejection that warrants
    /// retrying the same URL as a document instead of a photo.
    ///
    /// Matches the two error classes the Bot API reports when it cannot
    /// accept a remote photo: invalid dimensions, or failure to fetch the
    /// URL contents. Anything else (bad chat, bad token, transport errors)
    /// must not trigger the document fallback.
    pub fn is_media_fallback(&self) -> bool {
        match self {
            Self::Telegram { description } => {
                let d = description.to_lowercase();
                d.contains("photo_invalid_dimensions")
                    || d.contains("failed to get http url content")
            }
            _ => false,
        }
    }
}
