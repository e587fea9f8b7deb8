//! Meme data structure.

use serde::{Deserialize, Serialize};

/// A normalized meme extracted from a Reddit post.
///
/// Only posts with a resolvable direct image URL become `Meme`s; anything
/// else is dropped during extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meme {
    /// Stable Reddit post ID, used as the dedup key
    pub id: String,

    /// Post title
    pub title: String,

    /// Original post URL
    pub url: String,

    /// Resolved direct image URL
    pub image_url: String,

    /// Post score at fetch time
    pub score: i64,

    /// Subreddit the post was fetched from
    pub subreddit: String,

    /// Post author, "Unknown" when absent
    pub author: String,

    /// Creation time, seconds since epoch
    pub created_utc: f64,

    /// Canonical absolute link to the post
    pub permalink: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_round_trip() {
        let meme = Meme {
            id: "abc123".into(),
            title: "A meme".into(),
            url: "https://i.redd.it/abc123.jpg".into(),
            image_url: "https://i.redd.it/abc123.jpg".into(),
            score: 1234,
            subreddit: "memes".into(),
            author: "someone".into(),
            created_utc: 1_700_000_000.0,
            permalink: "https://reddit.com/r/memes/comments/abc123/a_meme/".into(),
        };

        let json = serde_json::to_string(&meme).unwrap();
        let back: Meme = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meme);
    }
}
