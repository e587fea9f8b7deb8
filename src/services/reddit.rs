// src/services/reddit.rs

//! Reddit scraper service.
//!
//! Fetches ranked listings from the configured subreddits, filters them,
//! and extracts normalized memes. Posts whose IDs are already in the
//! [`SentStore`] are skipped, and newly extracted IDs are added to it so a
//! post is relayed at most once per store lifetime.

use std::env;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Config, FilterConfig, Meme, RedditConfig};
use crate::storage::SentStore;
use crate::utils::http;
use crate::utils::media::{is_direct_image_host, is_image_url, unescape_preview_url};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE: &str = "https://oauth.reddit.com";

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Hot,
    New,
    Top,
}

impl SortMode {
    /// Parse a configured sort name. Unknown values fall back to `Hot`.
    pub fn parse(s: &str) -> Self {
        match s {
            "hot" => Self::Hot,
            "new" => Self::New,
            "top" => Self::Top,
            other => {
                log::warn!("Unknown sort mode '{other}', falling back to hot");
                Self::Hot
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::New => "new",
            Self::Top => "top",
        }
    }
}

/// A raw post as returned by the listing API.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub title: String,
    pub url: String,

    #[serde(default)]
    pub score: i64,

    #[serde(default)]
    pub over_18: bool,

    #[serde(default)]
    pub post_hint: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub created_utc: f64,

    pub permalink: String,

    #[serde(default)]
    pub preview: Option<Preview>,
}

/// Embedded preview image set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Vec<PreviewImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewImage {
    #[serde(default)]
    pub source: Option<PreviewSource>,

    /// Rescaled variants, ordered smallest to largest
    #[serde(default)]
    pub resolutions: Vec<PreviewSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewSource {
    pub url: String,
}

// Listing envelope
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: RawPost,
}

/// Source of raw listings for one subreddit.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listing(
        &self,
        subreddit: &str,
        sort: SortMode,
        limit: u32,
    ) -> Result<Vec<RawPost>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_expiry")]
    expires_in: u64,
}

fn default_token_expiry() -> u64 {
    3600
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Reddit API client using application-only OAuth2.
pub struct RedditClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    /// Build a client from environment credentials.
    ///
    /// Requires `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET` and
    /// `REDDIT_USER_AGENT`; a missing value is fatal.
    pub fn from_env(config: &RedditConfig) -> Result<Self> {
        let client_id = require_env("REDDIT_CLIENT_ID")?;
        let client_secret = require_env("REDDIT_CLIENT_SECRET")?;
        let user_agent = require_env("REDDIT_USER_AGENT")?;

        let client = http::create_client(&user_agent, config.timeout_secs)?;

        log::info!("Reddit client initialized");
        Ok(Self {
            client,
            client_id,
            client_secret,
            token: Mutex::new(None),
        })
    }

    /// Get a bearer token, refreshing the cached one when close to expiry.
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;

        // Refresh a minute early so a token never expires mid-listing.
        let expires_at = Instant::now() + Duration::from_secs(token.expires_in.saturating_sub(60));
        let access = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });

        Ok(access)
    }
}

#[async_trait]
impl ListingSource for RedditClient {
    async fn fetch_listing(
        &self,
        subreddit: &str,
        sort: SortMode,
        limit: u32,
    ) -> Result<Vec<RawPost>> {
        let token = self.access_token().await?;
        let url = format!("{OAUTH_BASE}/r/{subreddit}/{}", sort.as_str());

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&[("limit", limit.to_string()), ("raw_json", "1".to_string())]);

        // Top listings need a time window; a day keeps the feed fresh.
        if sort == SortMode::Top {
            request = request.query(&[("t", "day")]);
        }

        let listing: Listing = request.send().await?.error_for_status()?.json().await?;
        Ok(listing.data.children.into_iter().map(|c| c.data).collect())
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::config(format!("{name} is not set")))
}

/// Service for scraping memes from configured subreddits.
pub struct RedditScraper {
    reddit: RedditConfig,
    filters: FilterConfig,
    source: Box<dyn ListingSource>,
}

impl RedditScraper {
    /// Create a scraper backed by the real Reddit API.
    pub fn new(config: &Config) -> Result<Self> {
        let client = RedditClient::from_env(&config.reddit)?;
        Ok(Self::with_source(config, Box::new(client)))
    }

    /// Create a scraper over an arbitrary listing source.
    pub fn with_source(config: &Config, source: Box<dyn ListingSource>) -> Self {
        Self {
            reddit: config.reddit.clone(),
            filters: config.filters.clone(),
            source,
        }
    }

    /// Fetch new memes from all configured subreddits, in order.
    ///
    /// Newly extracted IDs are added to `store` immediately; the store is
    /// persisted once after all subreddits are processed. A failure on one
    /// subreddit is logged and does not abort the rest.
    pub async fn fetch_new_memes(&self, store: &mut SentStore) -> Vec<Meme> {
        let sort = SortMode::parse(&self.reddit.sort_by);
        let mut memes = Vec::new();

        for subreddit in &self.reddit.subreddits {
            log::info!("Scraping r/{subreddit}");

            let posts = match self
                .source
                .fetch_listing(subreddit, sort, self.reddit.limit)
                .await
            {
                Ok(posts) => posts,
                Err(e) => {
                    log::error!("{}", AppError::scrape(subreddit.clone(), e));
                    continue;
                }
            };

            for post in posts {
                if store.contains(&post.id) {
                    continue;
                }
                if !self.passes_filters(&post) {
                    continue;
                }

                match extract_meme(&post, subreddit) {
                    Some(meme) => {
                        store.insert(meme.id.clone());
                        memes.push(meme);
                    }
                    None => {
                        log::debug!("Post {} has no resolvable image, dropped", post.id);
                    }
                }
            }
        }

        if let Err(e) = store.persist().await {
            log::error!("Failed to persist sent-post history: {e}");
        }

        log::info!("Found {} new memes", memes.len());
        memes
    }

    /// Check if a post passes all active filters.
    fn passes_filters(&self, post: &RawPost) -> bool {
        if post.score < self.reddit.min_score {
            return false;
        }

        if self.filters.exclude_nsfw && post.over_18 {
            return false;
        }

        if post.title.chars().count() > self.filters.max_title_length {
            return false;
        }

        if self.filters.image_only {
            let hinted = post.post_hint.as_deref() == Some("image");
            if !is_image_url(&post.url) && !hinted {
                return false;
            }
        }

        true
    }
}

/// Resolve the direct image URL for a post.
///
/// Precedence: a URL that is itself an image wins, then the largest
/// embedded preview rendition, then Reddit's direct-image host.
fn resolve_image_url(post: &RawPost) -> Option<String> {
    if is_image_url(&post.url) {
        return Some(post.url.clone());
    }

    if let Some(image) = post.preview.as_ref().and_then(|p| p.images.first()) {
        if let Some(largest) = image.resolutions.last() {
            return Some(unescape_preview_url(&largest.url));
        }
        if let Some(source) = &image.source {
            return Some(unescape_preview_url(&source.url));
        }
    }

    if is_direct_image_host(&post.url) {
        return Some(post.url.clone());
    }

    None
}

/// Extract a normalized meme from a raw post.
///
/// Returns `None` when no direct image URL can be resolved.
fn extract_meme(post: &RawPost, subreddit: &str) -> Option<Meme> {
    let image_url = resolve_image_url(post)?;

    Some(Meme {
        id: post.id.clone(),
        title: post.title.clone(),
        url: post.url.clone(),
        image_url,
        score: post.score,
        subreddit: subreddit.to_string(),
        author: post
            .author
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        created_utc: post.created_utc,
        permalink: format!("https://reddit.com{}", post.permalink),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use tempfile::TempDir;

    fn make_post(id: &str, score: i64) -> RawPost {
        RawPost {
            id: id.to_string(),
            title: format!("Meme {id}"),
            url: format!("https://i.redd.it/{id}.jpg"),
            score,
            over_18: false,
            post_hint: None,
            author: Some("tester".to_string()),
            created_utc: 1_700_000_000.0,
            permalink: format!("/r/memes/comments/{id}/meme/"),
            preview: None,
        }
    }

    fn make_preview(urls: &[&str]) -> Preview {
        Preview {
            images: vec![PreviewImage {
                source: Some(PreviewSource {
                    url: "https://preview.redd.it/source.jpg?s=src&amp;x=1".to_string(),
                }),
                resolutions: urls
                    .iter()
                    .map(|u| PreviewSource {
                        url: (*u).to_string(),
                    })
                    .collect(),
            }],
        }
    }

    struct FakeSource {
        posts: HashMap<String, Vec<RawPost>>,
        fail: HashSet<String>,
    }

    impl FakeSource {
        fn new(posts: Vec<(&str, Vec<RawPost>)>) -> Self {
            Self {
                posts: posts
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                fail: HashSet::new(),
            }
        }

        fn failing(mut self, subreddit: &str) -> Self {
            self.fail.insert(subreddit.to_string());
            self
        }
    }

    #[async_trait]
    impl ListingSource for FakeSource {
        async fn fetch_listing(
            &self,
            subreddit: &str,
            _sort: SortMode,
            limit: u32,
        ) -> Result<Vec<RawPost>> {
            if self.fail.contains(subreddit) {
                return Err(AppError::auth("simulated outage"));
            }
            let posts = self.posts.get(subreddit).cloned().unwrap_or_default();
            Ok(posts.into_iter().take(limit as usize).collect())
        }
    }

    fn scraper_with(config: &Config, source: FakeSource) -> RedditScraper {
        RedditScraper::with_source(config, Box::new(source))
    }

    fn store_in(tmp: &TempDir) -> SentStore {
        SentStore::empty(tmp.path().join("sent_posts.json"))
    }

    #[tokio::test]
    async fn test_score_boundary() {
        let config = Config::default(); // min_score = 100
        let source = FakeSource::new(vec![(
            "memes",
            vec![make_post("at", 100), make_post("below", 99)],
        )]);
        let scraper = scraper_with(&config, source);

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        assert_eq!(memes.len(), 1);
        assert_eq!(memes[0].id, "at");
    }

    #[tokio::test]
    async fn test_title_length_boundary() {
        let mut config = Config::default();
        config.filters.max_title_length = 10;

        let mut exact = make_post("exact", 500);
        exact.title = "x".repeat(10);
        let mut long = make_post("long", 500);
        long.title = "x".repeat(11);

        let scraper = scraper_with(&config, FakeSource::new(vec![("memes", vec![exact, long])]));

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        assert_eq!(memes.len(), 1);
        assert_eq!(memes[0].id, "exact");
    }

    #[tokio::test]
    async fn test_nsfw_filter() {
        let config = Config::default();
        let mut nsfw = make_post("nsfw", 500);
        nsfw.over_18 = true;

        let scraper = scraper_with(
            &config,
            FakeSource::new(vec![("memes", vec![nsfw, make_post("sfw", 500)])]),
        );

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        assert_eq!(memes.len(), 1);
        assert_eq!(memes[0].id, "sfw");
    }

    #[tokio::test]
    async fn test_nsfw_kept_when_filter_disabled() {
        let mut config = Config::default();
        config.filters.exclude_nsfw = false;

        let mut nsfw = make_post("nsfw", 500);
        nsfw.over_18 = true;

        let scraper = scraper_with(&config, FakeSource::new(vec![("memes", vec![nsfw])]));

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        assert_eq!(scraper.fetch_new_memes(&mut store).await.len(), 1);
    }

    #[tokio::test]
    async fn test_dedup_is_idempotent() {
        let config = Config::default();
        let posts = vec![make_post("one", 500), make_post("two", 500)];
        let scraper = scraper_with(&config, FakeSource::new(vec![("memes", posts)]));

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);

        let first = scraper.fetch_new_memes(&mut store).await;
        assert_eq!(first.len(), 2);

        // Same upstream content, same store: nothing new.
        let second = scraper.fetch_new_memes(&mut store).await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_already_seen_ids_are_skipped() {
        let config = Config::default();
        let scraper = scraper_with(
            &config,
            FakeSource::new(vec![("memes", vec![make_post("seen", 500)])]),
        );

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        store.insert("seen");

        assert!(scraper.fetch_new_memes(&mut store).await.is_empty());
    }

    #[tokio::test]
    async fn test_direct_url_beats_preview() {
        let config = Config::default();
        let mut post = make_post("both", 500);
        post.preview = Some(make_preview(&["https://preview.redd.it/small.jpg"]));

        let scraper = scraper_with(&config, FakeSource::new(vec![("memes", vec![post])]));

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        assert_eq!(memes[0].image_url, "https://i.redd.it/both.jpg");
    }

    #[tokio::test]
    async fn test_preview_uses_highest_resolution() {
        let config = Config::default();
        let mut post = make_post("preview", 500);
        post.url = "https://example.com/gallery/preview".to_string();
        post.post_hint = Some("image".to_string());
        post.preview = Some(make_preview(&[
            "https://preview.redd.it/x.jpg?width=108&amp;s=a",
            "https://preview.redd.it/x.jpg?width=640&amp;s=b",
        ]));

        let scraper = scraper_with(&config, FakeSource::new(vec![("memes", vec![post])]));

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        assert_eq!(
            memes[0].image_url,
            "https://preview.redd.it/x.jpg?width=640&s=b"
        );
    }

    #[tokio::test]
    async fn test_preview_falls_back_to_source() {
        let config = Config::default();
        let mut post = make_post("srconly", 500);
        post.url = "https://example.com/gallery/srconly".to_string();
        post.post_hint = Some("image".to_string());
        post.preview = Some(make_preview(&[]));

        let scraper = scraper_with(&config, FakeSource::new(vec![("memes", vec![post])]));

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        assert_eq!(
            memes[0].image_url,
            "https://preview.redd.it/source.jpg?s=src&x=1"
        );
    }

    #[tokio::test]
    async fn test_unresolvable_media_is_dropped() {
        let config = Config::default();
        let mut post = make_post("nomedia", 500);
        post.url = "https://example.com/article".to_string();
        post.post_hint = Some("image".to_string()); // passes the listing filter

        let scraper = scraper_with(&config, FakeSource::new(vec![("memes", vec![post])]));

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        assert!(scraper.fetch_new_memes(&mut store).await.is_empty());
    }

    #[tokio::test]
    async fn test_subreddit_failure_does_not_abort_batch() {
        let mut config = Config::default();
        config.reddit.subreddits = vec!["broken".into(), "memes".into()];

        let source = FakeSource::new(vec![("memes", vec![make_post("ok", 500)])]).failing("broken");
        let scraper = scraper_with(&config, source);

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        assert_eq!(memes.len(), 1);
        assert_eq!(memes[0].id, "ok");
    }

    #[tokio::test]
    async fn test_category_order_is_preserved() {
        let mut config = Config::default();
        config.reddit.subreddits = vec!["a".into(), "b".into()];

        let source = FakeSource::new(vec![
            ("a", vec![make_post("a1", 500), make_post("a2", 500)]),
            ("b", vec![make_post("b1", 500)]),
        ]);
        let scraper = scraper_with(&config, source);

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        let ids: Vec<&str> = memes.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b1"]);
    }

    #[tokio::test]
    async fn test_store_is_persisted_after_fetch() {
        let config = Config::default();
        let scraper = scraper_with(
            &config,
            FakeSource::new(vec![("memes", vec![make_post("keep", 500)])]),
        );

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sent_posts.json");
        let mut store = SentStore::empty(&path);
        scraper.fetch_new_memes(&mut store).await;

        let reloaded = SentStore::load(&path).await;
        assert!(reloaded.contains("keep"));
    }

    #[tokio::test]
    async fn test_missing_author_becomes_unknown() {
        let config = Config::default();
        let mut post = make_post("anon", 500);
        post.author = None;

        let scraper = scraper_with(&config, FakeSource::new(vec![("memes", vec![post])]));

        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let memes = scraper.fetch_new_memes(&mut store).await;

        assert_eq!(memes[0].author, "Unknown");
    }

    #[test]
    fn test_unknown_sort_falls_back_to_hot() {
        assert_eq!(SortMode::parse("hot"), SortMode::Hot);
        assert_eq!(SortMode::parse("new"), SortMode::New);
        assert_eq!(SortMode::parse("top"), SortMode::Top);
        assert_eq!(SortMode::parse("rising"), SortMode::Hot);
        assert_eq!(SortMode::parse(""), SortMode::Hot);
    }

    #[test]
    fn test_permalink_is_absolute() {
        let post = make_post("perma", 500);
        let meme = extract_meme(&post, "memes").unwrap();
        assert_eq!(meme.permalink, "https://reddit.com/r/memes/comments/perma/meme/");
    }

    #[test]
    fn test_listing_envelope_parses() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    {
                        "kind": "t3",
                        "data": {
                            "id": "abc",
                            "title": "A meme",
                            "url": "https://i.redd.it/abc.jpg",
                            "score": 321,
                            "over_18": false,
                            "author": "someone",
                            "created_utc": 1700000000.0,
                            "permalink": "/r/memes/comments/abc/a_meme/"
                        }
                    }
                ]
            }
        }"#;

        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.children[0].data.id, "abc");
        assert_eq!(listing.data.children[0].data.score, 321);
    }
}
