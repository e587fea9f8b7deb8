// src/utils/media.rs

//! Image URL helpers for media resolution.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// File extensions accepted as direct images.
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Check if a URL's path points at an image file.
pub fn is_image_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Check if a URL lives on Reddit's direct-image host.
pub fn is_direct_image_host(url: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^https://i\.redd\.it/").expect("valid regex"));
    re.is_match(url)
}

/// Undo the HTML escaping Reddit applies to preview URLs.
pub fn unescape_preview_url(url: &str) -> String {
    url.replace("&amp;", "&")
}
