//! Instagram post lookup: URL validation, shortcode extraction, metadata
//! fetch and image download.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MSG_NO_URL: &str = "No URL provided";
pub const MSG_INVALID_LINK: &str = "Link tidak valid. Pastikan itu link Instagram.";
pub const MSG_REEL: &str = "Post ini berupa reels. Hanya gambar yang bisa diproses.";
pub const MSG_PRIVATE: &str = "Post tidak bisa diakses. Kemungkinan akun private.";
pub const MSG_BLOCKED: &str = "Tidak dapat mengakses Instagram. Kemungkinan IP server diblokir IG.";
pub const MSG_VIDEO: &str = "Post ini berupa video. Hanya gambar yang bisa diproses.";
pub const MSG_DOWNLOAD_FAILED: &str = "Gagal mengunduh gambar dari Instagram.";

static SHORTCODE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"/p/([^/?#]+)").unwrap());

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const IG_APP_ID: &str = "936619743392459";

#[derive(Debug, Error, PartialEq)]
pub enum UrlError {
    #[error("No URL provided")]
    Empty,
    #[error("Link tidak valid. Pastikan itu link Instagram.")]
    NotInstagram,
    #[error("Post ini berupa reels. Hanya gambar yang bisa diproses.")]
    Reel,
    #[error("Link tidak valid. Pastikan itu link Instagram.")]
    NoShortcode,
}

/// Checks a submitted link and returns the post shortcode.
pub fn parse_post_url(url: &str) -> Result<String, UrlError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(UrlError::Empty);
    }
    if !url.contains("instagram.com") {
        return Err(UrlError::NotInstagram);
    }
    if url.contains("/reel/") {
        return Err(UrlError::Reel);
    }
    SHORTCODE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(UrlError::NoShortcode)
}

#[derive(Clone, Debug, PartialEq)]
pub struct PostInfo {
    pub shortcode: String,
    pub is_video: bool,
    pub display_url: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Post tidak bisa diakses. Kemungkinan akun private.")]
    Inaccessible,
    #[error("Tidak dapat mengakses Instagram. Kemungkinan IP server diblokir IG. {0}")]
    Blocked(String),
    #[error("Gagal mengunduh gambar dari Instagram.")]
    DownloadStatus(u16),
    #[error("Error processing image: {0}")]
    Other(String),
}

#[async_trait]
pub trait PostFetcher: Send + Sync {
    async fn fetch_post(&self, shortcode: &str) -> Result<PostInfo, FetchError>;

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpPostFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPostFetcher {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url("https://www.instagram.com")
    }

    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PostFetcher for HttpPostFetcher {
    async fn fetch_post(&self, shortcode: &str) -> Result<PostInfo, FetchError> {
        let url = format!(
            "{}/p/{}/?__a=1&__d=dis",
            self.base_url,
            urlencoding::encode(shortcode)
        );
        debug!("[ai-or-human] Fetching Instagram post metadata: {}", url);

        let resp = self
            .client
            .get(&url)
            .header("X-IG-App-ID", IG_APP_ID)
            .send()
            .await
            .map_err(|e| FetchError::Blocked(e.to_string()))?;

        let status = resp.status().as_u16();
        if matches!(status, 401 | 403 | 404) {
            return Err(FetchError::Inaccessible);
        }
        if !resp.status().is_success() {
            return Err(FetchError::Blocked(format!("HTTP {}", status)));
        }
        if resp.url().path().contains("/accounts/login") {
            return Err(FetchError::Inaccessible);
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| FetchError::Blocked(e.to_string()))?;

        parse_post_metadata(shortcode, &body).ok_or(FetchError::Inaccessible)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Other(e.to_string()))?;
        if resp.status().as_u16() != 200 {
            return Err(FetchError::DownloadStatus(resp.status().as_u16()));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Other(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Reads post metadata from either the `items` (API v1) or the
/// `graphql.shortcode_media` response shape.
pub fn parse_post_metadata(shortcode: &str, body: &Value) -> Option<PostInfo> {
    if let Some(item) = body.get("items").and_then(|v| v.get(0)) {
        let is_video = item.get("media_type").and_then(|v| v.as_u64()) == Some(2)
            || item.get("video_versions").is_some();
        let display_url = item
            .get("image_versions2")
            .and_then(|v| v.get("candidates"))
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("url"))
            .and_then(|v| v.as_str())
            .or_else(|| {
                // carousel: take the first slide
                item.get("carousel_media")
                    .and_then(|v| v.get(0))
                    .and_then(|v| v.get("image_versions2"))
                    .and_then(|v| v.get("candidates"))
                    .and_then(|v| v.get(0))
                    .and_then(|v| v.get("url"))
                    .and_then(|v| v.as_str())
            })?;
        return Some(PostInfo {
            shortcode: shortcode.to_string(),
            is_video,
            display_url: display_url.to_string(),
        });
    }

    let media = body.get("graphql").and_then(|v| v.get("shortcode_media"))?;
    let is_video = media.get("is_video").and_then(|v| v.as_bool()).unwrap_or(false);
    let display_url = media.get("display_url").and_then(|v| v.as_str())?;
    Some(PostInfo {
        shortcode: shortcode.to_string(),
        is_video,
        display_url: display_url.to_string(),
    })
}

/// Downloaded post image, kept so repeat submissions skip Instagram.
#[derive(Clone)]
pub struct CachedPost {
    pub info: PostInfo,
    pub bytes: Vec<u8>,
    pub fetched_at: Instant,
}

#[derive(Clone, Default)]
pub struct PostCache {
    entries: std::sync::Arc<DashMap<String, CachedPost>>,
}

impl PostCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, shortcode: &str) -> Option<CachedPost> {
        self.entries.get(shortcode).map(|e| e.clone())
    }

    pub fn insert(&self, info: PostInfo, bytes: Vec<u8>) {
        self.entries.insert(
            info.shortcode.clone(),
            CachedPost {
                info,
                bytes,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cleanup(&self, max_age: Duration) {
        let before = self.entries.len();
        self.entries.retain(|_, post| post.fetched_at.elapsed() < max_age);
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            info!("[ai-or-human] Evicted {} cached Instagram posts", evicted);
        }
    }
}

/// Resolves a shortcode to image bytes, going through the cache first.
pub async fn fetch_post_image(
    fetcher: &dyn PostFetcher,
    cache: &PostCache,
    shortcode: &str,
) -> Result<(PostInfo, Vec<u8>), FetchError> {
    if let Some(hit) = cache.get(shortcode) {
        debug!("[ai-or-human] Instagram cache hit for {}", shortcode);
        return Ok((hit.info, hit.bytes));
    }

    let info = fetcher.fetch_post(shortcode).await?;
    if info.is_video {
        return Ok((info, Vec::new()));
    }

    let bytes = fetcher.download(&info.display_url).await.map_err(|e| {
        warn!("[ai-or-human] Image download failed for {}: {}", shortcode, e);
        e
    })?;
    cache.insert(info.clone(), bytes.clone());
    Ok((info, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_url_validation_order() {
        assert_eq!(parse_post_url("   "), Err(UrlError::Empty));
        assert_eq!(parse_post_url("https://example.com/p/abc/"), Err(UrlError::NotInstagram));
        assert_eq!(
            parse_post_url("https://www.instagram.com/reel/abc/"),
            Err(UrlError::Reel)
        );
        assert_eq!(
            parse_post_url("https://www.instagram.com/someone/"),
            Err(UrlError::NoShortcode)
        );
    }

    #[test]
    fn test_shortcode_extraction() {
        assert_eq!(
            parse_post_url("https://www.instagram.com/p/Cxyz_12-3/").unwrap(),
            "Cxyz_12-3"
        );
        assert_eq!(
            parse_post_url("https://instagram.com/p/ABC?igsh=xyz").unwrap(),
            "ABC"
        );
        assert_eq!(
            parse_post_url("  https://www.instagram.com/p/ABC  ").unwrap(),
            "ABC"
        );
    }

    #[test]
    fn test_url_errors_carry_user_messages() {
        assert_eq!(UrlError::Empty.to_string(), MSG_NO_URL);
        assert_eq!(UrlError::NotInstagram.to_string(), MSG_INVALID_LINK);
        assert_eq!(UrlError::Reel.to_string(), MSG_REEL);
        assert_eq!(FetchError::Inaccessible.to_string(), MSG_PRIVATE);
        assert_eq!(FetchError::DownloadStatus(500).to_string(), MSG_DOWNLOAD_FAILED);
        assert_eq!(UrlError::NoShortcode.to_string(), MSG_INVALID_LINK);
        assert_eq!(
            FetchError::Blocked("timeout".into()).to_string(),
            format!("{} timeout", MSG_BLOCKED)
        );
    }

    #[test]
    fn test_parse_graphql_shape() {
        let body = json!({
            "graphql": {"shortcode_media": {"is_video": true, "display_url": "https://cdn/x.jpg"}}
        });
        let info = parse_post_metadata("abc", &body).unwrap();
        assert!(info.is_video);
        assert_eq!(info.display_url, "https://cdn/x.jpg");
    }

    #[test]
    fn test_parse_items_shape_with_carousel() {
        let body = json!({
            "items": [{
                "media_type": 8,
                "carousel_media": [{"image_versions2": {"candidates": [{"url": "https://cdn/first.jpg"}]}}]
            }]
        });
        let info = parse_post_metadata("abc", &body).unwrap();
        assert!(!info.is_video);
        assert_eq!(info.display_url, "https://cdn/first.jpg");
    }

    #[test]
    fn test_parse_unknown_shape() {
        assert!(parse_post_metadata("abc", &json!({"status": "fail"})).is_none());
    }

    struct CountingFetcher {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl PostFetcher for CountingFetcher {
        async fn fetch_post(&self, shortcode: &str) -> Result<PostInfo, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(PostInfo {
                shortcode: shortcode.to_string(),
                is_video: false,
                display_url: "https://cdn/img.jpg".to_string(),
            })
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(vec![1, 2, 3])
        }
    }

    #[tokio::test]
    async fn test_cache_skips_second_fetch() {
        let fetcher = CountingFetcher {
            fetches: AtomicUsize::new(0),
        };
        let cache = PostCache::new();

        let (_, first) = fetch_post_image(&fetcher, &cache, "abc").await.unwrap();
        let (_, second) = fetch_post_image(&fetcher, &cache, "abc").await.unwrap();

        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(first, second);
        assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_cleanup_evicts_old_entries() {
        let cache = PostCache::new();
        cache.insert(
            PostInfo {
                shortcode: "abc".into(),
                is_video: false,
                display_url: String::new(),
            },
            vec![],
        );
        assert_eq!(cache.len(), 1);
        cache.cleanup(Duration::from_secs(3600));
        assert_eq!(cache.len(), 1);
        cache.cleanup(Duration::ZERO);
        assert!(cache.is_empty());
    }
}
