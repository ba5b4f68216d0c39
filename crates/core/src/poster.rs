//! Poster retrieval and in-memory caching.

use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

/// Image formats recognised from their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG / JFIF.
    Jpeg,
    /// Portable Network Graphics.
    Png,
    /// GIF87a / GIF89a.
    Gif,
    /// RIFF WebP.
    WebP,
}

impl ImageFormat {
    /// Identify the format from the start of an image body.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageFormat::Png)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageFormat::Gif)
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageFormat::WebP)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
            ImageFormat::WebP => "WebP",
        };
        f.write_str(label)
    }
}

/// A retrieved poster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poster {
    /// Source URL.
    pub url: String,
    /// Detected image format.
    pub format: ImageFormat,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

impl Poster {
    /// Size of the image body in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Load state of a single image URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterState {
    /// Fetch in progress.
    Loading,
    /// Image available.
    Ready(Arc<Poster>),
    /// Fetch or decode failed; the reason is kept for diagnostics.
    Failed(String),
}

impl PosterState {
    /// Whether a placeholder should be displayed instead of the image.
    pub fn shows_placeholder(&self) -> bool {
        !matches!(self, PosterState::Ready(_))
    }
}

/// Image-loading collaborator used when rendering rows.
pub trait ImageLoader: Send + Sync {
    /// Current state for `url`, starting a load if none has been requested yet.
    fn request(&self, url: &str) -> PosterState;
}

/// [`ImageLoader`] that fetches over HTTP and keeps every result in memory.
///
/// `request` must be called from within a tokio runtime.
#[derive(Clone)]
pub struct PosterCache {
    client: Client,
    entries: Arc<RwLock<HashMap<String, PosterState>>>,
}

impl PosterCache {
    /// Create a cache sharing the application's HTTP client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Cached state for `url` without starting a load.
    pub fn cached(&self, url: &str) -> Option<PosterState> {
        self.entries.read().get(url).cloned()
    }

    /// Number of URLs the cache knows about.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been requested yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Retrieve and identify one image. Failures are returned as [`PosterState::Failed`].
    pub async fn fetch(&self, url: &str) -> PosterState {
        let res = match self.client.get(url).send().await {
            Ok(res) => res,
            Err(err) => return PosterState::Failed(format!("request failed: {err}")),
        };
        let status = res.status();
        if status != StatusCode::OK {
            return PosterState::Failed(format!("HTTP {status}"));
        }
        let body = match res.bytes().await {
            Ok(body) => body,
            Err(err) => return PosterState::Failed(format!("reading body failed: {err}")),
        };
        match ImageFormat::sniff(&body) {
            Some(format) => PosterState::Ready(Arc::new(Poster {
                url: url.to_string(),
                format,
                data: body.to_vec(),
            })),
            None => PosterState::Failed("unrecognised image data".to_string()),
        }
    }
}

impl ImageLoader for PosterCache {
    fn request(&self, url: &str) -> PosterState {
        if let Some(state) = self.cached(url) {
            return state;
        }

        {
            let mut entries = self.entries.write();
            if let Some(state) = entries.get(url) {
                return state.clone();
            }
            entries.insert(url.to_string(), PosterState::Loading);
        }

        debug!(%url, "Loading poster");
        let cache = self.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let state = cache.fetch(&url).await;
            if let PosterState::Failed(reason) = &state {
                warn!(%url, %reason, "Poster load failed");
            }
            cache.entries.write().insert(url, state);
        });
        PosterState::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::sniff(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::sniff(b"RIFF\x10\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::sniff(b"<html>"), None);
        assert_eq!(ImageFormat::sniff(b""), None);
    }

    #[test]
    fn only_ready_hides_placeholder() {
        let poster = Poster {
            url: "http://img/p.jpg".to_string(),
            format: ImageFormat::Jpeg,
            data: vec![0xFF, 0xD8, 0xFF],
        };
        assert!(!PosterState::Ready(Arc::new(poster)).shows_placeholder());
        assert!(PosterState::Loading.shows_placeholder());
        assert!(PosterState::Failed("nope".to_string()).shows_placeholder());
    }

    #[tokio::test]
    async fn unreachable_host_fails() {
        let cache = PosterCache::new(Client::new());
        let state = cache.fetch("http://127.0.0.1:1/poster.jpg").await;
        assert!(matches!(state, PosterState::Failed(_)));
    }

    #[tokio::test]
    async fn request_records_loading_once() {
        let cache = PosterCache::new(Client::new());
        let url = "http://127.0.0.1:1/poster.jpg";
        assert!(cache.is_empty());
        assert_eq!(cache.request(url), PosterState::Loading);
        assert_eq!(cache.len(), 1);
        let second = cache.request(url);
        assert!(matches!(second, PosterState::Loading | PosterState::Failed(_)));
        assert_eq!(cache.len(), 1);
    }
}
