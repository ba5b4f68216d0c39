use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::AppConfig;

use super::{error::CatalogError, page::NowPlayingPage};

const NOW_PLAYING_ENDPOINT: &str = "/movie/now_playing";

/// Read access to the movie catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch one page of the now-playing listing and return the raw JSON document.
    async fn fetch_now_playing(&self, page: u32) -> Result<Value, CatalogError>;
}

/// Catalog client backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CatalogClient {
    /// Build a client from configuration, reusing the application's HTTP client.
    pub fn new(client: Client, config: &AppConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            anyhow::bail!(
                "catalog api_key is not configured (set it in {} or NOWPLAYING_API_KEY)",
                crate::config::CONFIG_FILE
            );
        }
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
        })
    }

    /// Build the shared HTTP client with the configured timeout.
    pub fn http_client(config: &AppConfig) -> Result<Client> {
        Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("nowplaying/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")
    }

    fn now_playing_url(&self) -> String {
        format!("{}{}", self.base_url, NOW_PLAYING_ENDPOINT)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn fetch_now_playing(&self, page: u32) -> Result<Value, CatalogError> {
        if page < 1 {
            return Err(CatalogError::InvalidPage(page));
        }

        let url = self.now_playing_url();
        debug!(%url, page, "Requesting now playing listing");
        let res = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(&[("page", page)])
            .send()
            .await
            .map_err(CatalogError::network)?;

        let status = res.status();
        if status != StatusCode::OK {
            let headers = res.headers().clone();
            let text = res.text().await.unwrap_or_default();
            return Err(CatalogError::Http {
                status,
                headers,
                message: error_message(status, &text),
            });
        }

        let text = res.text().await.map_err(CatalogError::network)?;
        serde_json::from_str(&text).map_err(|err| CatalogError::Parse {
            message: "response body is not valid JSON".to_string(),
            source: Some(err),
        })
    }
}

/// Fetch a page and map it into movies, skipping malformed entries.
pub async fn fetch_now_playing_page(
    api: &dyn CatalogApi,
    page: u32,
) -> Result<NowPlayingPage, CatalogError> {
    let document = api.fetch_now_playing(page).await?;
    let listing = NowPlayingPage::from_json(&document)?;
    info!(
        page = listing.page,
        movies = listing.movies.len(),
        skipped = listing.skipped,
        "Now playing listing parsed"
    );
    Ok(listing)
}

fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("status_message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    if let Some(message) = from_json {
        return message;
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.chars().take(200).collect();
    }
    status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_string()
}
