use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

use super::{
    client::{fetch_now_playing_page, CatalogApi},
    error::CatalogError,
    page::NowPlayingPage,
};

/// Outcome of a background catalog fetch.
#[derive(Debug)]
pub enum FetchEvent {
    /// Listing fetched and parsed.
    Loaded(NowPlayingPage),
    /// Fetch or parse failed.
    Failed(CatalogError),
}

impl From<Result<NowPlayingPage, CatalogError>> for FetchEvent {
    fn from(result: Result<NowPlayingPage, CatalogError>) -> Self {
        match result {
            Ok(listing) => FetchEvent::Loaded(listing),
            Err(err) => FetchEvent::Failed(err),
        }
    }
}

/// Spawn a single fetch of `page`, delivering the outcome to `sender`.
///
/// The receiving side owns all UI state. If it has been dropped by the time
/// the fetch completes, the outcome is discarded.
pub fn spawn_fetch(
    api: Arc<dyn CatalogApi>,
    page: u32,
    sender: mpsc::Sender<FetchEvent>,
) -> JoinHandle<()> {
    info!(page, "Starting now playing fetch");
    tokio::spawn(async move {
        let event = FetchEvent::from(fetch_now_playing_page(api.as_ref(), page).await);
        if sender.send(event).await.is_err() {
            debug!(page, "Screen closed before fetch completed; dropping result");
        }
    })
}
