//! Catalog access: HTTP client, response envelope and background fetch.

/// HTTP client for the movie catalog.
pub mod client;
/// Error taxonomy for catalog requests.
pub mod error;
/// Response envelope for the now-playing listing.
pub mod page;
/// Background fetch delivering results over a channel.
pub mod task;

pub use client::{fetch_now_playing_page, CatalogApi, CatalogClient};
pub use error::CatalogError;
pub use page::{DateWindow, NowPlayingPage};
pub use task::{spawn_fetch, FetchEvent};
