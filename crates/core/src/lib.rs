#![warn(clippy::all, missing_docs)]

//! Core domain logic for the now-playing movie browser.
//!
//! This crate hosts the catalog client, the movie model, the poster
//! loader and the list presenter used by the terminal UI and any
//! future frontends.

pub mod catalog;
pub mod config;
pub mod models;
pub mod poster;
pub mod presenter;

pub use catalog::{CatalogApi, CatalogClient, CatalogError, FetchEvent, NowPlayingPage};
pub use config::AppConfig;
pub use models::{parse_movies, Movie};
pub use poster::{ImageLoader, PosterCache, PosterState};
pub use presenter::{ListView, MoviePresenter, MovieRow, ScreenState};
