//! Shared domain models.

/// TMDB movie genre names.
pub mod genre;
/// Movie entity and its mapping from catalog entries.
pub mod movie;

pub use genre::genre_name;
pub use movie::{image_url, parse_movies, Movie, IMAGE_BASE_URL};
