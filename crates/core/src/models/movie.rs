use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::genre::genre_name;

/// Root for poster and backdrop URLs.
pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// A catalog movie. Every field falls back to its default when the catalog omits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movie {
    /// Catalog id (0 when missing).
    pub id: i64,
    /// Localised title.
    pub title: String,
    /// Title in the original language.
    pub original_title: String,
    /// Synopsis.
    pub overview: String,
    /// ISO 639-1 code of the original language.
    pub original_language: String,
    /// Relative poster path, e.g. `/abc.jpg`.
    pub poster_path: String,
    /// Relative backdrop path.
    pub backdrop_path: String,
    /// Release date as sent by the catalog (`YYYY-MM-DD`).
    pub release_date: String,
    /// Genre ids in catalog order.
    pub genre_ids: Vec<i64>,
    /// Catalog popularity score.
    pub popularity: f64,
    /// Mean user rating.
    pub vote_average: f64,
    /// Number of user ratings.
    pub vote_count: i64,
    /// Adult content flag.
    pub adult: bool,
    /// Whether the entry is a video rather than a feature.
    pub video: bool,
}

impl Movie {
    /// Map one catalog entry. Returns `None` when the entry is not a JSON object.
    pub fn from_entry(entry: &Value) -> Option<Self> {
        let fields = entry.as_object()?;
        Some(Self {
            id: int_field(fields, "id"),
            title: string_field(fields, "title"),
            original_title: string_field(fields, "original_title"),
            overview: string_field(fields, "overview"),
            original_language: string_field(fields, "original_language"),
            poster_path: string_field(fields, "poster_path"),
            backdrop_path: string_field(fields, "backdrop_path"),
            release_date: string_field(fields, "release_date"),
            genre_ids: fields
                .get("genre_ids")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
                .unwrap_or_default(),
            popularity: float_field(fields, "popularity"),
            vote_average: float_field(fields, "vote_average"),
            vote_count: int_field(fields, "vote_count"),
            adult: bool_field(fields, "adult"),
            video: bool_field(fields, "video"),
        })
    }

    /// Poster URL under [`IMAGE_BASE_URL`].
    pub fn full_poster_path(&self) -> String {
        image_url(IMAGE_BASE_URL, &self.poster_path)
    }

    /// Backdrop URL under [`IMAGE_BASE_URL`].
    pub fn full_backdrop_path(&self) -> String {
        image_url(IMAGE_BASE_URL, &self.backdrop_path)
    }

    /// Parsed release date, if the catalog sent a valid one.
    pub fn released_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.release_date.trim(), "%Y-%m-%d").ok()
    }

    /// Release year, if known.
    pub fn release_year(&self) -> Option<i32> {
        self.released_on().map(|date| date.year())
    }

    /// Names of the known genres, in catalog order.
    pub fn genre_names(&self) -> Vec<&'static str> {
        self.genre_ids.iter().copied().filter_map(genre_name).collect()
    }

    /// Returns a user-facing label combining title and release year.
    pub fn display_name(&self) -> String {
        match self.release_year() {
            Some(year) => format!("{} ({year})", self.title),
            None => self.title.clone(),
        }
    }
}

/// Join an image base URL and a catalog path as `{base}/{path}`.
pub fn image_url(base: &str, path: &str) -> String {
    format!("{base}/{path}")
}

/// Map catalog entries into movies, silently skipping entries that are not objects.
pub fn parse_movies(entries: &[Value]) -> Vec<Movie> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let movie = Movie::from_entry(entry);
            if movie.is_none() {
                debug!(index, "Skipping malformed catalog entry");
            }
            movie
        })
        .collect()
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_field(fields: &Map<String, Value>, key: &str) -> i64 {
    fields.get(key).and_then(Value::as_i64).unwrap_or_default()
}

fn float_field(fields: &Map<String, Value>, key: &str) -> f64 {
    fields.get(key).and_then(Value::as_f64).unwrap_or_default()
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_full_entry() {
        let entry = json!({
            "adult": false,
            "backdrop_path": "/back.jpg",
            "genre_ids": [878, 28, 12],
            "id": 823464,
            "original_language": "en",
            "original_title": "Godzilla x Kong: The New Empire",
            "overview": "Following their explosive showdown...",
            "popularity": 3410.448,
            "poster_path": "/poster.jpg",
            "release_date": "2024-03-27",
            "title": "Godzilla x Kong: The New Empire",
            "video": false,
            "vote_average": 7.246,
            "vote_count": 1880
        });

        let movie = Movie::from_entry(&entry).expect("object entry");
        assert_eq!(movie.id, 823464);
        assert_eq!(movie.original_language, "en");
        assert_eq!(movie.genre_ids, vec![878, 28, 12]);
        assert_eq!(movie.genre_names(), vec!["Science Fiction", "Action", "Adventure"]);
        assert_eq!(movie.vote_count, 1880);
        assert_eq!(movie.popularity, 3410.448);
        assert_eq!(movie.release_year(), Some(2024));
        assert_eq!(movie.display_name(), "Godzilla x Kong: The New Empire (2024)");
        assert_eq!(
            movie.full_backdrop_path(),
            "https://image.tmdb.org/t/p/w500//back.jpg"
        );
    }

    #[test]
    fn absent_fields_use_defaults() {
        let movie = Movie::from_entry(&json!({})).expect("object entry");
        assert_eq!(movie, Movie::default());
        assert_eq!(movie.vote_count, 0);
        assert_eq!(movie.title, "");
        assert!(movie.genre_ids.is_empty());
        assert!(!movie.adult);
        assert_eq!(movie.released_on(), None);
        assert_eq!(movie.full_poster_path(), "https://image.tmdb.org/t/p/w500/");
    }

    #[test]
    fn wrong_types_and_nulls_use_defaults() {
        let entry = json!({
            "id": "12",
            "title": null,
            "overview": 42,
            "genre_ids": [18, "x", null, 35],
            "popularity": "high",
            "vote_average": 8,
            "vote_count": 3.5,
            "adult": "yes",
            "video": 1
        });

        let movie = Movie::from_entry(&entry).expect("object entry");
        assert_eq!(movie.id, 0);
        assert_eq!(movie.title, "");
        assert_eq!(movie.overview, "");
        assert_eq!(movie.genre_ids, vec![18, 35]);
        assert_eq!(movie.popularity, 0.0);
        assert_eq!(movie.vote_average, 8.0);
        assert_eq!(movie.vote_count, 0);
        assert!(!movie.adult);
        assert!(!movie.video);
    }

    #[test]
    fn parse_skips_non_objects_and_keeps_order() {
        let entries = vec![
            json!({"id": 2}),
            json!("not-an-object"),
            json!(null),
            json!([1, 2]),
            json!({"id": 3}),
        ];
        let movies = parse_movies(&entries);
        let ids: Vec<i64> = movies.iter().map(|movie| movie.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn image_url_is_base_slash_path() {
        assert_eq!(image_url("http://img", "/a.jpg"), "http://img//a.jpg");
        assert_eq!(image_url("http://img", ""), "http://img/");
    }

    #[test]
    fn structural_encoding_uses_wire_names() -> serde_json::Result<()> {
        let movie = Movie {
            id: 5,
            title: "Five".to_string(),
            vote_average: 6.5,
            ..Movie::default()
        };
        let encoded = serde_json::to_value(&movie)?;
        assert_eq!(encoded["vote_average"], json!(6.5));
        assert_eq!(encoded["poster_path"], json!(""));

        let partial: Movie = serde_json::from_value(json!({"id": 5, "title": "Five"}))?;
        assert_eq!(partial.vote_count, 0);
        assert_eq!(partial.title, "Five");
        Ok(())
    }
}
