use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{parse_movies, Movie};

use super::error::CatalogError;

/// Release window reported alongside the now-playing listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// Earliest release date in the window.
    pub minimum: Option<NaiveDate>,
    /// Latest release date in the window.
    pub maximum: Option<NaiveDate>,
}

/// One page of the now-playing listing, mapped into movies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingPage {
    /// Page number echoed by the catalog (0 when absent).
    pub page: u32,
    /// Total pages available.
    pub total_pages: u32,
    /// Total entries across all pages.
    pub total_results: u32,
    /// Release window, if reported.
    pub dates: Option<DateWindow>,
    /// Movies in catalog order.
    pub movies: Vec<Movie>,
    /// Entries dropped because they were not JSON objects.
    pub skipped: usize,
}

impl NowPlayingPage {
    /// Interpret a catalog document. Only a missing `results` array fails the batch.
    pub fn from_json(document: &Value) -> Result<Self, CatalogError> {
        let object = document
            .as_object()
            .ok_or_else(|| CatalogError::parse("response is not a JSON object"))?;
        let results = object
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| CatalogError::parse("missing results array"))?;

        let movies = parse_movies(results);
        let skipped = results.len() - movies.len();

        Ok(Self {
            page: count_field(object.get("page")),
            total_pages: count_field(object.get("total_pages")),
            total_results: count_field(object.get("total_results")),
            dates: object.get("dates").and_then(date_window),
            movies,
            skipped,
        })
    }
}

fn count_field(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(0)
}

fn date_window(value: &Value) -> Option<DateWindow> {
    let object = value.as_object()?;
    let parse = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
    };
    Some(DateWindow {
        minimum: parse("minimum"),
        maximum: parse("maximum"),
    })
}
