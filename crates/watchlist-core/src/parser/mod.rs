//! HTML parsers for IMDb pages
//!
//! Each submodule pairs a fragment locator with a record normalizer:
//! - `search`: title search result rows
//! - `detail`: title detail page
//! - `episodes`: episode guide and season pages

pub mod detail;
pub mod episodes;
pub mod search;

use scraper::{ElementRef, Selector};

use crate::error::{Operation, ShapeError};

// Re-export main parsing functions
pub use detail::{locate_detail, normalize_detail, parse_detail, DetailFragments, MetadataItem};
pub use episodes::{
    airs_at_or_after, locate_episode_guide, locate_episode_rows, normalize_episode_rows,
    parse_air_date, EpisodeGuide, EpisodePage, EpisodeRow,
};
pub use search::{
    extract_imdb_id, locate_search_rows, normalize_search_row, parse_search_results,
};

/// Compile a CSS selector, reporting failure as a shape error of `operation`.
pub(crate) fn selector(operation: Operation, css: &str) -> Result<Selector, ShapeError> {
    Selector::parse(css)
        .map_err(|e| ShapeError::new(operation, format!("invalid selector {css:?}: {e:?}")))
}

/// Whitespace-trimmed text content of an element.
pub(crate) fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}
