//! Watchlist Scraper Core Library
//!
//! This crate provides the extraction and normalization engine behind the
//! watchlist: it fetches IMDb pages and turns their variably shaped
//! fragments into fixed records.
//!
//! # Features
//! - Search movies or TV shows by title
//! - Look up a title's details by IMDb id
//! - List a show's upcoming episodes across season boundaries
//! - Cancellable, time-bounded HTTP fetches

pub mod client;
pub mod error;
pub mod parser;
pub mod schedule;
pub mod scraper;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientConfig, ImdbClient};
pub use error::{NetworkError, Operation, Result, ShapeError, WatchlistError};
pub use scraper::{normalize_imdb_id, ImdbScraper};
pub use types::{
    DetailRecord, EpisodeEntry, Scope, SearchHit, Upcoming, UpcomingEpisodes, NOT_AVAILABLE,
    SHOW_MARKER,
};
