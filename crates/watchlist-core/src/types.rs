//! Data types for the watchlist scraper
//!
//! This module contains the canonical record shapes every scraping operation
//! normalizes into. All types implement Serialize and Deserialize so front
//! ends can print them as JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel for a field the page did not provide.
pub const NOT_AVAILABLE: &str = "NA";

/// Prefix of the content type of every show ("TV Series", "TV Mini Series", ...).
pub const SHOW_MARKER: &str = "TV";

/// Content type assumed when the page omits it.
pub const DEFAULT_CONTENT_TYPE: &str = "Movie";

/// Which partition of titles a facade works on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Movie,
    Show,
}

impl Scope {
    /// Partition a content type string belongs to.
    pub fn of(content_type: &str) -> Self {
        if content_type.starts_with(SHOW_MARKER) {
            Scope::Show
        } else {
            Scope::Movie
        }
    }

    /// Whether a record with `content_type` belongs to this scope.
    pub fn admits(self, content_type: &str) -> bool {
        Scope::of(content_type) == self
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Movie => f.write_str("movie"),
            Scope::Show => f.write_str("tv show"),
        }
    }
}

/// One row of a title search result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Numeric IMDb identifier without the `tt` prefix
    pub imdb_id: String,
    pub title: String,
    /// Release year or year range, `NA` when absent
    pub release_date: String,
    /// "Movie", "TV Series", ... or `NA`
    pub content_type: String,
    /// Leading cast members or other trailing metadata
    pub cast: String,
}

/// Full record for a single title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub imdb_id: String,
    pub title: String,
    pub release_date: String,
    pub content_type: String,
    /// Aggregate rating such as "8.0", `NA` when unrated
    pub rating: String,
    /// Runtime such as "2h 23m", `NA` when absent
    pub runtime: String,
    pub description: String,
}

/// One dated episode of a show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeEntry {
    pub title: String,
    pub season: String,
    pub episode_number: String,
    /// Air date as printed, e.g. "15 Jun. 2024"
    pub air_date: String,
}

/// Outcome of an upcoming-episodes query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "episodes", rename_all = "snake_case")]
pub enum Upcoming {
    /// At least one episode airs now or later
    Episodes(Vec<EpisodeEntry>),
    /// Nothing scheduled on the inspected season pages
    NoUpcoming,
}

/// Upcoming episodes paired with the show they belong to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingEpisodes {
    pub show_title: String,
    pub outcome: Upcoming,
}

impl UpcomingEpisodes {
    /// Wrap `episodes`, collapsing an empty list into [`Upcoming::NoUpcoming`].
    pub fn new(show_title: String, episodes: Vec<EpisodeEntry>) -> Self {
        let outcome = if episodes.is_empty() {
            Upcoming::NoUpcoming
        } else {
            Upcoming::Episodes(episodes)
        };
        Self { show_title, outcome }
    }

    /// Human readable line for the sentinel outcome.
    pub fn message(&self) -> Option<String> {
        match self.outcome {
            Upcoming::NoUpcoming => Some(format!(
                "Found no upcoming episodes for {}.",
                self.show_title
            )),
            Upcoming::Episodes(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_partition_is_exact() {
        for content_type in ["TV Series", "TV Mini Series", "TV Special", "TV Episode"] {
            assert!(Scope::Show.admits(content_type));
            assert!(!Scope::Movie.admits(content_type));
        }
        for content_type in ["Movie", "Video", "Short", NOT_AVAILABLE, ""] {
            assert!(Scope::Movie.admits(content_type));
            assert!(!Scope::Show.admits(content_type));
        }
    }

    #[test]
    fn test_scope_serialization() {
        assert_eq!(serde_json::to_string(&Scope::Show).unwrap(), "\"show\"");
        assert_eq!(serde_json::to_string(&Scope::Movie).unwrap(), "\"movie\"");
    }

    #[test]
    fn test_upcoming_empty_becomes_sentinel() {
        let result = UpcomingEpisodes::new("Severance".to_string(), Vec::new());
        assert_eq!(result.outcome, Upcoming::NoUpcoming);
        assert_eq!(
            result.message().as_deref(),
            Some("Found no upcoming episodes for Severance.")
        );
    }

    #[test]
    fn test_upcoming_with_episodes_has_no_message() {
        let episode = EpisodeEntry {
            title: "Hello, Ms. Cobel".to_string(),
            season: "2".to_string(),
            episode_number: "1".to_string(),
            air_date: "17 Jan. 2099".to_string(),
        };
        let result = UpcomingEpisodes::new("Severance".to_string(), vec![episode.clone()]);
        assert_eq!(result.outcome, Upcoming::Episodes(vec![episode]));
        assert!(result.message().is_none());
    }

    #[test]
    fn test_search_hit_serialization() {
        let hit = SearchHit {
            imdb_id: "0848228".to_string(),
            title: "The Avengers".to_string(),
            release_date: "2012".to_string(),
            content_type: "Movie".to_string(),
            cast: "Robert Downey Jr., Chris Evans".to_string(),
        };

        let json = serde_json::to_string(&hit).unwrap();
        let deserialized: SearchHit = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, hit);
        assert!(json.contains("\"content_type\":\"Movie\""));
    }
}
