//! Main watchlist scraper API
//!
//! This module provides the facade over the IMDb client and parsers. A
//! facade is scoped at construction to movies or shows and only returns
//! records of that partition.

use chrono::{Local, NaiveDateTime};
use tracing::{debug, warn};

use crate::client::ImdbClient;
use crate::error::{Operation, Result, WatchlistError};
use crate::parser::{
    locate_episode_guide, locate_episode_rows, normalize_episode_rows, parse_detail,
    parse_search_results, EpisodePage,
};
use crate::schedule::{plan_seasons, SeasonPlan};
use crate::types::{DetailRecord, EpisodeEntry, Scope, SearchHit, UpcomingEpisodes};

/// Normalize a user supplied IMDb identifier to its numeric part.
///
/// Accepts "0848228" and "tt0848228".
///
/// # Examples
/// ```
/// use watchlist_core::scraper::normalize_imdb_id;
///
/// assert_eq!(normalize_imdb_id(" tt0848228 ").unwrap(), "0848228");
/// assert!(normalize_imdb_id("avengers").is_err());
/// ```
pub fn normalize_imdb_id(input: &str) -> Result<String> {
    let re = regex_lite::Regex::new(r"^(?:tt)?(\d+)$")
        .map_err(|e| WatchlistError::InvalidInput(e.to_string()))?;
    re.captures(input.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            WatchlistError::InvalidInput(format!("'{}' is not an IMDb id", input.trim()))
        })
}

/// Scraper facade for IMDb
///
/// # Example
/// ```no_run
/// use watchlist_core::{ImdbScraper, Scope};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let scraper = ImdbScraper::new(Scope::Movie)?;
///
///     let hits = scraper.search_by_title("avengers").await?;
///     println!("Found {} movies", hits.len());
///
///     Ok(())
/// }
/// ```
pub struct ImdbScraper {
    client: ImdbClient,
    scope: Scope,
}

impl ImdbScraper {
    /// Create a new scraper with a default client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(scope: Scope) -> Result<Self> {
        let client = ImdbClient::new()?;
        Ok(Self { client, scope })
    }

    /// Create a new scraper with a pre-configured client.
    pub fn with_client(client: ImdbClient, scope: Scope) -> Self {
        Self { client, scope }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Search titles by (partial) name.
    ///
    /// Returns every normalized row of the result page that belongs to this
    /// scraper's scope, in page order.
    ///
    /// # Errors
    /// * `WatchlistError::InvalidInput` if the title is empty or whitespace-only
    /// * `WatchlistError::UnrecognizedShape` if the result page cannot be parsed
    pub async fn search_by_title(&self, title: &str) -> Result<Vec<SearchHit>> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::InvalidInput(
                "Search title cannot be empty".to_string(),
            ));
        }

        let path = format!("/find/?q={}&s=tt", urlencoding::encode(trimmed));
        let html = self.client.fetch(&path).await?;

        let hits = parse_search_results(&html).map_err(|e| {
            warn!(title = trimmed, error = %e, "title search page not recognized");
            e.with_subject(trimmed)
        })?;
        let total = hits.len();
        let hits: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| self.scope.admits(&hit.content_type))
            .collect();
        debug!(title = trimmed, total, kept = hits.len(), scope = %self.scope, "title search done");

        Ok(hits)
    }

    /// Look up one title by IMDb id.
    ///
    /// # Errors
    /// * `WatchlistError::ScopeMismatch` if the title belongs to the other scope
    /// * `WatchlistError::UnrecognizedShape` if the detail page cannot be parsed
    pub async fn search_by_id(&self, identifier: &str) -> Result<DetailRecord> {
        let imdb_id = normalize_imdb_id(identifier)?;
        let html = self.client.fetch(&format!("/title/tt{imdb_id}/")).await?;

        let record = parse_detail(&imdb_id, &html).map_err(|e| {
            warn!(%imdb_id, error = %e, "detail page not recognized");
            e.with_subject(imdb_id.as_str())
        })?;

        if !self.scope.admits(&record.content_type) {
            return Err(WatchlistError::ScopeMismatch {
                imdb_id,
                scope: self.scope,
                actual: Scope::of(&record.content_type),
                content_type: record.content_type,
            });
        }

        Ok(record)
    }

    /// Episodes of a show airing now or later, with the show's title.
    ///
    /// When the guide's selected season is not the show's last season, both
    /// season pages are read and their upcoming rows concatenated.
    ///
    /// # Errors
    /// * `WatchlistError::UnrecognizedShape` for an unparsable guide, season
    ///   selector, or air date
    pub async fn upcoming_episodes(&self, identifier: &str) -> Result<UpcomingEpisodes> {
        let imdb_id = normalize_imdb_id(identifier)?;
        let operation = Operation::UpcomingEpisodes;
        let now = Local::now().naive_local();

        let root = self
            .client
            .fetch(&format!("/title/tt{imdb_id}/episodes/"))
            .await?;
        let guide = locate_episode_guide(&root).map_err(|e| e.with_subject(imdb_id.as_str()))?;
        let plan = plan_seasons(&guide).map_err(|e| e.with_subject(imdb_id.as_str()))?;
        debug!(%imdb_id, show = %guide.show_title, ?plan, "season plan");

        let episodes = match plan {
            SeasonPlan::Root { .. } => {
                let page = locate_episode_rows(&root, operation)
                    .map_err(|e| e.with_subject(imdb_id.as_str()))?;
                self.upcoming_rows(&imdb_id, page, now)?
            }
            SeasonPlan::SelectedAndLast { selected, last } => {
                let selected_path = season_path(&imdb_id, selected);
                let last_path = season_path(&imdb_id, last);
                let (selected_html, last_html) = tokio::try_join!(
                    self.client.fetch(&selected_path),
                    self.client.fetch(&last_path),
                )?;
                let mut episodes = Vec::new();
                for html in [selected_html, last_html] {
                    let page = locate_episode_rows(&html, operation)
                        .map_err(|e| e.with_subject(imdb_id.as_str()))?;
                    episodes.extend(self.upcoming_rows(&imdb_id, page, now)?);
                }
                episodes
            }
        };

        Ok(UpcomingEpisodes::new(guide.show_title, episodes))
    }

    fn upcoming_rows(
        &self,
        imdb_id: &str,
        page: EpisodePage,
        now: NaiveDateTime,
    ) -> Result<Vec<EpisodeEntry>> {
        normalize_episode_rows(page, Some(now), Operation::UpcomingEpisodes).map_err(|e| {
            warn!(imdb_id, error = %e, "episode rows not recognized");
            e.with_subject(imdb_id)
        })
    }

    /// Every dated episode of one season, unfiltered.
    ///
    /// Without a season the guide's default season is listed.
    pub async fn episodes(&self, identifier: &str, season: Option<u32>) -> Result<Vec<EpisodeEntry>> {
        let imdb_id = normalize_imdb_id(identifier)?;
        let path = match season {
            Some(season) => season_path(&imdb_id, season),
            None => format!("/title/tt{imdb_id}/episodes/"),
        };
        let html = self.client.fetch(&path).await?;

        locate_episode_rows(&html, Operation::EpisodeListing)
            .and_then(|page| normalize_episode_rows(page, None, Operation::EpisodeListing))
            .map_err(|e| e.with_subject(imdb_id.as_str()))
    }
}

fn season_path(imdb_id: &str, season: u32) -> String {
    format!("/title/tt{imdb_id}/episodes?season={season}")
}
