//! Command handlers shared by subcommands and the interactive menu

use std::io::Write;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use watchlist_core::{
    normalize_imdb_id, ClientConfig, DetailRecord, ImdbClient, ImdbScraper, Scope,
    UpcomingEpisodes, WatchlistError,
};
use watchlist_store::{Storage, StorageError, StoredTitle, Table};

use crate::render;

/// Parse a local row id typed on the command line or in the menu.
pub fn parse_local_id(input: &str) -> Result<i64> {
    input
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a local id", input.trim()))
}

/// Message for a title found in the wrong partition.
pub fn scope_mismatch_message(scope: Scope, actual: Scope) -> String {
    format!("This is a {actual}. You can only search for {scope}s here.")
}

/// One show's outcome in an upcoming-episodes sweep
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SweepEntry {
    Found(UpcomingEpisodes),
    Failed { imdb_id: String, error: WatchlistError },
}

pub struct App<S, W> {
    storage: S,
    client_config: ClientConfig,
    cancel: CancellationToken,
    json: bool,
    out: W,
}

impl<S: Storage, W: Write> App<S, W> {
    pub fn new(
        storage: S,
        client_config: ClientConfig,
        cancel: CancellationToken,
        json: bool,
        out: W,
    ) -> Self {
        Self {
            storage,
            client_config,
            cancel,
            json,
            out,
        }
    }

    fn scraper(&self, scope: Scope) -> Result<ImdbScraper> {
        let client = ImdbClient::with_config(self.client_config.clone())?
            .with_cancellation(self.cancel.clone());
        Ok(ImdbScraper::with_client(client, scope))
    }

    fn emit<T: Serialize + ?Sized>(&mut self, value: &T, text: impl FnOnce(&T) -> String) -> Result<()> {
        let rendered = if self.json {
            render::json(value)
        } else {
            text(value)
        };
        writeln!(self.out, "{rendered}")?;
        Ok(())
    }

    fn say(&mut self, line: &str) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", render::json(&serde_json::json!({ "message": line })))?;
        } else {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    /// Look up a title, rendering a scope mismatch as a message.
    ///
    /// Returns `None` when the title belongs to the other partition.
    async fn fetch_detail(&mut self, scope: Scope, identifier: &str) -> Result<Option<DetailRecord>> {
        match self.scraper(scope)?.search_by_id(identifier).await {
            Ok(record) => Ok(Some(record)),
            Err(WatchlistError::ScopeMismatch { scope, actual, .. }) => {
                self.say(&scope_mismatch_message(scope, actual))?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn search(&mut self, scope: Scope, title: &str) -> Result<()> {
        let hits = self.scraper(scope)?.search_by_title(title).await?;
        info!(title, count = hits.len(), "title search");
        if hits.is_empty() {
            return self.say(&format!("No {scope}s found for '{}'", title.trim()));
        }
        self.emit(hits.as_slice(), |hits| render::search_hits(hits))
    }

    pub async fn lookup(&mut self, scope: Scope, identifier: &str) -> Result<Option<DetailRecord>> {
        let record = self.fetch_detail(scope, identifier).await?;
        if let Some(record) = &record {
            self.emit(record, render::detail)?;
        }
        Ok(record)
    }

    /// Look up a title and store it once `confirm` accepts the record.
    pub async fn add(
        &mut self,
        scope: Scope,
        identifier: &str,
        confirm: impl FnOnce(&DetailRecord) -> Result<bool>,
    ) -> Result<()> {
        let Some(record) = self.lookup(scope, identifier).await? else {
            return Ok(());
        };
        if !confirm(&record)? {
            return self.say("Nothing added");
        }

        let table = Table::from(scope);
        let id = self.storage.insert(table, &record)?;
        info!(%table, id, imdb_id = %record.imdb_id, "title stored");
        self.say(&format!("Added '{}' to {table} with id {id}", record.title))
    }

    /// Render stored titles, or `empty` in text mode when there are none.
    fn emit_titles(&mut self, heading: &str, titles: &[StoredTitle], empty: &str) -> Result<()> {
        if titles.is_empty() && !self.json {
            return self.say(empty);
        }
        self.emit(titles, |titles| render::stored_titles(heading, titles))
    }

    pub fn list(&mut self, scope: Scope, upcoming: bool) -> Result<()> {
        let table = Table::from(scope);
        if upcoming {
            let titles = self.storage.query_upcoming(table, Utc::now().timestamp())?;
            let empty = format!("There are no upcoming {scope}s in the watchlist!");
            self.emit_titles(&format!("Upcoming {table}"), &titles, &empty)
        } else {
            let titles = self.storage.query_all(table)?;
            let empty = format!("There are no {scope}s in the watchlist!");
            self.emit_titles(&format!("All {table}"), &titles, &empty)
        }
    }

    pub fn find(&mut self, scope: Scope, term: &str) -> Result<()> {
        let table = Table::from(scope);
        let titles = self.storage.query_by_title_substring(table, term.trim())?;
        let heading = format!("{table} matching '{}'", term.trim());
        let empty = format!("Found no {scope}s for that search term!");
        self.emit_titles(&heading, &titles, &empty)
    }

    /// Delete a stored title once `confirm` accepts it.
    pub fn delete(
        &mut self,
        scope: Scope,
        id: i64,
        confirm: impl FnOnce(i64) -> Result<bool>,
    ) -> Result<()> {
        if !confirm(id)? {
            return self.say("Nothing deleted");
        }
        let table = Table::from(scope);
        if self.storage.delete(table, id)? {
            info!(%table, id, "title deleted");
            self.say(&format!("Deleted {id} from {table}"))
        } else {
            self.say(&format!("No entry {id} in {table}"))
        }
    }

    pub async fn episodes(&mut self, identifier: &str, season: Option<u32>) -> Result<()> {
        let episodes = self.scraper(Scope::Show)?.episodes(identifier, season).await?;
        let heading = match season {
            Some(season) => format!("tt{} season {season}", normalize_imdb_id(identifier)?),
            None => format!("tt{}", normalize_imdb_id(identifier)?),
        };
        self.emit(episodes.as_slice(), |episodes| render::episodes(&heading, episodes))
    }

    /// Upcoming episodes of every stored show.
    ///
    /// A show whose pages cannot be read is reported and skipped; an
    /// interrupt stops the sweep.
    pub async fn upcoming(&mut self) -> Result<Vec<SweepEntry>> {
        let identifiers = self.storage.query_known_show_identifiers()?;
        if identifiers.is_empty() {
            self.say("No shows stored yet")?;
            return Ok(Vec::new());
        }

        let scraper = self.scraper(Scope::Show)?;
        let mut sweep = Vec::with_capacity(identifiers.len());
        for imdb_id in identifiers {
            match scraper.upcoming_episodes(&imdb_id).await {
                Ok(result) => {
                    if !self.json {
                        writeln!(self.out, "{}", render::upcoming(&result))?;
                    }
                    sweep.push(SweepEntry::Found(result));
                }
                Err(WatchlistError::Interrupted) => return Err(WatchlistError::Interrupted.into()),
                Err(error) => {
                    warn!(%imdb_id, %error, "skipping show");
                    if !self.json {
                        writeln!(self.out, "Could not read episodes of tt{imdb_id}: {error}")?;
                    }
                    sweep.push(SweepEntry::Failed { imdb_id, error });
                }
            }
        }

        if self.json {
            writeln!(self.out, "{}", render::json(&sweep))?;
        }
        Ok(sweep)
    }

    pub fn add_user(&mut self, username: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            anyhow::bail!("Username cannot be empty");
        }
        match self.storage.add_user(username) {
            Ok(()) => self.say(&format!("Added user {username}")),
            Err(e @ StorageError::UserExists(_)) => self.say(&e.to_string()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn watch(&mut self, username: &str, movie_id: i64) -> Result<()> {
        match self.storage.mark_watched(username.trim(), movie_id) {
            Ok(()) => self.say(&format!("Marked movie {movie_id} as watched by {}", username.trim())),
            Err(e @ StorageError::AlreadyWatched { .. }) => self.say(&e.to_string()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn watched(&mut self, username: &str) -> Result<()> {
        let username = username.trim();
        let titles = self.storage.watched_movies(username)?;
        let heading = format!("Watched by {username}");
        let empty = format!("{username} has watched no movies yet!");
        self.emit_titles(&heading, &titles, &empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchlist_store::SqliteStorage;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MOVIE_PAGE: &str = r#"
        <h1 data-testid="hero-title-block__title">The Avengers</h1>
        <ul data-testid="hero-title-block__metadata">
            <li><span>2012</span></li>
            <li>PG-13</li>
            <li>2h 23m</li>
        </ul>
        <div data-testid="hero-rating-bar__aggregate-rating__score"><span>8.0</span>/10</div>
        <span data-testid="plot-xl">Earth's mightiest heroes must come together.</span>
    "#;

    const SHOW_GUIDE: &str = r#"
        <h3 itemprop="name"><a href="/title/tt0944947/">Game of Thrones</a></h3>
        <select id="bySeason">
            <option value="1" selected="selected">1</option>
        </select>
        <div class="info">
            <meta itemprop="episodeNumber" content="1"/>
            <div class="airdate">17 Apr. 2011</div>
            <strong><a href="/title/tt1480055/" title="Winter Is Coming">Winter Is Coming</a></strong>
        </div>
    "#;

    fn app(server: &MockServer, json: bool) -> App<SqliteStorage, Vec<u8>> {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let config = ClientConfig {
            base_url: server.uri(),
            ..ClientConfig::default()
        };
        App::new(storage, config, CancellationToken::new(), json, Vec::new())
    }

    fn printed<S>(app: &App<S, Vec<u8>>) -> String {
        String::from_utf8(app.out.clone()).unwrap()
    }

    #[test]
    fn test_scope_mismatch_message() {
        assert_eq!(
            scope_mismatch_message(Scope::Show, Scope::Movie),
            "This is a movie. You can only search for tv shows here."
        );
    }

    #[test]
    fn test_parse_local_id() {
        assert_eq!(parse_local_id(" 12 ").unwrap(), 12);
        assert!(parse_local_id("twelve").is_err());
    }

    #[tokio::test]
    async fn test_add_stores_confirmed_movie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title/tt0848228/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOVIE_PAGE))
            .mount(&server)
            .await;

        let mut app = app(&server, false);
        app.add(Scope::Movie, "tt0848228", |_| Ok(true)).await.unwrap();

        let stored = app.storage.query_all(Table::Movies).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "The Avengers");
        assert!(printed(&app).contains("Added 'The Avengers' to movies"));
    }

    #[tokio::test]
    async fn test_add_declined_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title/tt0848228/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOVIE_PAGE))
            .mount(&server)
            .await;

        let mut app = app(&server, false);
        app.add(Scope::Movie, "0848228", |_| Ok(false)).await.unwrap();

        assert!(app.storage.query_all(Table::Movies).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_in_wrong_scope_adds_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title/tt0848228/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(MOVIE_PAGE))
            .mount(&server)
            .await;

        let mut app = app(&server, false);
        app.add(Scope::Show, "0848228", |_| Ok(true)).await.unwrap();

        assert!(app.storage.query_all(Table::Shows).unwrap().is_empty());
        assert!(printed(&app).contains("This is a movie. You can only search for tv shows here."));
    }

    #[tokio::test]
    async fn test_upcoming_reports_and_continues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/title/tt0944947/episodes/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SHOW_GUIDE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/title/tt0000001/episodes/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut app = app(&server, false);
        for imdb_id in ["0000001", "0944947"] {
            let record = DetailRecord {
                imdb_id: imdb_id.to_string(),
                title: "Show".to_string(),
                release_date: "2011–2019".to_string(),
                content_type: "TV Series".to_string(),
                rating: "9.2".to_string(),
                runtime: "57m".to_string(),
                description: String::new(),
            };
            app.storage.insert(Table::Shows, &record).unwrap();
        }

        let sweep = app.upcoming().await.unwrap();
        assert_eq!(sweep.len(), 2);
        assert!(matches!(sweep[0], SweepEntry::Failed { .. }));
        assert!(matches!(sweep[1], SweepEntry::Found(_)));
        assert!(printed(&app).contains("Found no upcoming episodes for Game of Thrones."));
    }

    #[tokio::test]
    async fn test_interrupted_lookup_is_an_error() {
        let server = MockServer::start().await;
        let mut app = app(&server, false);
        app.cancel.cancel();

        let err = app.lookup(Scope::Movie, "0848228").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WatchlistError>(),
            Some(WatchlistError::Interrupted)
        ));
    }

    #[test]
    fn test_users_and_watched() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut app = App::new(
            storage,
            ClientConfig::default(),
            CancellationToken::new(),
            true,
            Vec::new(),
        );

        app.add_user("alice").unwrap();
        app.add_user("alice").unwrap();
        assert!(printed(&app).contains("alice already exists"));

        assert!(app.add_user("   ").is_err());
        app.watched("alice").unwrap();
        assert!(printed(&app).contains("[]"));
    }

    #[test]
    fn test_empty_results_have_messages() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut app = App::new(
            storage,
            ClientConfig::default(),
            CancellationToken::new(),
            false,
            Vec::new(),
        );
        app.add_user("bob").unwrap();

        app.find(Scope::Movie, "avengers").unwrap();
        app.find(Scope::Show, "thrones").unwrap();
        app.watched("bob").unwrap();
        app.list(Scope::Movie, true).unwrap();

        let out = printed(&app);
        assert!(out.contains("Found no movies for that search term!"));
        assert!(out.contains("Found no tv shows for that search term!"));
        assert!(out.contains("bob has watched no movies yet!"));
        assert!(out.contains("There are no upcoming movies in the watchlist!"));
        assert!(!out.contains("-- End --"));
    }
}
