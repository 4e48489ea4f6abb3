//! Watchlist storage
//!
//! This crate persists the watchlist in SQLite:
//! - `movies` and `shows` hold looked-up titles
//! - `users` and `watched` track which user has seen which movie

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::fmt;
use std::path::Path;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use watchlist_core::Scope;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Title table a record is stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Movies,
    Shows,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Movies => "movies",
            Table::Shows => "shows",
        }
    }
}

impl From<Scope> for Table {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Movie => Table::Movies,
            Scope::Show => Table::Shows,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A title row as stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTitle {
    /// Local row id, used to delete or mark as watched
    pub id: i64,
    pub imdb_id: String,
    pub title: String,
    pub release_date: String,
    /// Start of the release year, when the release date names one
    pub release_timestamp: Option<i64>,
    pub rating: String,
    pub content_type: String,
    pub runtime: String,
    pub description: String,
}

/// Unix timestamp of 1 January (UTC) of the first year in a release date.
///
/// Both "2012" and "2011–2019" resolve to their first year; "NA" has none.
pub fn release_timestamp(release_date: &str) -> Option<i64> {
    let re = regex_lite::Regex::new(r"\b(\d{4})\b").ok()?;
    let year: i32 = re.captures(release_date)?.get(1)?.as_str().parse().ok()?;
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .map(|start| start.timestamp())
}
