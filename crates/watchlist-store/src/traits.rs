//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use thiserror::Error;
use watchlist_core::DetailRecord;

use crate::{StoredTitle, Table};

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0} already exists. Try a different username.")]
    UserExists(String),

    #[error("Movie {movie_id} is already in the watched movies of {username}")]
    AlreadyWatched { username: String, movie_id: i64 },

    #[error("Unknown user '{username}' or movie {movie_id}")]
    UnknownReference { username: String, movie_id: i64 },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Titles live in one of two tables selected by [`Table`]; users and the
/// watched link only apply to movies.
pub trait Storage {
    // ===== Titles =====

    /// Stores a looked-up title and returns its local id
    fn insert(&mut self, table: Table, record: &DetailRecord) -> StorageResult<i64>;

    /// Every title of a table, oldest first
    fn query_all(&self, table: Table) -> StorageResult<Vec<StoredTitle>>;

    /// Titles whose name contains `term`
    fn query_by_title_substring(&self, table: Table, term: &str)
        -> StorageResult<Vec<StoredTitle>>;

    /// Titles releasing after the given Unix timestamp
    fn query_upcoming(&self, table: Table, threshold: i64) -> StorageResult<Vec<StoredTitle>>;

    /// Removes a title by local id; returns whether a row was deleted
    fn delete(&mut self, table: Table, id: i64) -> StorageResult<bool>;

    /// IMDb ids of every stored show
    fn query_known_show_identifiers(&self) -> StorageResult<Vec<String>>;

    // ===== Users =====

    fn add_user(&mut self, username: &str) -> StorageResult<()>;

    /// Records that `username` watched the movie with local id `movie_id`
    fn mark_watched(&mut self, username: &str, movie_id: i64) -> StorageResult<()>;

    /// Movies watched by `username`
    fn watched_movies(&self, username: &str) -> StorageResult<Vec<StoredTitle>>;
}
