//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use std::path::Path;

use rusqlite::{ffi, params, Connection, ErrorCode, Row};
use tracing::debug;
use watchlist_core::DetailRecord;

use crate::schema::initialize_schema;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::{release_timestamp, StoredTitle, Table};

const TITLE_COLUMNS: &str =
    "id, imdb_id, title, release_date, release_timestamp, rating, content_type, runtime, description";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and ensures the schema exists
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        initialize_schema(&conn)?;
        debug!(path = %path.display(), "storage opened");
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_titles(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<StoredTitle>> {
        let mut stmt = self.conn.prepare(sql)?;
        let titles = stmt
            .query_map(params, title_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(titles)
    }
}

fn title_from_row(row: &Row) -> rusqlite::Result<StoredTitle> {
    Ok(StoredTitle {
        id: row.get(0)?,
        imdb_id: row.get(1)?,
        title: row.get(2)?,
        release_date: row.get(3)?,
        release_timestamp: row.get(4)?,
        rating: row.get(5)?,
        content_type: row.get(6)?,
        runtime: row.get(7)?,
        description: row.get(8)?,
    })
}

/// Extended result code of a constraint violation, if `error` is one.
fn constraint_code(error: &rusqlite::Error) -> Option<i32> {
    match error {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Some(failure.extended_code)
        }
        _ => None,
    }
}

impl Storage for SqliteStorage {
    // ===== Titles =====

    fn insert(&mut self, table: Table, record: &DetailRecord) -> StorageResult<i64> {
        let sql = format!(
            "INSERT INTO {table} (imdb_id, title, release_date, release_timestamp, rating, content_type, runtime, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        );
        self.conn.execute(
            &sql,
            params![
                record.imdb_id,
                record.title,
                record.release_date,
                release_timestamp(&record.release_date),
                record.rating,
                record.content_type,
                record.runtime,
                record.description,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(%table, id, imdb_id = %record.imdb_id, "title stored");
        Ok(id)
    }

    fn query_all(&self, table: Table) -> StorageResult<Vec<StoredTitle>> {
        self.query_titles(
            &format!("SELECT {TITLE_COLUMNS} FROM {table} ORDER BY id"),
            [],
        )
    }

    fn query_by_title_substring(
        &self,
        table: Table,
        term: &str,
    ) -> StorageResult<Vec<StoredTitle>> {
        self.query_titles(
            &format!("SELECT {TITLE_COLUMNS} FROM {table} WHERE title LIKE ?1 ORDER BY id"),
            params![format!("%{term}%")],
        )
    }

    fn query_upcoming(&self, table: Table, threshold: i64) -> StorageResult<Vec<StoredTitle>> {
        self.query_titles(
            &format!(
                "SELECT {TITLE_COLUMNS} FROM {table} WHERE release_timestamp > ?1 ORDER BY release_timestamp, id"
            ),
            params![threshold],
        )
    }

    fn delete(&mut self, table: Table, id: i64) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
        Ok(deleted > 0)
    }

    fn query_known_show_identifiers(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT imdb_id FROM shows ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    // ===== Users =====

    fn add_user(&mut self, username: &str) -> StorageResult<()> {
        self.conn
            .execute("INSERT INTO users (username) VALUES (?1)", params![username])
            .map_err(|e| match constraint_code(&e) {
                Some(_) => StorageError::UserExists(username.to_string()),
                None => e.into(),
            })?;
        Ok(())
    }

    fn mark_watched(&mut self, username: &str, movie_id: i64) -> StorageResult<()> {
        self.conn
            .execute(
                "INSERT INTO watched (username, movie_id) VALUES (?1, ?2)",
                params![username, movie_id],
            )
            .map_err(|e| match constraint_code(&e) {
                Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => StorageError::UnknownReference {
                    username: username.to_string(),
                    movie_id,
                },
                Some(_) => StorageError::AlreadyWatched {
                    username: username.to_string(),
                    movie_id,
                },
                None => e.into(),
            })?;
        Ok(())
    }

    fn watched_movies(&self, username: &str) -> StorageResult<Vec<StoredTitle>> {
        self.query_titles(
            "SELECT DISTINCT movies.id, movies.imdb_id, movies.title, movies.release_date,
                    movies.release_timestamp, movies.rating, movies.content_type,
                    movies.runtime, movies.description
             FROM movies
             JOIN watched ON movies.id = watched.movie_id
             WHERE watched.username = ?1
             ORDER BY movies.id",
            params![username],
        )
    }
}
