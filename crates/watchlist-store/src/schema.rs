//! Database schema definitions
//!
//! This module contains the SQL schema for the watchlist database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Movies on the watchlist
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    imdb_id TEXT NOT NULL,
    title TEXT NOT NULL,
    release_date TEXT NOT NULL,
    release_timestamp INTEGER,
    rating TEXT NOT NULL,
    content_type TEXT NOT NULL,
    runtime TEXT NOT NULL,
    description TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_movies_release ON movies(release_timestamp);

-- TV shows on the watchlist, kept apart for show-only extensions
CREATE TABLE IF NOT EXISTS shows (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    imdb_id TEXT NOT NULL,
    title TEXT NOT NULL,
    release_date TEXT NOT NULL,
    release_timestamp INTEGER,
    rating TEXT NOT NULL,
    content_type TEXT NOT NULL,
    runtime TEXT NOT NULL,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY
);

-- Which user has watched which movie
CREATE TABLE IF NOT EXISTS watched (
    username TEXT NOT NULL REFERENCES users(username),
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    UNIQUE(username, movie_id)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
