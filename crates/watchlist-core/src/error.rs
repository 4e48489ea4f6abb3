//! Error types for the watchlist scraper
//!
//! This module defines the failure taxonomy shared by the fetcher, the
//! fragment locators and the facade. WatchlistError implements Serialize
//! so front ends can emit it as JSON.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::types::Scope;

/// The scraping operation a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    TitleSearch,
    DetailLookup,
    EpisodeListing,
    UpcomingEpisodes,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::TitleSearch => "title search",
            Operation::DetailLookup => "detail lookup",
            Operation::EpisodeListing => "episode listing",
            Operation::UpcomingEpisodes => "upcoming episodes",
        };
        f.write_str(name)
    }
}

/// Transport level failure while fetching a page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Could not reach the server or the connection broke mid-response
    #[error("Connection error fetching {url}. Make sure you are connected to the Internet: {message}")]
    Connection { url: String, message: String },

    /// The request exceeded the configured timeout
    #[error("Timeout fetching {url}")]
    Timeout { url: String },

    /// The server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// The redirect chain exceeded the redirect policy
    #[error("Too many redirects fetching {url}")]
    TooManyRedirects { url: String },
}

impl NetworkError {
    /// Classify a reqwest failure for `url`.
    pub fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            NetworkError::Timeout { url }
        } else if error.is_redirect() {
            NetworkError::TooManyRedirects { url }
        } else if let Some(status) = error.status() {
            NetworkError::HttpStatus {
                url,
                status: status.as_u16(),
            }
        } else {
            NetworkError::Connection {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// A page fragment did not match any known shape.
///
/// Raised by the locators and normalizers, which do not know which title or
/// identifier the caller asked for. The facade attaches that context with
/// [`ShapeError::with_subject`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation}: {reason}")]
pub struct ShapeError {
    pub operation: Operation,
    pub reason: String,
}

impl ShapeError {
    pub fn new(operation: Operation, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }

    /// Promote into a reportable error naming the title or identifier used.
    pub fn with_subject(self, subject: impl Into<String>) -> WatchlistError {
        WatchlistError::UnrecognizedShape {
            operation: self.operation,
            subject: subject.into(),
            reason: self.reason,
        }
    }
}

/// Error type for watchlist scraper operations
#[derive(Error, Debug)]
pub enum WatchlistError {
    /// Fetching a page failed; the caller may retry
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The page structure matched no known shape
    #[error(
        "Unable to parse the {operation} for '{subject}' ({reason}). \
         Probably the HTML elements have been changed. Please report this issue."
    )]
    UnrecognizedShape {
        operation: Operation,
        subject: String,
        reason: String,
    },

    /// A valid record of the other content type
    #[error("{imdb_id} is a {actual} ({content_type}). You can only search for {scope}s here.")]
    ScopeMismatch {
        imdb_id: String,
        scope: Scope,
        actual: Scope,
        content_type: String,
    },

    /// The caller cancelled an in-flight fetch
    #[error("Operation interrupted")]
    Interrupted,

    /// Caller-supplied title or identifier is unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl WatchlistError {
    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WatchlistError::Network(_))
    }
}

/// Serialize WatchlistError as its display string
impl Serialize for WatchlistError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for watchlist scraper operations
pub type Result<T> = std::result::Result<T, WatchlistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display_timeout() {
        let error = NetworkError::Timeout {
            url: "https://www.imdb.com/title/tt1/".to_string(),
        };
        assert_eq!(error.to_string(), "Timeout fetching https://www.imdb.com/title/tt1/");
    }

    #[test]
    fn test_network_error_display_status() {
        let error = NetworkError::HttpStatus {
            url: "/find/".to_string(),
            status: 503,
        };
        assert_eq!(error.to_string(), "HTTP 503 fetching /find/");
    }

    #[test]
    fn test_shape_error_with_subject() {
        let error = ShapeError::new(Operation::DetailLookup, "metadata list has 6 items")
            .with_subject("0848228");
        match &error {
            WatchlistError::UnrecognizedShape {
                operation,
                subject,
                reason,
            } => {
                assert_eq!(*operation, Operation::DetailLookup);
                assert_eq!(subject, "0848228");
                assert!(reason.contains("6 items"));
            }
            other => panic!("Expected UnrecognizedShape, got {other:?}"),
        }
        let display = error.to_string();
        assert!(display.contains("detail lookup"));
        assert!(display.contains("'0848228'"));
        assert!(display.contains("report this issue"));
    }

    #[test]
    fn test_scope_mismatch_display() {
        let error = WatchlistError::ScopeMismatch {
            imdb_id: "0848228".to_string(),
            scope: Scope::Show,
            actual: Scope::Movie,
            content_type: "Movie".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "0848228 is a movie (Movie). You can only search for tv shows here."
        );
    }

    #[test]
    fn test_only_network_errors_are_retryable() {
        let network = WatchlistError::from(NetworkError::Timeout { url: "/".to_string() });
        assert!(network.is_retryable());
        assert!(!WatchlistError::Interrupted.is_retryable());
        assert!(!ShapeError::new(Operation::TitleSearch, "x")
            .with_subject("y")
            .is_retryable());
    }

    #[test]
    fn test_watchlist_error_serialize() {
        let error = WatchlistError::Interrupted;
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, "\"Operation interrupted\"");
    }

    #[test]
    fn test_watchlist_error_serialize_invalid_input() {
        let error = WatchlistError::InvalidInput("empty title".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, "\"Invalid input: empty title\"");
    }
}
