//! HTTP client for IMDb pages
//!
//! This module provides the fetcher used by every scraping operation. Each
//! request carries a browser user agent, is bounded by a timeout and can be
//! cancelled through a shared [`CancellationToken`].

use std::time::Duration;

use reqwest::redirect::Policy;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{NetworkError, Result, WatchlistError};

/// Base URL for IMDb
pub const IMDB_BASE_URL: &str = "https://www.imdb.com";

/// Default User-Agent mimicking a desktop browser
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/53.0.2785.143 Safari/537.36";

/// Air dates are printed in the page language, so ask for English
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Maximum number of redirects followed per request
const MAX_REDIRECTS: usize = 10;

/// Configuration for the IMDb HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Scheme and host every path is resolved against
    pub base_url: String,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Request timeout in seconds (default: 5)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: IMDB_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 5,
        }
    }
}

/// HTTP client for IMDb
///
/// One instance is owned by each facade; nothing is shared process-wide
/// except an optionally injected cancellation token.
pub struct ImdbClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    base_url: String,
    cancel: CancellationToken,
}

impl ImdbClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Errors
    /// Returns `WatchlistError::InvalidInput` for an empty user agent and
    /// `WatchlistError::ClientBuild` if the HTTP client cannot be created
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            return Err(WatchlistError::InvalidInput(
                "user agent cannot be empty".to_string(),
            ));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .cookie_store(true)
            .build()
            .map_err(WatchlistError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the cancellation token, typically with one shared by every
    /// client of a front end.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that aborts in-flight and future fetches of this client.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Absolute URL for a path on the configured host.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch HTML content from an IMDb path
    ///
    /// # Arguments
    /// * `path` - Relative path on IMDb (e.g., "/title/tt0848228/")
    ///
    /// # Returns
    /// The page body as a string
    ///
    /// # Errors
    /// - `WatchlistError::Network` - connection, timeout, HTTP status or redirect failure
    /// - `WatchlistError::Interrupted` - the cancellation token fired first
    pub async fn fetch(&self, path: &str) -> Result<String> {
        let url = self.url_for(path);

        // Dropping the losing request future closes its connection.
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(%url, "fetch interrupted");
                Err(WatchlistError::Interrupted)
            }
            result = self.get(&url) => result,
        }
    }

    async fn get(&self, url: &str) -> Result<String> {
        debug!(%url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NetworkError::from_reqwest(url, &e))?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "response received");
        if !status.is_success() {
            return Err(NetworkError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::from_reqwest(url, &e))?;
        Ok(body)
    }
}
