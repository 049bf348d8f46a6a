//! Remote meme catalog: the provider client and the local cache over its
//! last successful response.
//!
//! The upstream provider returns its entire catalog in one response. There
//! are no pagination or filter parameters to send: "load more" and search
//! are purely client-side concerns layered over the cached list.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A catalog entry. Immutable once fetched: identity is `id`, and no local
/// operation ever rewrites a meme's fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meme {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Errors that can occur while fetching from a remote provider.
///
/// Callers recover locally from all of these: the catalog falls back to an
/// empty list, the caption provider falls back to a fixed string. Nothing
/// here is surfaced as a blocking failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Wire shape of the catalog endpoint: `{ "data": { "memes": [...] } }`.
#[derive(Deserialize)]
struct CatalogResponse {
    data: CatalogData,
}

#[derive(Deserialize)]
struct CatalogData {
    memes: Vec<Meme>,
}

// ============================================================================
// Provider Client
// ============================================================================

/// Read-only client for the external catalog endpoint.
///
/// One best-effort attempt per call: no retry, no backoff. The cache decides
/// what to do with a failure.
#[derive(Clone)]
pub struct CatalogProvider {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl CatalogProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Fetch the full catalog in a single request.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] - request exceeded the configured timeout
    /// - [`FetchError::Network`] - connection or TLS errors
    /// - [`FetchError::HttpStatus`] - non-2xx HTTP response
    /// - [`FetchError::Decode`] - payload was not the expected shape
    pub async fn fetch_all(&self) -> Result<Vec<Meme>, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.client.get(&self.endpoint).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let payload: CatalogResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        tracing::debug!(count = payload.data.memes.len(), "Fetched catalog");
        Ok(payload.data.memes)
    }
}

// ============================================================================
// Catalog Cache
// ============================================================================

/// Holds the most recent successful catalog fetch and answers search and
/// pagination questions over it.
#[derive(Debug, Default)]
pub struct CatalogCache {
    memes: Vec<Meme>,
    has_more: bool,
}

impl CatalogCache {
    /// Replace the cache content with a fresh fetch.
    ///
    /// On failure the current content is left unchanged and the error is
    /// returned so the caller can fall back to an empty or previous list.
    pub async fn refresh(&mut self, provider: &CatalogProvider) -> Result<&[Meme], FetchError> {
        let memes = provider.fetch_all().await?;
        // The provider has no real pages: "has more" is simply whether the
        // one-shot fetch returned anything at all.
        self.has_more = !memes.is_empty();
        self.memes = memes;
        Ok(&self.memes)
    }

    /// Mark the catalog as exhausted (used after a failed initial fetch so
    /// the feed shows "no more results" instead of a perpetual loader).
    pub fn mark_exhausted(&mut self) {
        self.has_more = false;
    }

    /// Case-insensitive substring filter over meme names, preserving catalog
    /// order. An empty query returns the full cached list unfiltered.
    ///
    /// Computed fresh each call; catalogs are small enough that an
    /// incremental index would buy nothing.
    pub fn apply_search(&self, query: &str) -> Vec<Meme> {
        if query.is_empty() {
            return self.memes.clone();
        }
        let needle = query.to_lowercase();
        self.memes
            .iter()
            .filter(|meme| meme.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Look up a single catalog entry by id (detail view).
    pub fn find(&self, meme_id: &str) -> Option<&Meme> {
        self.memes.iter().find(|meme| meme.id == meme_id)
    }

    pub fn memes(&self) -> &[Meme] {
        &self.memes
    }

    /// Whether a "load more" affordance should be shown. Fixed after the
    /// initial fetch: the underlying data source has no pages.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_empty(&self) -> bool {
        self.memes.is_empty()
    }
}
