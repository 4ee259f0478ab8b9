// pressline-core/src/interfaces/providers.rs
// ============================================================================
// Module: Provider interfaces
// Description: External-service abstractions the runtime depends on.
// Purpose: Let Scout/Reporter/Editor logic stay backend-agnostic; concrete
//          HTTP and deterministic-fake implementations live in
//          `pressline-providers` (spec §6 "External Interfaces").
// Dependencies: crate::core
// ============================================================================

use crate::core::Timestamp;

// ============================================================================
// SECTION: Embeddings
// ============================================================================

/// Failure modes of an [`EmbeddingProvider`].
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// The remote embedding service could not be reached or returned an
    /// error status.
    #[error("embedding provider request failed: {0}")]
    Request(String),
    /// The response body could not be decoded into a vector.
    #[error("embedding provider returned malformed output: {0}")]
    Malformed(String),
}

/// Turns text into a dense vector for dedup similarity comparisons (spec
/// §4.4, §6 "Embedding Provider").
pub trait EmbeddingProvider: Send + Sync {
    /// Computes the embedding for `text`.
    ///
    /// # Errors
    /// Returns [`EmbeddingError`] if the provider is unreachable or returns
    /// output of the wrong shape.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Returns the fixed dimensionality of vectors this provider produces.
    fn dimension(&self) -> usize;
}

// ============================================================================
// SECTION: Feed ingestion
// ============================================================================

/// One raw entry read from a feed, before newsworthiness scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    /// Entry title, if present.
    pub title: Option<String>,
    /// Entry summary/description, if present.
    pub summary: Option<String>,
    /// Canonical link to the source item, if present.
    pub link: Option<String>,
    /// Publication timestamp, if the feed supplies one.
    pub published_at: Option<Timestamp>,
}

/// Failure modes of a [`FeedReader`].
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The feed could not be fetched.
    #[error("feed fetch failed for {url}: {reason}")]
    Fetch {
        /// The feed URL that failed.
        url: String,
        /// Human-readable failure reason.
        reason: String,
    },
    /// The feed body could not be parsed.
    #[error("feed parse failed for {url}: {reason}")]
    Parse {
        /// The feed URL that failed to parse.
        url: String,
        /// Human-readable failure reason.
        reason: String,
    },
}

/// Fetches and parses a syndication feed into entries (spec §4.7 "Scout").
pub trait FeedReader: Send + Sync {
    /// Fetches `feed_url` and returns its entries, most recent first.
    ///
    /// # Errors
    /// Returns [`FeedError::Fetch`] on a transport failure or
    /// [`FeedError::Parse`] on a malformed body.
    fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>, FeedError>;
}

// ============================================================================
// SECTION: Search
// ============================================================================

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Result snippet, if supplied by the provider.
    pub snippet: Option<String>,
}

/// Failure modes of a [`SearchProvider`].
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The provider request failed.
    #[error("search request failed: {0}")]
    Request(String),
    /// Every provider in a fallback chain failed.
    #[error("all search providers failed for query {query:?}")]
    AllProvidersFailed {
        /// The query every provider failed on.
        query: String,
    },
}

/// Looks up web results for a research query (spec §6 "Search Provider").
pub trait SearchProvider: Send + Sync {
    /// Runs `query` and returns up to `limit` results.
    ///
    /// # Errors
    /// Returns [`SearchError::Request`] if the provider is unreachable.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError>;
}

/// Tries each provider in order, returning the first success (spec §6
/// "Search Provider" fallback chain).
pub struct FallbackSearchProvider {
    providers: Vec<Box<dyn SearchProvider>>,
}

impl FallbackSearchProvider {
    /// Builds a fallback chain from `providers`, tried in order.
    #[must_use]
    pub fn new(providers: Vec<Box<dyn SearchProvider>>) -> Self {
        Self { providers }
    }
}

impl SearchProvider for FallbackSearchProvider {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        for provider in &self.providers {
            if let Ok(results) = provider.search(query, limit) {
                return Ok(results);
            }
        }
        Err(SearchError::AllProvidersFailed { query: query.to_owned() })
    }
}

// ============================================================================
// SECTION: Chat / generation
// ============================================================================

/// Failure modes of a [`ChatProvider`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The provider request failed.
    #[error("chat provider request failed: {0}")]
    Request(String),
}

/// Generates text from a prompt (spec §6 "Chat Provider"), backing draft,
/// edit, and review task handlers.
pub trait ChatProvider: Send + Sync {
    /// Generates a completion for `prompt`.
    ///
    /// # Errors
    /// Returns [`ChatError::Request`] if the provider is unreachable.
    fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}
