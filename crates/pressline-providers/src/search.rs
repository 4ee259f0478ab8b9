// pressline-providers/src/search.rs
// ============================================================================
// Module: Search providers
// Description: HTTP and deterministic-fake `SearchProvider` implementations.
// Purpose: Back the Research stage's sourcing step (spec §4.5, §6 "Search
//          Provider").
// Dependencies: pressline-core, reqwest
// ============================================================================

use std::time::Duration;

use pressline_core::interfaces::SearchError;
use pressline_core::interfaces::SearchProvider;
use pressline_core::interfaces::SearchResult;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchApiResponse {
    results: Vec<SearchApiResult>,
}

#[derive(Debug, Deserialize)]
struct SearchApiResult {
    title: String,
    url: String,
    snippet: Option<String>,
}

/// Calls a generic JSON search API's `/search?q=...&limit=...` endpoint
/// (spec §6 "Search Provider").
pub struct HttpSearchProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpSearchProvider {
    /// Builds a provider against `base_url`.
    ///
    /// # Errors
    /// Returns [`SearchError::Request`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SearchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| SearchError::Request(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

impl SearchProvider for HttpSearchProvider {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .query(&[("q", query), ("limit", &limit.to_string())])
            .send()
            .map_err(|err| SearchError::Request(err.to_string()))?
            .error_for_status()
            .map_err(|err| SearchError::Request(err.to_string()))?;
        let body: SearchApiResponse = response.json().map_err(|err| SearchError::Request(err.to_string()))?;
        Ok(body
            .results
            .into_iter()
            .map(|r| SearchResult { title: r.title, url: r.url, snippet: r.snippet })
            .collect())
    }
}

/// A deterministic, network-free search provider for tests and the demo
/// CLI profile: always returns the same fixed results regardless of query.
pub struct FakeSearchProvider {
    results: Vec<SearchResult>,
}

impl FakeSearchProvider {
    /// Builds a fake provider that always returns `results`.
    #[must_use]
    pub const fn new(results: Vec<SearchResult>) -> Self {
        Self { results }
    }

    /// Builds a fake provider that always fails, for exercising
    /// [`pressline_core::interfaces::FallbackSearchProvider`]'s retry chain.
    #[must_use]
    pub fn always_fails() -> Self {
        Self { results: Vec::new() }
    }
}

impl SearchProvider for FakeSearchProvider {
    fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        if self.results.is_empty() {
            return Err(SearchError::Request("fake provider configured to fail".to_owned()));
        }
        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only fixture assertions.")]
mod tests {
    use super::FakeSearchProvider;
    use pressline_core::interfaces::FallbackSearchProvider;
    use pressline_core::interfaces::SearchProvider;
    use pressline_core::interfaces::SearchResult;

    #[test]
    fn fallback_chain_tries_next_provider_on_failure() {
        let failing = FakeSearchProvider::always_fails();
        let working = FakeSearchProvider::new(vec![SearchResult {
            title: "t".to_owned(),
            url: "https://example.com".to_owned(),
            snippet: None,
        }]);
        let chain = FallbackSearchProvider::new(vec![Box::new(failing), Box::new(working)]);
        let results = chain.search("query", 5).unwrap();
        assert_eq!(results.len(), 1);
    }
}
