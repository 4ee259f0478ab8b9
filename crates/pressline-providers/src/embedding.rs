// pressline-providers/src/embedding.rs
// ============================================================================
// Module: Embedding providers
// Description: HTTP and deterministic-fake `EmbeddingProvider` implementations.
// Purpose: Turn text into the dense vectors `pressline-core::runtime::scout`
//          and dedup queries consume (spec §4.4, §6 "Embedding Provider").
// Dependencies: pressline-core, reqwest, sha2
// ============================================================================

use std::time::Duration;

use pressline_core::interfaces::EmbeddingError;
use pressline_core::interfaces::EmbeddingProvider;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// Infers an embedding model's output dimensionality from common substrings
/// in its name (spec §4.4, carried over from the prototype's
/// `EmbeddingService.dimension` property).
///
/// Falls back to `384`, the dimension of the prototype's default model,
/// for unrecognized names.
#[must_use]
pub fn infer_dimension(model_name: &str) -> usize {
    let lower = model_name.to_lowercase();
    if lower.contains("large") || lower.contains("1024") {
        1024
    } else if lower.contains("ada") || lower.contains("1536") {
        1536
    } else if lower.contains("base") || lower.contains("768") {
        768
    } else {
        384
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Calls a local embedding service's `/embeddings` endpoint (spec §6
/// "Embedding Provider").
pub struct HttpEmbeddingProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingProvider {
    /// Builds a provider against `base_url` using `model`, inferring the
    /// output dimension from the model name.
    ///
    /// # Errors
    /// Returns [`EmbeddingError::Request`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, EmbeddingError> {
        let model = model.into();
        let dimension = infer_dimension(&model);
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| EmbeddingError::Request(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into(), model, dimension })
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&EmbeddingRequest { model: &self.model, input: text })
            .send()
            .map_err(|err| EmbeddingError::Request(err.to_string()))?
            .error_for_status()
            .map_err(|err| EmbeddingError::Request(err.to_string()))?;
        let body: EmbeddingResponse = response.json().map_err(|err| EmbeddingError::Malformed(err.to_string()))?;
        if body.embedding.len() != self.dimension {
            return Err(EmbeddingError::Malformed(format!(
                "expected {} dimensions, got {}",
                self.dimension,
                body.embedding.len()
            )));
        }
        Ok(body.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// A deterministic, network-free embedding provider for tests: hashes the
/// input text with SHA-256 and spreads the digest bytes into a fixed-length
/// unit vector. Identical text always yields an identical vector; similar
/// text does not reliably yield similar vectors (unlike a real embedding
/// model), so this is unsuitable for exercising dedup-similarity thresholds
/// meaningfully — only for exercising the plumbing.
pub struct FakeEmbeddingProvider {
    dimension: usize,
}

impl FakeEmbeddingProvider {
    /// Builds a fake provider producing vectors of length `dimension`.
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for FakeEmbeddingProvider {
    fn default() -> Self {
        Self::new(32)
    }
}

impl EmbeddingProvider for FakeEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let digest = Sha256::digest(text.as_bytes());
        let mut vector = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            let byte = digest[i % digest.len()];
            vector.push(f32::from(byte) / 255.0);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only fixture assertions.")]
mod tests {
    use super::FakeEmbeddingProvider;
    use super::infer_dimension;
    use pressline_core::interfaces::EmbeddingProvider;

    #[test]
    fn fake_embedding_is_deterministic() {
        let provider = FakeEmbeddingProvider::default();
        let a = provider.embed("hello world").unwrap();
        let b = provider.embed("hello world").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn infers_common_dimensions() {
        assert_eq!(infer_dimension("all-MiniLM-L6-v2"), 384);
        assert_eq!(infer_dimension("text-embedding-ada-002"), 1536);
        assert_eq!(infer_dimension("bge-large-en"), 1024);
        assert_eq!(infer_dimension("bge-base-en"), 768);
    }
}
