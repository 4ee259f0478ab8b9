// pressline-core/src/core/memory.rs
// ============================================================================
// Module: Memory
// Description: Per-story memory/embedding record (spec §3 "Memory Item").
// Purpose: Define the dedup-memory shape and its similarity query result.
// Dependencies: serde_json, crate::core
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::MemoryId;
use crate::core::identifiers::MemoryType;
use crate::core::identifiers::StoryId;
use crate::core::time::Timestamp;

/// A stored memory item with a dense embedding (spec §3 "Memory Item").
///
/// # Invariants
/// - `embedding` length is fixed at store initialization (spec §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique memory row identifier.
    pub id: MemoryId,
    /// The story this memory belongs to.
    pub story_id: StoryId,
    /// Text content the embedding was computed from.
    pub content: String,
    /// Dense embedding vector.
    pub embedding: Vec<f32>,
    /// Memory kind (summary rows back dedup queries; spec §4.4).
    pub memory_type: MemoryType,
    /// Additional structured metadata.
    pub metadata: serde_json::Value,
    /// Creation time.
    pub created_at: Timestamp,
}

/// One result row from a similarity query (spec §4.4 `find_similar`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMemory {
    /// The story the matched memory belongs to.
    pub story_id: StoryId,
    /// Cosine similarity in `[-1.0, 1.0]`, typically `[0.0, 1.0]` for text
    /// embeddings.
    pub similarity: f32,
    /// The matched memory's text content.
    pub content: String,
}

/// Computes cosine similarity between two equal-length vectors.
///
/// Returns `0.0` for zero-length or mismatched-length vectors (fail-closed:
/// such inputs never count as a match in [`crate::interfaces::MemoryStore::find_similar`]).
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { dot / (norm_a * norm_b) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only fixture assertions.")]
mod tests {
    use super::cosine_similarity;

    #[test]
    fn identical_vectors_have_similarity_one() {
        let v = vec![0.1, 0.2, 0.3, 0.4];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_have_similarity_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_are_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
