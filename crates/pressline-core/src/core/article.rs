// pressline-core/src/core/article.rs
// ============================================================================
// Module: Article
// Description: The immutable published output of a story (spec §3 "Article").
// Purpose: Define the shape persisted by ArticleStore implementations.
// Dependencies: serde_json, crate::core
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ArticleId;
use crate::core::identifiers::StoryId;
use crate::core::time::Timestamp;

/// A published (or publish-ready) article (spec §3 "Article").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique article identifier.
    pub article_id: ArticleId,
    /// The story this article concludes.
    pub story_id: StoryId,
    /// Headline text.
    pub headline: String,
    /// Full article body.
    pub body: String,
    /// Author byline.
    pub byline: String,
    /// Short summary, also used to seed dedup memory (spec §4.4).
    pub summary: String,
    /// Source URLs or citations backing the article.
    pub sources: Vec<String>,
    /// Named entities mentioned in the article.
    pub entities: Vec<String>,
    /// Free-form classification tags.
    pub tags: Vec<String>,
    /// Additional structured metadata.
    pub metadata: serde_json::Value,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last-modified time; advances on each post-publish correction
    /// (spec §9 Open Question: an article may be corrected in place after
    /// publication, and `updated_at` tracks that without a new `ArticleId`).
    pub updated_at: Timestamp,
}
