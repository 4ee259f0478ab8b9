// pressline-core/src/core/event.rs
// ============================================================================
// Module: Event
// Description: The append-only, immutable event record (spec §3 "Event").
// Purpose: Define the single system-of-record shape all components fold over.
// Dependencies: serde_json, crate::core
// ============================================================================

//! ## Overview
//! Events are the sole source of truth for pipeline decisions (spec §3
//! Ownership, §5 Ordering guarantees). `payload` is intentionally
//! schemaless `serde_json::Value`; per-event-type shapes are documented in
//! [`event_type`] as constants, not as rigid Rust types (spec Design Note §9).

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AgentId;
use crate::core::identifiers::EventSeq;
use crate::core::identifiers::StoryId;
use crate::core::time::Timestamp;

/// Well-known, dotted-namespace event type labels.
///
/// Kept as `&str` constants rather than an enum because new task stages add
/// new `task.completed.<stage>` / `task.failed.<stage>` labels dynamically;
/// an exhaustive enum would have to be updated in lockstep with [`crate::core::identifiers::Stage`]
/// for no safety benefit, since consumers already branch on the payload.
pub mod event_type {
    /// A candidate story was detected by the Scout (`is_duplicate`, `score`, `title`, ...).
    pub const STORY_DETECTED: &str = "story.detected";
    /// A detection was admitted into the pipeline (`score`, `title`).
    pub const STORY_CREATED: &str = "story.created";
    /// A detection was rejected below the newsworthiness threshold (`reason`, `score`).
    pub const STORY_REJECTED: &str = "story.rejected";
    /// A story was terminated (`reason`, and reason-specific fields).
    pub const STORY_KILLED: &str = "story.killed";
    /// A draft task produced output (`task_id`, `output`).
    pub const DRAFT_COMPLETED: &str = "draft.completed";
    /// A revision (edit) task produced output (`task_id`, `output`).
    pub const REVISION_COMPLETED: &str = "revision.completed";
    /// An article was persisted and a publish task created (`article_id`).
    pub const ARTICLE_PUBLISHED: &str = "article.published";

    /// Returns the `task.completed.<stage>` label for `stage`.
    #[must_use]
    pub fn task_completed(stage: crate::core::identifiers::Stage) -> String {
        format!("task.completed.{}", stage.label())
    }

    /// Returns the `task.failed.<stage>` label for `stage`.
    #[must_use]
    pub fn task_failed(stage: crate::core::identifiers::Stage) -> String {
        format!("task.failed.{}", stage.label())
    }
}

/// An immutable, append-only event (spec §3 "Event").
///
/// # Invariants
/// - Never updated or deleted once persisted (spec §3 Invariant 1).
/// - `event_type` is never empty (spec §4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Backend-assigned monotonic sequence number.
    pub event_seq: EventSeq,
    /// The story this event belongs to.
    pub story_id: StoryId,
    /// The agent that produced this event, if any (Chief/Scout sweeps may be agent-less).
    pub agent_id: Option<AgentId>,
    /// Dotted-namespace event type, e.g. `story.detected`.
    pub event_type: String,
    /// Schemaless structured payload.
    pub payload: serde_json::Value,
    /// Wall-clock creation time.
    pub created_at: Timestamp,
}

impl Event {
    /// Returns `payload` as an object map, or an empty map if it is not an object.
    #[must_use]
    pub fn payload_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.payload.as_object().cloned().unwrap_or_default()
    }
}
