// pressline-core/src/core/human.rs
// ============================================================================
// Module: Human
// Description: Human-oversight records (spec §3 "Human Prompt", "Human Source").
// Purpose: Define the shapes persisted by HumanOversightStore implementations.
// Dependencies: serde_json, crate::core
// ============================================================================

//! ## Overview
//! Humans interact with the pipeline two ways: supplying a [`HumanSource`]
//! (a lead to investigate) and asking a [`HumanPrompt`] (a question the Chief
//! routes to a research task). Neither type is ever claimed by role workers
//! directly; the Chief mediates both, per spec §4.8.

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::HumanPromptId;
use crate::core::identifiers::HumanPromptStatus;
use crate::core::identifiers::HumanSourceId;
use crate::core::identifiers::HumanSourceType;
use crate::core::identifiers::StoryId;
use crate::core::identifiers::TaskId;
use crate::core::time::Timestamp;

/// A human-supplied lead to investigate (spec §3 "Human Source").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanSource {
    /// Unique identifier.
    pub id: HumanSourceId,
    /// Kind of source supplied.
    pub source_type: HumanSourceType,
    /// The URL, inline text, or document reference itself.
    pub content: String,
    /// The story this source gave rise to, once the Chief admits it.
    pub story_id: Option<StoryId>,
    /// Creation time.
    pub created_at: Timestamp,
}

/// A human question routed through the pipeline (spec §3 "Human Prompt").
///
/// # Invariants
/// - `status = Processing` implies `research_task_id.is_some()` (spec §4.8).
/// - `status = Answered` implies `response.is_some()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanPrompt {
    /// Unique identifier.
    pub id: HumanPromptId,
    /// The question text.
    pub prompt: String,
    /// Current lifecycle status.
    pub status: HumanPromptStatus,
    /// The research task enqueued to answer this prompt, once dispatched.
    pub research_task_id: Option<TaskId>,
    /// The research worker's answer, once available.
    pub response: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
}
