// pressline-core/src/core/task.rs
// ============================================================================
// Module: Task
// Description: The mutable queued-work record (spec §3 "Task").
// Purpose: Define the task shape shared by TaskQueue implementations.
// Dependencies: serde_json, crate::core
// ============================================================================

//! ## Overview
//! A task is the unit dispatched to role workers. Its status transitions are
//! `pending -> active -> {completed, failed}`, enforced by the [`crate::interfaces::TaskQueue`]
//! trait contract, not by this plain data type.

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AgentId;
use crate::core::identifiers::Stage;
use crate::core::identifiers::StoryId;
use crate::core::identifiers::TaskId;
use crate::core::identifiers::TaskStatus;
use crate::core::time::Timestamp;

/// A queued unit of work for one story at one pipeline stage (spec §3 "Task").
///
/// # Invariants
/// - `status = Active` implies `assigned_agent.is_some()` and `started_at.is_some()`.
/// - `status = Pending` implies `assigned_agent.is_none()` and `started_at.is_none()`.
/// - `completed_at` and `output` are set together, only on the terminal
///   `Active -> Completed`/`Active -> Failed` transitions (spec §3 Invariant 4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub task_id: TaskId,
    /// The story this task advances.
    pub story_id: StoryId,
    /// Pipeline stage this task performs.
    pub stage: Stage,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Claim priority; higher claims first (spec §4.3 claim algorithm).
    pub priority: i32,
    /// The agent currently holding the lease, if `status = Active`.
    pub assigned_agent: Option<AgentId>,
    /// Input payload supplied at creation.
    pub input: serde_json::Value,
    /// Output payload, set on `Completed`/`Failed`.
    pub output: serde_json::Value,
    /// Creation time; the claim ordering tiebreaker (spec §4.3).
    pub created_at: Timestamp,
    /// Claim time, set on `Active`.
    pub started_at: Option<Timestamp>,
    /// Terminal time, set on `Completed`/`Failed`.
    pub completed_at: Option<Timestamp>,
    /// Optional soft deadline.
    pub deadline: Option<Timestamp>,
}

impl Task {
    /// Returns whether the task is currently stalled given `stalled_lease` and `now`
    /// (spec §4.3 "Stalled-task recovery").
    #[must_use]
    pub fn is_stalled(&self, stalled_lease: time::Duration, now: Timestamp) -> bool {
        matches!(self.status, TaskStatus::Active)
            && self.started_at.is_some_and(|started| started.elapsed_since(now) > stalled_lease)
    }
}

/// A newly created task's fields, before a `task_id`/`created_at` are assigned
/// by the store.
///
/// # Invariants
/// - `priority` should be non-negative by convention, though the store does
///   not enforce this; stage-transition rules in [`crate::runtime::chief`]
///   always compute non-negative priorities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    /// The story this task advances.
    pub story_id: StoryId,
    /// Pipeline stage this task performs.
    pub stage: Stage,
    /// Claim priority; higher claims first.
    pub priority: i32,
    /// Input payload.
    pub input: serde_json::Value,
    /// Optional soft deadline.
    pub deadline: Option<Timestamp>,
}
