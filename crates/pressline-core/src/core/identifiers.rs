// pressline-core/src/core/identifiers.rs
// ============================================================================
// Module: Identifiers
// Description: Opaque identifiers and small closed enums for the pipeline.
// Purpose: Give every entity a stable, newtyped identifier and a single
//          well-known place for the stage/role mapping (see spec Design Notes).
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! All identifiers wrap [`uuid::Uuid`] to avoid accidental cross-entity
//! mixups (a `TaskId` cannot be passed where a `StoryId` is expected).

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

macro_rules! uuid_newtype {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_newtype!(StoryId, "Stable identifier of a story (the unit of pipeline progress).");
uuid_newtype!(TaskId, "Identifier of a single queued unit of work.");
uuid_newtype!(AgentId, "Identifier of a registered worker process.");
uuid_newtype!(MemoryId, "Identifier of a stored memory/embedding row.");
uuid_newtype!(ArticleId, "Identifier of an immutable published article.");
uuid_newtype!(HumanPromptId, "Identifier of a human oversight prompt.");
uuid_newtype!(HumanSourceId, "Identifier of a human-supplied source.");

/// Backend-assigned monotonic event sequence number.
///
/// # Invariants
/// - Monotonic per backend assignment, not per story (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventSeq(i64);

impl EventSeq {
    /// Wraps a raw sequence value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// Pipeline stage.
///
/// # Invariants
/// - Exhaustive; every `Task` has exactly one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Signal detection (Scout; never queued, see spec §4.7).
    Detect,
    /// Fact gathering and sourcing.
    Research,
    /// Initial article draft.
    Draft,
    /// Revision in response to a review rejection.
    Edit,
    /// Factual/stylistic quality review.
    Review,
    /// Delivery to one or more channels.
    Publish,
}

impl Stage {
    /// Returns the dotted-namespace label used in event types
    /// (`task.completed.<stage>`, `task.failed.<stage>`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Research => "research",
            Self::Draft => "draft",
            Self::Edit => "edit",
            Self::Review => "review",
            Self::Publish => "publish",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Worker role.
///
/// # Invariants
/// - Exhaustive; every `Agent` has exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The orchestrator.
    Chief,
    /// The ingestion loop.
    Scout,
    /// Claims research/draft/edit tasks.
    Reporter,
    /// Claims review tasks.
    Editor,
    /// Claims publish tasks.
    Publisher,
}

impl Role {
    /// Returns the short label used in the `agents` table and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chief => "chief",
            Self::Scout => "scout",
            Self::Reporter => "reporter",
            Self::Editor => "editor",
            Self::Publisher => "publisher",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Returns the single role eligible to claim tasks at `stage`, per the
/// authoritative role-to-stage mapping in spec §4.3.
///
/// `Stage::Detect` is never queued (the Scout proactively scans rather than
/// claiming tasks; spec §4.7), so it has no eligible claiming role and
/// `eligible_role` returns `None` for it.
#[must_use]
pub const fn eligible_role(stage: Stage) -> Option<Role> {
    match stage {
        Stage::Research | Stage::Draft | Stage::Edit => Some(Role::Reporter),
        Stage::Review => Some(Role::Editor),
        Stage::Publish => Some(Role::Publisher),
        Stage::Detect => None,
    }
}

/// Returns every stage a `role` is eligible to claim, the inverse of
/// [`eligible_role`].
#[must_use]
pub fn stages_for_role(role: Role) -> &'static [Stage] {
    match role {
        Role::Reporter => &[Stage::Research, Stage::Draft, Stage::Edit],
        Role::Editor => &[Stage::Review],
        Role::Publisher => &[Stage::Publish],
        Role::Chief | Role::Scout => &[],
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet claimed.
    Pending,
    /// Claimed by an agent, in progress.
    Active,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully; terminal.
    Failed,
}

impl TaskStatus {
    /// Returns the SQL/storage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Agent lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Registered, not currently executing a task.
    Idle,
    /// Executing a claimed task.
    Working,
    /// Stopped gracefully.
    Offline,
}

impl AgentStatus {
    /// Returns the SQL/storage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
            Self::Offline => "offline",
        }
    }
}

/// Memory item kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    /// A story summary used for dedup similarity queries.
    Summary,
    /// A standalone extracted fact.
    Fact,
}

impl MemoryType {
    /// Returns the SQL/storage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Fact => "fact",
        }
    }
}

/// Human oversight prompt status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanPromptStatus {
    /// Awaiting the next Chief sweep.
    Pending,
    /// A research task has been enqueued for this prompt.
    Processing,
    /// The research worker has written a response.
    Answered,
}

impl HumanPromptStatus {
    /// Returns the SQL/storage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Answered => "answered",
        }
    }
}

/// Human-supplied source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HumanSourceType {
    /// A URL to fetch.
    Url,
    /// Inline text.
    Text,
    /// An uploaded document.
    Document,
}

impl HumanSourceType {
    /// Returns the SQL/storage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Text => "text",
            Self::Document => "document",
        }
    }
}

/// Review decision carried in a `review` task's output (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewDecision {
    /// The draft/revision is accepted for publication.
    Approve,
    /// The draft/revision is rejected and must be revised.
    Reject,
}
