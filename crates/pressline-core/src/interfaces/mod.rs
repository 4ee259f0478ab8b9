// pressline-core/src/interfaces/mod.rs
// ============================================================================
// Module: Interfaces
// Description: Backend-agnostic traits every storage implementation satisfies.
// Purpose: Let `pressline-runtime` and `pressline-cli` depend on behavior, not
//          on rusqlite or any other concrete backend.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Every trait here is synchronous and blocking: implementations are free to
//! use a background writer thread internally (as `pressline-store-sqlite`
//! does), but the trait surface never exposes a `Future`. Callers run on OS
//! threads, matching the runtime model in spec §5.
//!
//! Each trait pairs with its own `thiserror` error enum rather than a single
//! crate-wide error type, so callers can match on the specific failure modes
//! that trait can produce.

use time::Duration;

pub mod providers;

pub use providers::ChatError;
pub use providers::ChatProvider;
pub use providers::EmbeddingError;
pub use providers::EmbeddingProvider;
pub use providers::FallbackSearchProvider;
pub use providers::FeedEntry;
pub use providers::FeedError;
pub use providers::FeedReader;
pub use providers::SearchError;
pub use providers::SearchProvider;
pub use providers::SearchResult;

use crate::core::AgentId;
use crate::core::AgentRecord;
use crate::core::AgentStatus;
use crate::core::Article;
use crate::core::ArticleId;
use crate::core::Event;
use crate::core::EventSeq;
use crate::core::HumanPrompt;
use crate::core::HumanPromptId;
use crate::core::HumanSource;
use crate::core::HumanSourceId;
use crate::core::HumanSourceType;
use crate::core::MemoryItem;
use crate::core::MemoryType;
use crate::core::NewTask;
use crate::core::Role;
use crate::core::SimilarMemory;
use crate::core::StoryId;
use crate::core::Task;
use crate::core::TaskId;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Event log
// ============================================================================

/// Failure modes of an [`EventLog`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    /// The underlying storage medium failed (disk, connection, etc).
    #[error("event log I/O failure: {0}")]
    Io(String),
    /// Stored data failed to decode; the log is inconsistent.
    #[error("event log corrupt: {0}")]
    Corrupt(String),
    /// The caller supplied an invalid argument (e.g. an empty `event_type`).
    #[error("invalid event: {0}")]
    Invalid(String),
    /// An implementation-specific failure not covered above.
    #[error("event log backend error: {0}")]
    Backend(String),
}

/// The append-only record of everything that happened to a story (spec §3
/// "Event", §4.2).
///
/// # Invariants
/// - `append` never mutates or removes an existing row (spec §3 Invariant 1).
/// - `event_seq` values returned by `append` strictly increase across the
///   whole backend, not just within one story (spec §4.2).
pub trait EventLog: Send + Sync {
    /// Appends a new event and returns it with its assigned `event_seq`.
    ///
    /// # Errors
    /// Returns [`EventLogError::Invalid`] if `event_type` is empty.
    fn append(
        &self,
        story_id: StoryId,
        agent_id: Option<AgentId>,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Event, EventLogError>;

    /// Returns every event for `story_id`, ordered by `event_seq` ascending.
    ///
    /// # Errors
    /// Returns [`EventLogError::Io`] or [`EventLogError::Corrupt`] on
    /// storage failure.
    fn list_for_story(&self, story_id: StoryId) -> Result<Vec<Event>, EventLogError>;

    /// Returns up to `limit` events with `event_seq > since`, ordered
    /// ascending. Used by sweep loops to tail new activity without
    /// rescanning the whole log.
    ///
    /// # Errors
    /// Returns [`EventLogError::Io`] or [`EventLogError::Corrupt`] on
    /// storage failure.
    fn list_since(&self, since: EventSeq, limit: usize) -> Result<Vec<Event>, EventLogError>;

    /// Returns the highest `event_seq` assigned so far, or `EventSeq::new(0)`
    /// if the log is empty.
    ///
    /// # Errors
    /// Returns [`EventLogError::Io`] on storage failure.
    fn latest_seq(&self) -> Result<EventSeq, EventLogError>;
}

// ============================================================================
// SECTION: Task queue
// ============================================================================

/// Failure modes of a [`TaskQueue`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum TaskQueueError {
    /// The underlying storage medium failed.
    #[error("task queue I/O failure: {0}")]
    Io(String),
    /// Stored data failed to decode.
    #[error("task queue corrupt: {0}")]
    Corrupt(String),
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The requested transition is not legal from the task's current status
    /// (spec §3 Invariant 4), e.g. completing an already-completed task.
    #[error("illegal task transition for {task_id}: {reason}")]
    IllegalTransition {
        /// The task the caller tried to transition.
        task_id: TaskId,
        /// Human-readable reason the transition was rejected.
        reason: String,
    },
    /// An implementation-specific failure not covered above.
    #[error("task queue backend error: {0}")]
    Backend(String),
}

/// The queue of work items role workers claim and complete (spec §3 "Task",
/// §4.3).
///
/// # Invariants
/// - `claim` is atomic: two concurrent callers racing for the same task
///   never both receive it (spec §3 Invariant 2, §5 Concurrency).
/// - `claim` returns the oldest-created, highest-priority eligible `pending`
///   task for `role`'s stages, priority first, creation time as tiebreaker
///   (spec §4.3).
pub trait TaskQueue: Send + Sync {
    /// Creates a new `pending` task and returns it with its assigned fields.
    ///
    /// # Errors
    /// Returns [`TaskQueueError::Backend`] on storage failure.
    fn create(&self, new_task: NewTask) -> Result<Task, TaskQueueError>;

    /// Atomically claims the next eligible `pending` task for `role`, if any,
    /// transitioning it to `active` and assigning `agent_id`.
    ///
    /// # Errors
    /// Returns [`TaskQueueError::Backend`] on storage failure.
    fn claim(&self, role: Role, agent_id: AgentId) -> Result<Option<Task>, TaskQueueError>;

    /// Marks `task_id` `completed` and records `output`.
    ///
    /// # Errors
    /// Returns [`TaskQueueError::NotFound`] if the task does not exist, or
    /// [`TaskQueueError::IllegalTransition`] if it is not `active`.
    fn complete(&self, task_id: TaskId, output: serde_json::Value) -> Result<Task, TaskQueueError>;

    /// Marks `task_id` `failed` and records `output`.
    ///
    /// # Errors
    /// Returns [`TaskQueueError::NotFound`] if the task does not exist, or
    /// [`TaskQueueError::IllegalTransition`] if it is not `active`.
    fn fail(&self, task_id: TaskId, output: serde_json::Value) -> Result<Task, TaskQueueError>;

    /// Returns `task_id`, if it exists.
    ///
    /// # Errors
    /// Returns [`TaskQueueError::Backend`] on storage failure.
    fn get(&self, task_id: TaskId) -> Result<Option<Task>, TaskQueueError>;

    /// Returns every task for `story_id`, ordered by `created_at` ascending.
    ///
    /// # Errors
    /// Returns [`TaskQueueError::Backend`] on storage failure.
    fn list_for_story(&self, story_id: StoryId) -> Result<Vec<Task>, TaskQueueError>;

    /// Resets every `active` task whose lease has exceeded `stalled_lease`
    /// (measured against `now`) back to `pending`, clearing its assignment,
    /// and returns the recovered tasks (spec §4.3 "Stalled-task recovery").
    ///
    /// # Errors
    /// Returns [`TaskQueueError::Backend`] on storage failure.
    fn recover_stalled(
        &self,
        stalled_lease: Duration,
        now: Timestamp,
    ) -> Result<Vec<Task>, TaskQueueError>;
}

// ============================================================================
// SECTION: Memory / dedup store
// ============================================================================

/// Failure modes of a [`MemoryStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    /// The underlying storage medium failed.
    #[error("memory store I/O failure: {0}")]
    Io(String),
    /// Stored data failed to decode.
    #[error("memory store corrupt: {0}")]
    Corrupt(String),
    /// The caller supplied an invalid argument (e.g. an empty embedding).
    #[error("invalid memory item: {0}")]
    Invalid(String),
    /// An implementation-specific failure not covered above.
    #[error("memory store backend error: {0}")]
    Backend(String),
}

/// The dedup/similarity memory the Scout and Chief consult before admitting
/// a new detection (spec §3 "Memory Item", §4.4).
pub trait MemoryStore: Send + Sync {
    /// Stores a new memory item and returns it with its assigned fields.
    ///
    /// # Errors
    /// Returns [`MemoryStoreError::Invalid`] if `embedding` is empty.
    fn add(
        &self,
        story_id: StoryId,
        content: &str,
        embedding: Vec<f32>,
        memory_type: MemoryType,
        metadata: serde_json::Value,
    ) -> Result<MemoryItem, MemoryStoreError>;

    /// Returns stored `MemoryType::Summary` items whose cosine similarity to
    /// `embedding` is at or above `threshold`, most similar first, capped at
    /// `limit` (spec §4.4).
    ///
    /// # Errors
    /// Returns [`MemoryStoreError::Backend`] on storage failure.
    fn find_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SimilarMemory>, MemoryStoreError>;
}

// ============================================================================
// SECTION: Article store
// ============================================================================

/// Failure modes of an [`ArticleStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum ArticleStoreError {
    /// The underlying storage medium failed.
    #[error("article store I/O failure: {0}")]
    Io(String),
    /// Stored data failed to decode.
    #[error("article store corrupt: {0}")]
    Corrupt(String),
    /// The referenced article does not exist.
    #[error("article not found: {0}")]
    NotFound(ArticleId),
    /// An implementation-specific failure not covered above.
    #[error("article store backend error: {0}")]
    Backend(String),
}

/// Fields needed to publish a new article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    /// The story this article concludes.
    pub story_id: StoryId,
    /// Headline text.
    pub headline: String,
    /// Full article body.
    pub body: String,
    /// Author byline.
    pub byline: String,
    /// Short summary.
    pub summary: String,
    /// Source URLs or citations.
    pub sources: Vec<String>,
    /// Named entities mentioned.
    pub entities: Vec<String>,
    /// Free-form classification tags.
    pub tags: Vec<String>,
    /// Additional structured metadata.
    pub metadata: serde_json::Value,
}

/// The immutable store of published articles (spec §3 "Article", §4.6).
pub trait ArticleStore: Send + Sync {
    /// Publishes a new article unconditionally (spec §4.6: an approved
    /// review always produces a publish task).
    ///
    /// # Errors
    /// Returns [`ArticleStoreError`] if the underlying storage fails.
    fn publish(&self, article: NewArticle) -> Result<Article, ArticleStoreError>;

    /// Returns `article_id`, if it exists.
    ///
    /// # Errors
    /// Returns [`ArticleStoreError::Backend`] on storage failure.
    fn get(&self, article_id: ArticleId) -> Result<Option<Article>, ArticleStoreError>;

    /// Returns the article published for `story_id`, if any.
    ///
    /// # Errors
    /// Returns [`ArticleStoreError::Backend`] on storage failure.
    fn get_for_story(&self, story_id: StoryId) -> Result<Option<Article>, ArticleStoreError>;

    /// Overwrites `body` and `summary` on an already-published article and
    /// advances `updated_at` (spec §9 Open Question: post-publish
    /// corrections reuse the existing `ArticleId`).
    ///
    /// # Errors
    /// Returns [`ArticleStoreError::NotFound`] if `article_id` does not
    /// exist.
    fn correct(
        &self,
        article_id: ArticleId,
        body: &str,
        summary: &str,
    ) -> Result<Article, ArticleStoreError>;
}

// ============================================================================
// SECTION: Human oversight store
// ============================================================================

/// Failure modes of a [`HumanOversightStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum HumanOversightError {
    /// The underlying storage medium failed.
    #[error("human oversight I/O failure: {0}")]
    Io(String),
    /// The referenced prompt does not exist.
    #[error("human prompt not found: {0}")]
    PromptNotFound(HumanPromptId),
    /// The referenced source does not exist.
    #[error("human source not found: {0}")]
    SourceNotFound(HumanSourceId),
    /// The requested transition is not legal from the record's current
    /// status.
    #[error("illegal human prompt transition: {0}")]
    IllegalTransition(String),
    /// An implementation-specific failure not covered above.
    #[error("human oversight backend error: {0}")]
    Backend(String),
}

/// The mediated channel through which humans feed leads and questions into
/// the pipeline (spec §3 "Human Source", "Human Prompt", §4.8).
pub trait HumanOversightStore: Send + Sync {
    /// Records a new human-supplied source, unlinked to any story.
    ///
    /// # Errors
    /// Returns [`HumanOversightError::Backend`] on storage failure.
    fn submit_source(
        &self,
        source_type: HumanSourceType,
        content: &str,
    ) -> Result<HumanSource, HumanOversightError>;

    /// Links a previously unlinked source to `story_id`, once the Chief
    /// admits it into the pipeline.
    ///
    /// # Errors
    /// Returns [`HumanOversightError::SourceNotFound`] if `source_id` does
    /// not exist.
    fn link_source_to_story(
        &self,
        source_id: HumanSourceId,
        story_id: StoryId,
    ) -> Result<(), HumanOversightError>;

    /// Returns every source not yet linked to a story, oldest first.
    ///
    /// # Errors
    /// Returns [`HumanOversightError::Backend`] on storage failure.
    fn list_unlinked_sources(&self) -> Result<Vec<HumanSource>, HumanOversightError>;

    /// Records a new human question in `pending` status.
    ///
    /// # Errors
    /// Returns [`HumanOversightError::Backend`] on storage failure.
    fn submit_prompt(&self, prompt: &str) -> Result<HumanPrompt, HumanOversightError>;

    /// Returns every `pending` prompt, oldest first.
    ///
    /// # Errors
    /// Returns [`HumanOversightError::Backend`] on storage failure.
    fn list_pending_prompts(&self) -> Result<Vec<HumanPrompt>, HumanOversightError>;

    /// Transitions `prompt_id` to `processing` and records the research task
    /// dispatched to answer it.
    ///
    /// # Errors
    /// Returns [`HumanOversightError::PromptNotFound`] if `prompt_id` does
    /// not exist.
    fn mark_processing(
        &self,
        prompt_id: HumanPromptId,
        research_task_id: TaskId,
    ) -> Result<HumanPrompt, HumanOversightError>;

    /// Transitions `prompt_id` to `answered` and records `response`.
    ///
    /// # Errors
    /// Returns [`HumanOversightError::PromptNotFound`] if `prompt_id` does
    /// not exist.
    fn answer(
        &self,
        prompt_id: HumanPromptId,
        response: &str,
    ) -> Result<HumanPrompt, HumanOversightError>;
}

// ============================================================================
// SECTION: Agent registry
// ============================================================================

/// Failure modes of an [`AgentRegistry`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum AgentRegistryError {
    /// The underlying storage medium failed.
    #[error("agent registry I/O failure: {0}")]
    Io(String),
    /// The referenced agent does not exist.
    #[error("agent not found: {0}")]
    NotFound(AgentId),
    /// An implementation-specific failure not covered above.
    #[error("agent registry backend error: {0}")]
    Backend(String),
}

/// Tracks registered worker processes and their liveness (spec §3 "Agent",
/// §4.5).
pub trait AgentRegistry: Send + Sync {
    /// Registers a new agent with `role`, status `idle`, and `last_heartbeat`
    /// set to now.
    ///
    /// # Errors
    /// Returns [`AgentRegistryError::Backend`] on storage failure.
    fn register(&self, role: Role) -> Result<AgentRecord, AgentRegistryError>;

    /// Updates `agent_id`'s `status` and refreshes `last_heartbeat` to now.
    ///
    /// # Errors
    /// Returns [`AgentRegistryError::NotFound`] if `agent_id` does not
    /// exist.
    fn heartbeat(&self, agent_id: AgentId, status: AgentStatus) -> Result<(), AgentRegistryError>;

    /// Returns `agent_id`, if it exists.
    ///
    /// # Errors
    /// Returns [`AgentRegistryError::Backend`] on storage failure.
    fn get(&self, agent_id: AgentId) -> Result<Option<AgentRecord>, AgentRegistryError>;

    /// Returns every registered agent.
    ///
    /// # Errors
    /// Returns [`AgentRegistryError::Backend`] on storage failure.
    fn list(&self) -> Result<Vec<AgentRecord>, AgentRegistryError>;
}
