// pressline-store-sqlite/src/error.rs
// ============================================================================
// Module: Error
// Description: The store's own error type and its mapping onto each
//              `pressline-core::interfaces` error enum.
// Purpose: Let one `rusqlite`/`serde_json` failure surface correctly through
//          whichever trait the caller invoked.
// Dependencies: rusqlite, serde_json, pressline-core
// ============================================================================

use pressline_core::core::AgentId;
use pressline_core::core::ArticleId;
use pressline_core::core::HumanPromptId;
use pressline_core::core::HumanSourceId;
use pressline_core::core::TaskId;
use pressline_core::interfaces::AgentRegistryError;
use pressline_core::interfaces::ArticleStoreError;
use pressline_core::interfaces::EventLogError;
use pressline_core::interfaces::HumanOversightError;
use pressline_core::interfaces::MemoryStoreError;
use pressline_core::interfaces::TaskQueueError;

/// Failure modes internal to the SQLite store, before being mapped onto a
/// specific `pressline-core::interfaces` error.
#[derive(Debug, thiserror::Error)]
pub enum SqliteStoreError {
    /// The underlying SQLite connection or filesystem failed.
    #[error("sqlite I/O failure: {0}")]
    Io(String),
    /// A `rusqlite` call failed.
    #[error("sqlite error: {0}")]
    Db(#[from] rusqlite::Error),
    /// A stored JSON column failed to decode.
    #[error("sqlite stored data corrupt: {0}")]
    Corrupt(String),
    /// The caller supplied an invalid argument.
    #[error("sqlite invalid argument: {0}")]
    Invalid(String),
    /// The write gateway's queue is full or its thread has shut down.
    #[error("sqlite writer overloaded")]
    Overloaded,
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The referenced article does not exist.
    #[error("article not found: {0}")]
    ArticleNotFound(ArticleId),
    /// The referenced human prompt does not exist.
    #[error("human prompt not found: {0}")]
    PromptNotFound(HumanPromptId),
    /// The referenced human source does not exist.
    #[error("human source not found: {0}")]
    SourceNotFound(HumanSourceId),
    /// The referenced agent does not exist.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),
}

impl From<serde_json::Error> for SqliteStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Corrupt(value.to_string())
    }
}

impl From<SqliteStoreError> for EventLogError {
    fn from(value: SqliteStoreError) -> Self {
        match value {
            SqliteStoreError::Io(msg) => Self::Io(msg),
            SqliteStoreError::Db(err) => Self::Io(err.to_string()),
            SqliteStoreError::Corrupt(msg) => Self::Corrupt(msg),
            SqliteStoreError::Invalid(msg) => Self::Invalid(msg),
            SqliteStoreError::Overloaded => Self::Backend("writer overloaded".to_owned()),
            SqliteStoreError::TaskNotFound(id) => Self::Backend(format!("task not found: {id}")),
            SqliteStoreError::ArticleNotFound(id) => Self::Backend(format!("article not found: {id}")),
            SqliteStoreError::PromptNotFound(id) => Self::Backend(format!("human prompt not found: {id}")),
            SqliteStoreError::SourceNotFound(id) => Self::Backend(format!("human source not found: {id}")),
            SqliteStoreError::AgentNotFound(id) => Self::Backend(format!("agent not found: {id}")),
        }
    }
}

impl From<SqliteStoreError> for TaskQueueError {
    fn from(value: SqliteStoreError) -> Self {
        match value {
            SqliteStoreError::Io(msg) => Self::Io(msg),
            SqliteStoreError::Db(err) => Self::Io(err.to_string()),
            SqliteStoreError::Corrupt(msg) => Self::Corrupt(msg),
            SqliteStoreError::Invalid(msg) => Self::Backend(msg),
            SqliteStoreError::Overloaded => Self::Backend("writer overloaded".to_owned()),
            SqliteStoreError::TaskNotFound(id) => Self::NotFound(id),
            SqliteStoreError::ArticleNotFound(id) => Self::Backend(format!("article not found: {id}")),
            SqliteStoreError::PromptNotFound(id) => Self::Backend(format!("human prompt not found: {id}")),
            SqliteStoreError::SourceNotFound(id) => Self::Backend(format!("human source not found: {id}")),
            SqliteStoreError::AgentNotFound(id) => Self::Backend(format!("agent not found: {id}")),
        }
    }
}

impl From<SqliteStoreError> for MemoryStoreError {
    fn from(value: SqliteStoreError) -> Self {
        match value {
            SqliteStoreError::Io(msg) => Self::Io(msg),
            SqliteStoreError::Db(err) => Self::Io(err.to_string()),
            SqliteStoreError::Corrupt(msg) => Self::Corrupt(msg),
            SqliteStoreError::Invalid(msg) => Self::Invalid(msg),
            SqliteStoreError::Overloaded => Self::Backend("writer overloaded".to_owned()),
            SqliteStoreError::TaskNotFound(id) => Self::Backend(format!("task not found: {id}")),
            SqliteStoreError::ArticleNotFound(id) => Self::Backend(format!("article not found: {id}")),
            SqliteStoreError::PromptNotFound(id) => Self::Backend(format!("human prompt not found: {id}")),
            SqliteStoreError::SourceNotFound(id) => Self::Backend(format!("human source not found: {id}")),
            SqliteStoreError::AgentNotFound(id) => Self::Backend(format!("agent not found: {id}")),
        }
    }
}

impl From<SqliteStoreError> for ArticleStoreError {
    fn from(value: SqliteStoreError) -> Self {
        match value {
            SqliteStoreError::Io(msg) => Self::Io(msg),
            SqliteStoreError::Db(err) => Self::Io(err.to_string()),
            SqliteStoreError::Corrupt(msg) => Self::Corrupt(msg),
            SqliteStoreError::Invalid(msg) => Self::Backend(msg),
            SqliteStoreError::Overloaded => Self::Backend("writer overloaded".to_owned()),
            SqliteStoreError::ArticleNotFound(id) => Self::NotFound(id),
            SqliteStoreError::TaskNotFound(id) => Self::Backend(format!("task not found: {id}")),
            SqliteStoreError::PromptNotFound(id) => Self::Backend(format!("human prompt not found: {id}")),
            SqliteStoreError::SourceNotFound(id) => Self::Backend(format!("human source not found: {id}")),
            SqliteStoreError::AgentNotFound(id) => Self::Backend(format!("agent not found: {id}")),
        }
    }
}

impl From<SqliteStoreError> for HumanOversightError {
    fn from(value: SqliteStoreError) -> Self {
        match value {
            SqliteStoreError::Io(msg) => Self::Io(msg),
            SqliteStoreError::Db(err) => Self::Io(err.to_string()),
            SqliteStoreError::Corrupt(msg) | SqliteStoreError::Invalid(msg) => Self::Backend(msg),
            SqliteStoreError::Overloaded => Self::Backend("writer overloaded".to_owned()),
            SqliteStoreError::TaskNotFound(id) => Self::Backend(format!("task not found: {id}")),
            SqliteStoreError::ArticleNotFound(id) => Self::Backend(format!("article not found: {id}")),
            SqliteStoreError::PromptNotFound(id) => Self::PromptNotFound(id),
            SqliteStoreError::SourceNotFound(id) => Self::SourceNotFound(id),
            SqliteStoreError::AgentNotFound(id) => Self::Backend(format!("agent not found: {id}")),
        }
    }
}

impl From<SqliteStoreError> for AgentRegistryError {
    fn from(value: SqliteStoreError) -> Self {
        match value {
            SqliteStoreError::Io(msg) => Self::Io(msg),
            SqliteStoreError::Db(err) => Self::Io(err.to_string()),
            SqliteStoreError::Corrupt(msg) | SqliteStoreError::Invalid(msg) => Self::Backend(msg),
            SqliteStoreError::Overloaded => Self::Backend("writer overloaded".to_owned()),
            SqliteStoreError::TaskNotFound(id) => Self::Backend(format!("task not found: {id}")),
            SqliteStoreError::ArticleNotFound(id) => Self::Backend(format!("article not found: {id}")),
            SqliteStoreError::PromptNotFound(id) => Self::Backend(format!("human prompt not found: {id}")),
            SqliteStoreError::SourceNotFound(id) => Self::Backend(format!("human source not found: {id}")),
            SqliteStoreError::AgentNotFound(id) => Self::NotFound(id),
        }
    }
}
