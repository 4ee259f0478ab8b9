// pressline-store-sqlite/src/store.rs
// ============================================================================
// Module: Store
// Description: `SqliteStore`, implementing every `pressline-core::interfaces`
//              trait over a write gateway and a round-robin read pool.
// Purpose: The single concrete backend shipped with this repo (spec §7).
// Dependencies: rusqlite, pressline-core
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use pressline_core::core::AgentId;
use pressline_core::core::AgentRecord;
use pressline_core::core::AgentStatus;
use pressline_core::core::Article;
use pressline_core::core::ArticleId;
use pressline_core::core::Event;
use pressline_core::core::EventSeq;
use pressline_core::core::HumanPrompt;
use pressline_core::core::HumanPromptId;
use pressline_core::core::HumanSource;
use pressline_core::core::HumanSourceId;
use pressline_core::core::HumanSourceType;
use pressline_core::core::MemoryItem;
use pressline_core::core::MemoryType;
use pressline_core::core::NewTask;
use pressline_core::core::Role;
use pressline_core::core::SimilarMemory;
use pressline_core::core::StoryId;
use pressline_core::core::Task;
use pressline_core::core::TaskId;
use pressline_core::core::Timestamp;
use pressline_core::core::cosine_similarity;
use pressline_core::interfaces::AgentRegistry;
use pressline_core::interfaces::AgentRegistryError;
use pressline_core::interfaces::ArticleStore;
use pressline_core::interfaces::ArticleStoreError;
use pressline_core::interfaces::EventLog;
use pressline_core::interfaces::EventLogError;
use pressline_core::interfaces::HumanOversightError;
use pressline_core::interfaces::HumanOversightStore;
use pressline_core::interfaces::MemoryStore;
use pressline_core::interfaces::MemoryStoreError;
use pressline_core::interfaces::NewArticle;
use pressline_core::interfaces::TaskQueue;
use pressline_core::interfaces::TaskQueueError;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use time::Duration;

use crate::convert;
use crate::error::SqliteStoreError;
use crate::schema;
use crate::writer::WriteGateway;

/// Construction parameters for a [`SqliteStore`].
///
/// # Invariants
/// - `read_pool_size` and `writer_queue_capacity` are clamped to at least 1
///   by [`SqliteStoreConfig::validated`]; a pool or queue of size zero would
///   deadlock every caller (spec §7 "Configuration").
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the database file. `:memory:` opens a private in-memory
    /// database, useful for tests.
    pub path: PathBuf,
    /// `busy_timeout` applied to every connection, in milliseconds.
    pub busy_timeout_ms: u32,
    /// Number of pooled read-only connections.
    pub read_pool_size: usize,
    /// Bound on the writer thread's inbox.
    pub writer_queue_capacity: usize,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pressline.db"),
            busy_timeout_ms: 5_000,
            read_pool_size: 4,
            writer_queue_capacity: 256,
        }
    }
}

impl SqliteStoreConfig {
    /// Returns `self` with `read_pool_size` and `writer_queue_capacity`
    /// clamped to at least 1.
    #[must_use]
    pub fn validated(mut self) -> Self {
        self.read_pool_size = self.read_pool_size.max(1);
        self.writer_queue_capacity = self.writer_queue_capacity.max(1);
        self
    }
}

/// The SQLite-backed implementation of every `pressline-core::interfaces`
/// trait (spec §7).
///
/// Writes serialize through a single background thread ([`WriteGateway`]);
/// reads round-robin a pool of read-only connections, relying on SQLite's
/// WAL mode for snapshot isolation against the concurrent writer (spec §5
/// "Concurrency").
pub struct SqliteStore {
    write_gateway: Arc<WriteGateway>,
    read_connections: Vec<Mutex<Connection>>,
    read_cursor: AtomicUsize,
}

impl SqliteStore {
    /// Opens (or creates) the database at `config.path`, applies the schema,
    /// and spawns the writer thread.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError`] if the database cannot be opened or the
    /// schema cannot be applied.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let config = config.validated();
        let target = ConnTarget::resolve(&config.path);
        let writer_conn = open_connection(&target, &config)?;
        schema::apply(&writer_conn).map_err(SqliteStoreError::from)?;

        let mut read_connections = Vec::with_capacity(config.read_pool_size);
        for _ in 0..config.read_pool_size {
            let conn = open_connection(&target, &config)?;
            read_connections.push(Mutex::new(conn));
        }

        let write_gateway = Arc::new(WriteGateway::spawn(writer_conn, config.writer_queue_capacity)?);
        Ok(Self { write_gateway, read_connections, read_cursor: AtomicUsize::new(0) })
    }

    fn with_read_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T, SqliteStoreError> {
        let idx = self.read_cursor.fetch_add(1, Ordering::Relaxed) % self.read_connections.len();
        let guard = self.read_connections[idx].lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&guard).map_err(SqliteStoreError::from)
    }
}

/// Resolved connection target. A `:memory:` path is rewritten to a
/// process-unique shared-cache URI so every connection opened for one
/// [`SqliteStore`] (writer plus the whole read pool) sees the same database;
/// plain `Connection::open_in_memory()` would give each caller an isolated,
/// private database (rusqlite docs, "In-Memory Databases").
enum ConnTarget {
    File(PathBuf),
    SharedMemory(String),
}

impl ConnTarget {
    fn resolve(path: &Path) -> Self {
        if path == Path::new(":memory:") {
            static COUNTER: AtomicUsize = AtomicUsize::new(0);
            let id = COUNTER.fetch_add(1, Ordering::Relaxed);
            Self::SharedMemory(format!("file:pressline-mem-{id}?mode=memory&cache=shared"))
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

fn open_connection(target: &ConnTarget, config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let conn = match target {
        ConnTarget::File(path) => Connection::open(path),
        ConnTarget::SharedMemory(uri) => Connection::open_with_flags(
            uri,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        ),
    }
    .map_err(SqliteStoreError::from)?;
    conn.busy_timeout(std::time::Duration::from_millis(u64::from(config.busy_timeout_ms))).map_err(SqliteStoreError::from)?;
    if matches!(target, ConnTarget::File(_)) {
        conn.pragma_update(None, "journal_mode", "WAL").map_err(SqliteStoreError::from)?;
    }
    conn.pragma_update(None, "synchronous", "NORMAL").map_err(SqliteStoreError::from)?;
    conn.pragma_update(None, "foreign_keys", true).map_err(SqliteStoreError::from)?;
    Ok(conn)
}

// ============================================================================
// SECTION: EventLog
// ============================================================================

impl EventLog for SqliteStore {
    fn append(
        &self,
        story_id: StoryId,
        agent_id: Option<AgentId>,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Event, EventLogError> {
        self.write_gateway.append_event(story_id, agent_id, event_type.to_owned(), payload).map_err(Into::into)
    }

    fn list_for_story(&self, story_id: StoryId) -> Result<Vec<Event>, EventLogError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT event_seq, story_id, agent_id, event_type, payload, created_at
                 FROM events WHERE story_id = ?1 ORDER BY event_seq ASC",
            )?;
            stmt.query_map(params![story_id.to_string()], |row| convert::row_to_event(row).map_err(to_sql_err))?
                .collect()
        })
        .map_err(Into::into)
    }

    fn list_since(&self, since: EventSeq, limit: usize) -> Result<Vec<Event>, EventLogError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT event_seq, story_id, agent_id, event_type, payload, created_at
                 FROM events WHERE event_seq > ?1 ORDER BY event_seq ASC LIMIT ?2",
            )?;
            #[allow(
                clippy::cast_possible_wrap,
                reason = "limit is caller-supplied and bounded well under i64::MAX in practice"
            )]
            let limit_i64 = limit as i64;
            stmt.query_map(params![since.value(), limit_i64], |row| convert::row_to_event(row).map_err(to_sql_err))?
                .collect()
        })
        .map_err(Into::into)
    }

    fn latest_seq(&self) -> Result<EventSeq, EventLogError> {
        self.with_read_conn(|conn| {
            let value: i64 = conn.query_row("SELECT COALESCE(MAX(event_seq), 0) FROM events", [], |row| row.get(0))?;
            Ok(EventSeq::new(value))
        })
        .map_err(Into::into)
    }
}

// ============================================================================
// SECTION: TaskQueue
// ============================================================================

impl TaskQueue for SqliteStore {
    fn create(&self, new_task: NewTask) -> Result<Task, TaskQueueError> {
        self.write_gateway.create_task(new_task).map_err(Into::into)
    }

    fn claim(&self, role: Role, agent_id: AgentId) -> Result<Option<Task>, TaskQueueError> {
        self.write_gateway.claim_task(role, agent_id).map_err(Into::into)
    }

    fn complete(&self, task_id: TaskId, output: serde_json::Value) -> Result<Task, TaskQueueError> {
        self.write_gateway.complete_task(task_id, output).map_err(Into::into)
    }

    fn fail(&self, task_id: TaskId, output: serde_json::Value) -> Result<Task, TaskQueueError> {
        self.write_gateway.fail_task(task_id, output).map_err(Into::into)
    }

    fn get(&self, task_id: TaskId) -> Result<Option<Task>, TaskQueueError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT task_id, story_id, stage, status, priority, assigned_agent, input, output, created_at, started_at, completed_at, deadline
                 FROM tasks WHERE task_id = ?1",
            )?;
            stmt.query_row(params![task_id.to_string()], |row| convert::row_to_task(row).map_err(to_sql_err)).optional()
        })
        .map_err(Into::into)
    }

    fn list_for_story(&self, story_id: StoryId) -> Result<Vec<Task>, TaskQueueError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT task_id, story_id, stage, status, priority, assigned_agent, input, output, created_at, started_at, completed_at, deadline
                 FROM tasks WHERE story_id = ?1 ORDER BY created_at ASC",
            )?;
            stmt.query_map(params![story_id.to_string()], |row| convert::row_to_task(row).map_err(to_sql_err))?
                .collect()
        })
        .map_err(Into::into)
    }

    fn recover_stalled(&self, stalled_lease: Duration, now: Timestamp) -> Result<Vec<Task>, TaskQueueError> {
        self.write_gateway.recover_stalled(stalled_lease, now).map_err(Into::into)
    }
}

// ============================================================================
// SECTION: MemoryStore
// ============================================================================

impl MemoryStore for SqliteStore {
    fn add(
        &self,
        story_id: StoryId,
        content: &str,
        embedding: Vec<f32>,
        memory_type: MemoryType,
        metadata: serde_json::Value,
    ) -> Result<MemoryItem, MemoryStoreError> {
        self.write_gateway.add_memory(story_id, content.to_owned(), embedding, memory_type, metadata).map_err(Into::into)
    }

    fn find_similar(&self, embedding: &[f32], threshold: f32, limit: usize) -> Result<Vec<SimilarMemory>, MemoryStoreError> {
        let rows: Vec<MemoryItem> = self
            .with_read_conn(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, story_id, content, embedding, memory_type, metadata, created_at
                     FROM memories WHERE memory_type = 'summary'",
                )?;
                stmt.query_map([], |row| convert::row_to_memory(row).map_err(to_sql_err))?.collect()
            })
            .map_err(MemoryStoreError::from)?;

        let mut scored: Vec<SimilarMemory> = rows
            .into_iter()
            .map(|row| SimilarMemory { story_id: row.story_id, similarity: cosine_similarity(embedding, &row.embedding), content: row.content })
            .filter(|candidate| candidate.similarity >= threshold)
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(limit);
        Ok(scored)
    }
}

// ============================================================================
// SECTION: ArticleStore
// ============================================================================

impl ArticleStore for SqliteStore {
    fn publish(&self, article: NewArticle) -> Result<Article, ArticleStoreError> {
        self.write_gateway.publish_article(article).map_err(Into::into)
    }

    fn get(&self, article_id: ArticleId) -> Result<Option<Article>, ArticleStoreError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT article_id, story_id, headline, body, byline, summary, sources, entities, tags, metadata, created_at, updated_at
                 FROM articles WHERE article_id = ?1",
            )?;
            stmt.query_row(params![article_id.to_string()], |row| convert::row_to_article(row).map_err(to_sql_err)).optional()
        })
        .map_err(Into::into)
    }

    fn get_for_story(&self, story_id: StoryId) -> Result<Option<Article>, ArticleStoreError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT article_id, story_id, headline, body, byline, summary, sources, entities, tags, metadata, created_at, updated_at
                 FROM articles WHERE story_id = ?1",
            )?;
            stmt.query_row(params![story_id.to_string()], |row| convert::row_to_article(row).map_err(to_sql_err)).optional()
        })
        .map_err(Into::into)
    }

    fn correct(&self, article_id: ArticleId, body: &str, summary: &str) -> Result<Article, ArticleStoreError> {
        self.write_gateway.correct_article(article_id, body.to_owned(), summary.to_owned()).map_err(Into::into)
    }
}

// ============================================================================
// SECTION: HumanOversightStore
// ============================================================================

impl HumanOversightStore for SqliteStore {
    fn submit_source(&self, source_type: HumanSourceType, content: &str) -> Result<HumanSource, HumanOversightError> {
        self.write_gateway.submit_source(source_type, content.to_owned()).map_err(Into::into)
    }

    fn link_source_to_story(&self, source_id: HumanSourceId, story_id: StoryId) -> Result<(), HumanOversightError> {
        self.write_gateway.link_source(source_id, story_id).map_err(Into::into)
    }

    fn list_unlinked_sources(&self) -> Result<Vec<HumanSource>, HumanOversightError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, source_type, content, story_id, created_at FROM human_sources WHERE story_id IS NULL ORDER BY created_at ASC",
            )?;
            stmt.query_map([], |row| convert::row_to_human_source(row).map_err(to_sql_err))?.collect()
        })
        .map_err(Into::into)
    }

    fn submit_prompt(&self, prompt: &str) -> Result<HumanPrompt, HumanOversightError> {
        self.write_gateway.submit_prompt(prompt.to_owned()).map_err(Into::into)
    }

    fn list_pending_prompts(&self) -> Result<Vec<HumanPrompt>, HumanOversightError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, prompt, status, research_task_id, response, created_at
                 FROM human_prompts WHERE status = 'pending' ORDER BY created_at ASC",
            )?;
            stmt.query_map([], |row| convert::row_to_human_prompt(row).map_err(to_sql_err))?.collect()
        })
        .map_err(Into::into)
    }

    fn mark_processing(&self, prompt_id: HumanPromptId, research_task_id: TaskId) -> Result<HumanPrompt, HumanOversightError> {
        self.write_gateway.mark_processing(prompt_id, research_task_id).map_err(Into::into)
    }

    fn answer(&self, prompt_id: HumanPromptId, response: &str) -> Result<HumanPrompt, HumanOversightError> {
        self.write_gateway.answer_prompt(prompt_id, response.to_owned()).map_err(Into::into)
    }
}

// ============================================================================
// SECTION: AgentRegistry
// ============================================================================

impl AgentRegistry for SqliteStore {
    fn register(&self, role: Role) -> Result<AgentRecord, AgentRegistryError> {
        self.write_gateway.register_agent(role).map_err(Into::into)
    }

    fn heartbeat(&self, agent_id: AgentId, status: AgentStatus) -> Result<(), AgentRegistryError> {
        self.write_gateway.heartbeat(agent_id, status).map_err(Into::into)
    }

    fn get(&self, agent_id: AgentId) -> Result<Option<AgentRecord>, AgentRegistryError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare("SELECT agent_id, role, status, last_heartbeat FROM agents WHERE agent_id = ?1")?;
            stmt.query_row(params![agent_id.to_string()], |row| convert::row_to_agent(row).map_err(to_sql_err)).optional()
        })
        .map_err(Into::into)
    }

    fn list(&self) -> Result<Vec<AgentRecord>, AgentRegistryError> {
        self.with_read_conn(|conn| {
            let mut stmt = conn.prepare("SELECT agent_id, role, status, last_heartbeat FROM agents")?;
            stmt.query_map([], |row| convert::row_to_agent(row).map_err(to_sql_err))?.collect()
        })
        .map_err(Into::into)
    }
}

fn to_sql_err(err: SqliteStoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic_in_result_fn, clippy::unwrap_in_result, reason = "Test-only fixture assertions.")]
mod tests {
    use pressline_core::core::Stage;
    use pressline_core::core::eligible_role;

    use super::*;

    fn open_memory_store() -> SqliteStore {
        let config = SqliteStoreConfig { path: PathBuf::from(":memory:"), read_pool_size: 2, writer_queue_capacity: 8, ..Default::default() };
        SqliteStore::open(config).expect("open in-memory store")
    }

    #[test]
    fn event_log_is_append_only_and_ordered() {
        let store = open_memory_store();
        let story_id = StoryId::new();
        let first = store.append(story_id, None, "story.detected", serde_json::json!({"n": 1})).unwrap();
        let second = store.append(story_id, None, "story.created", serde_json::json!({"n": 2})).unwrap();
        assert!(second.event_seq.value() > first.event_seq.value());
        let events = store.list_for_story(story_id).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "story.detected");
        assert_eq!(events[1].event_type, "story.created");
    }

    #[test]
    fn claim_is_exclusive_and_priority_ordered() {
        let store = open_memory_store();
        let story_id = StoryId::new();
        store.create(NewTask { story_id, stage: Stage::Research, priority: 1, input: serde_json::json!({}), deadline: None }).unwrap();
        store.create(NewTask { story_id, stage: Stage::Research, priority: 9, input: serde_json::json!({}), deadline: None }).unwrap();

        let agent_id = AgentId::new();
        let role = eligible_role(Stage::Research).unwrap();
        let claimed = store.claim(role, agent_id).unwrap().expect("a task should be claimable");
        assert_eq!(claimed.priority, 9);

        let second_claim = store.claim(role, AgentId::new()).unwrap().expect("second task should be claimable");
        assert_eq!(second_claim.priority, 1);
        assert!(store.claim(role, AgentId::new()).unwrap().is_none());
    }

    #[test]
    fn completing_a_pending_task_is_illegal() {
        let store = open_memory_store();
        let story_id = StoryId::new();
        let task = store.create(NewTask { story_id, stage: Stage::Research, priority: 0, input: serde_json::json!({}), deadline: None }).unwrap();
        let err = store.complete(task.task_id, serde_json::json!({})).unwrap_err();
        assert!(matches!(err, TaskQueueError::Backend(_)));
    }

    #[test]
    fn recover_stalled_resets_expired_leases() {
        let store = open_memory_store();
        let story_id = StoryId::new();
        let task = store.create(NewTask { story_id, stage: Stage::Research, priority: 0, input: serde_json::json!({}), deadline: None }).unwrap();
        store.claim(eligible_role(Stage::Research).unwrap(), AgentId::new()).unwrap();

        let far_future = Timestamp::from_offset(Timestamp::now().as_offset() + Duration::hours(2));
        let recovered = store.recover_stalled(Duration::minutes(10), far_future).unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].task_id, task.task_id);

        let reloaded = store.get(task.task_id).unwrap().expect("task still exists");
        assert_eq!(reloaded.status, pressline_core::core::TaskStatus::Pending);
        assert!(reloaded.assigned_agent.is_none());
    }

    #[test]
    fn find_similar_filters_by_threshold_and_type() {
        let store = open_memory_store();
        let story_id = StoryId::new();
        store.add(story_id, "alpha", vec![1.0, 0.0], MemoryType::Summary, serde_json::json!({})).unwrap();
        store.add(story_id, "beta", vec![0.0, 1.0], MemoryType::Summary, serde_json::json!({})).unwrap();
        store.add(story_id, "not-a-summary", vec![1.0, 0.0], MemoryType::Fact, serde_json::json!({})).unwrap();

        let hits = store.find_similar(&[1.0, 0.0], 0.9, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "alpha");
    }

    #[test]
    fn human_oversight_round_trip() {
        let store = open_memory_store();
        let source = store.submit_source(HumanSourceType::Url, "https://example.com/tip").unwrap();
        assert!(source.story_id.is_none());

        let story_id = StoryId::new();
        store.link_source_to_story(source.id, story_id).unwrap();
        assert!(store.list_unlinked_sources().unwrap().is_empty());

        let prompt = store.submit_prompt("What happened at the plant?").unwrap();
        let task = store.create(NewTask { story_id, stage: Stage::Research, priority: 0, input: serde_json::json!({}), deadline: None }).unwrap();
        let processing = store.mark_processing(prompt.id, task.task_id).unwrap();
        assert_eq!(processing.status, pressline_core::core::HumanPromptStatus::Processing);

        let answered = store.answer(prompt.id, "A fire started in unit 3.").unwrap();
        assert_eq!(answered.response.as_deref(), Some("A fire started in unit 3."));
    }

    #[test]
    fn agent_registry_round_trip() {
        let store = open_memory_store();
        let agent = store.register(Role::Reporter).unwrap();
        assert_eq!(agent.status, AgentStatus::Idle);

        store.heartbeat(agent.agent_id, AgentStatus::Working).unwrap();
        let reloaded = store.get(agent.agent_id).unwrap().expect("agent exists");
        assert_eq!(reloaded.status, AgentStatus::Working);
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
