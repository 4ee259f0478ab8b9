// pressline-store-sqlite/src/writer.rs
// ============================================================================
// Module: Write gateway
// Description: The single background thread that owns the write connection.
// Purpose: SQLite has no `SELECT ... FOR UPDATE SKIP LOCKED`; serializing
//          every mutation through one thread gives claim/complete/fail the
//          same atomicity a row-lock would (spec §3 Invariant 2, §5
//          Concurrency).
// Dependencies: rusqlite, std::sync::mpsc
// ============================================================================

use std::sync::mpsc;
use std::thread::JoinHandle;

use pressline_core::core::AgentId;
use pressline_core::core::AgentRecord;
use pressline_core::core::AgentStatus;
use pressline_core::core::Article;
use pressline_core::core::ArticleId;
use pressline_core::core::Event;
use pressline_core::core::EventSeq;
use pressline_core::core::HumanPrompt;
use pressline_core::core::HumanPromptId;
use pressline_core::core::HumanPromptStatus;
use pressline_core::core::HumanSource;
use pressline_core::core::HumanSourceId;
use pressline_core::core::HumanSourceType;
use pressline_core::core::MemoryId;
use pressline_core::core::MemoryItem;
use pressline_core::core::MemoryType;
use pressline_core::core::NewTask;
use pressline_core::core::Role;
use pressline_core::core::StoryId;
use pressline_core::core::Task;
use pressline_core::core::TaskId;
use pressline_core::core::TaskStatus;
use pressline_core::core::Timestamp;
use pressline_core::interfaces::NewArticle;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use time::Duration;

use crate::error::SqliteStoreError;

type Reply<T> = mpsc::Sender<Result<T, SqliteStoreError>>;

/// One mutating request sent to the writer thread. Each variant pairs its
/// arguments with a reply channel for its specific result type, mirroring
/// the teacher's write-gateway command pattern.
enum WriteCommand {
    AppendEvent { story_id: StoryId, agent_id: Option<AgentId>, event_type: String, payload: serde_json::Value, reply: Reply<Event> },
    CreateTask { new_task: NewTask, reply: Reply<Task> },
    ClaimTask { role: Role, agent_id: AgentId, reply: Reply<Option<Task>> },
    CompleteTask { task_id: TaskId, output: serde_json::Value, reply: Reply<Task> },
    FailTask { task_id: TaskId, output: serde_json::Value, reply: Reply<Task> },
    RecoverStalled { stalled_lease: Duration, now: Timestamp, reply: Reply<Vec<Task>> },
    AddMemory {
        story_id: StoryId,
        content: String,
        embedding: Vec<f32>,
        memory_type: MemoryType,
        metadata: serde_json::Value,
        reply: Reply<MemoryItem>,
    },
    PublishArticle { article: NewArticle, reply: Reply<Article> },
    CorrectArticle { article_id: ArticleId, body: String, summary: String, reply: Reply<Article> },
    SubmitSource { source_type: HumanSourceType, content: String, reply: Reply<HumanSource> },
    LinkSource { source_id: HumanSourceId, story_id: StoryId, reply: Reply<()> },
    SubmitPrompt { prompt: String, reply: Reply<HumanPrompt> },
    MarkProcessing { prompt_id: HumanPromptId, research_task_id: TaskId, reply: Reply<HumanPrompt> },
    AnswerPrompt { prompt_id: HumanPromptId, response: String, reply: Reply<HumanPrompt> },
    RegisterAgent { role: Role, reply: Reply<AgentRecord> },
    Heartbeat { agent_id: AgentId, status: AgentStatus, reply: Reply<()> },
}

/// Owns the single write connection and the background thread draining
/// [`WriteCommand`]s sent to it.
pub struct WriteGateway {
    sender: mpsc::SyncSender<WriteCommand>,
    _handle: JoinHandle<()>,
}

impl WriteGateway {
    /// Spawns the writer thread over `conn`, bounding its inbox at
    /// `queue_capacity`.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Io`] if the OS refuses to spawn the
    /// thread.
    pub fn spawn(conn: Connection, queue_capacity: usize) -> Result<Self, SqliteStoreError> {
        let (sender, receiver) = mpsc::sync_channel(queue_capacity.max(1));
        let handle = std::thread::Builder::new()
            .name("pressline-sqlite-writer".to_owned())
            .spawn(move || run(&conn, &receiver))
            .map_err(|err| SqliteStoreError::Io(format!("failed to spawn sqlite writer thread: {err}")))?;
        Ok(Self { sender, _handle: handle })
    }

    fn call<T>(&self, build: impl FnOnce(Reply<T>) -> WriteCommand) -> Result<T, SqliteStoreError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.sender.send(build(reply_tx)).map_err(|_| SqliteStoreError::Overloaded)?;
        reply_rx.recv().map_err(|_| SqliteStoreError::Overloaded)?
    }

    pub fn append_event(
        &self,
        story_id: StoryId,
        agent_id: Option<AgentId>,
        event_type: String,
        payload: serde_json::Value,
    ) -> Result<Event, SqliteStoreError> {
        self.call(|reply| WriteCommand::AppendEvent { story_id, agent_id, event_type, payload, reply })
    }

    pub fn create_task(&self, new_task: NewTask) -> Result<Task, SqliteStoreError> {
        self.call(|reply| WriteCommand::CreateTask { new_task, reply })
    }

    pub fn claim_task(&self, role: Role, agent_id: AgentId) -> Result<Option<Task>, SqliteStoreError> {
        self.call(|reply| WriteCommand::ClaimTask { role, agent_id, reply })
    }

    pub fn complete_task(&self, task_id: TaskId, output: serde_json::Value) -> Result<Task, SqliteStoreError> {
        self.call(|reply| WriteCommand::CompleteTask { task_id, output, reply })
    }

    pub fn fail_task(&self, task_id: TaskId, output: serde_json::Value) -> Result<Task, SqliteStoreError> {
        self.call(|reply| WriteCommand::FailTask { task_id, output, reply })
    }

    pub fn recover_stalled(&self, stalled_lease: Duration, now: Timestamp) -> Result<Vec<Task>, SqliteStoreError> {
        self.call(|reply| WriteCommand::RecoverStalled { stalled_lease, now, reply })
    }

    pub fn add_memory(
        &self,
        story_id: StoryId,
        content: String,
        embedding: Vec<f32>,
        memory_type: MemoryType,
        metadata: serde_json::Value,
    ) -> Result<MemoryItem, SqliteStoreError> {
        self.call(|reply| WriteCommand::AddMemory { story_id, content, embedding, memory_type, metadata, reply })
    }

    pub fn publish_article(&self, article: NewArticle) -> Result<Article, SqliteStoreError> {
        self.call(|reply| WriteCommand::PublishArticle { article, reply })
    }

    pub fn correct_article(&self, article_id: ArticleId, body: String, summary: String) -> Result<Article, SqliteStoreError> {
        self.call(|reply| WriteCommand::CorrectArticle { article_id, body, summary, reply })
    }

    pub fn submit_source(&self, source_type: HumanSourceType, content: String) -> Result<HumanSource, SqliteStoreError> {
        self.call(|reply| WriteCommand::SubmitSource { source_type, content, reply })
    }

    pub fn link_source(&self, source_id: HumanSourceId, story_id: StoryId) -> Result<(), SqliteStoreError> {
        self.call(|reply| WriteCommand::LinkSource { source_id, story_id, reply })
    }

    pub fn submit_prompt(&self, prompt: String) -> Result<HumanPrompt, SqliteStoreError> {
        self.call(|reply| WriteCommand::SubmitPrompt { prompt, reply })
    }

    pub fn mark_processing(&self, prompt_id: HumanPromptId, research_task_id: TaskId) -> Result<HumanPrompt, SqliteStoreError> {
        self.call(|reply| WriteCommand::MarkProcessing { prompt_id, research_task_id, reply })
    }

    pub fn answer_prompt(&self, prompt_id: HumanPromptId, response: String) -> Result<HumanPrompt, SqliteStoreError> {
        self.call(|reply| WriteCommand::AnswerPrompt { prompt_id, response, reply })
    }

    pub fn register_agent(&self, role: Role) -> Result<AgentRecord, SqliteStoreError> {
        self.call(|reply| WriteCommand::RegisterAgent { role, reply })
    }

    pub fn heartbeat(&self, agent_id: AgentId, status: AgentStatus) -> Result<(), SqliteStoreError> {
        self.call(|reply| WriteCommand::Heartbeat { agent_id, status, reply })
    }
}

fn run(conn: &Connection, receiver: &mpsc::Receiver<WriteCommand>) {
    while let Ok(command) = receiver.recv() {
        match command {
            WriteCommand::AppendEvent { story_id, agent_id, event_type, payload, reply } => {
                let _ = reply.send(do_append_event(conn, story_id, agent_id, &event_type, &payload));
            }
            WriteCommand::CreateTask { new_task, reply } => {
                let _ = reply.send(do_create_task(conn, new_task));
            }
            WriteCommand::ClaimTask { role, agent_id, reply } => {
                let _ = reply.send(do_claim_task(conn, role, agent_id));
            }
            WriteCommand::CompleteTask { task_id, output, reply } => {
                let _ = reply.send(do_transition_task(conn, task_id, TaskStatus::Completed, &output));
            }
            WriteCommand::FailTask { task_id, output, reply } => {
                let _ = reply.send(do_transition_task(conn, task_id, TaskStatus::Failed, &output));
            }
            WriteCommand::RecoverStalled { stalled_lease, now, reply } => {
                let _ = reply.send(do_recover_stalled(conn, stalled_lease, now));
            }
            WriteCommand::AddMemory { story_id, content, embedding, memory_type, metadata, reply } => {
                let _ = reply.send(do_add_memory(conn, story_id, &content, embedding, memory_type, &metadata));
            }
            WriteCommand::PublishArticle { article, reply } => {
                let _ = reply.send(do_publish_article(conn, article));
            }
            WriteCommand::CorrectArticle { article_id, body, summary, reply } => {
                let _ = reply.send(do_correct_article(conn, article_id, &body, &summary));
            }
            WriteCommand::SubmitSource { source_type, content, reply } => {
                let _ = reply.send(do_submit_source(conn, source_type, &content));
            }
            WriteCommand::LinkSource { source_id, story_id, reply } => {
                let _ = reply.send(do_link_source(conn, source_id, story_id));
            }
            WriteCommand::SubmitPrompt { prompt, reply } => {
                let _ = reply.send(do_submit_prompt(conn, &prompt));
            }
            WriteCommand::MarkProcessing { prompt_id, research_task_id, reply } => {
                let _ = reply.send(do_mark_processing(conn, prompt_id, research_task_id));
            }
            WriteCommand::AnswerPrompt { prompt_id, response, reply } => {
                let _ = reply.send(do_answer_prompt(conn, prompt_id, &response));
            }
            WriteCommand::RegisterAgent { role, reply } => {
                let _ = reply.send(do_register_agent(conn, role));
            }
            WriteCommand::Heartbeat { agent_id, status, reply } => {
                let _ = reply.send(do_heartbeat(conn, agent_id, status));
            }
        }
    }
}

fn do_append_event(
    conn: &Connection,
    story_id: StoryId,
    agent_id: Option<AgentId>,
    event_type: &str,
    payload: &serde_json::Value,
) -> Result<Event, SqliteStoreError> {
    if event_type.is_empty() {
        return Err(SqliteStoreError::Invalid("event_type must not be empty".to_owned()));
    }
    let created_at = Timestamp::now();
    let payload_text = serde_json::to_string(payload)?;
    conn.execute(
        "INSERT INTO events (story_id, agent_id, event_type, payload, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![story_id.to_string(), agent_id.map(|a| a.to_string()), event_type, payload_text, String::from(created_at)],
    )?;
    let event_seq = conn.last_insert_rowid();
    Ok(Event { event_seq: EventSeq::new(event_seq), story_id, agent_id, event_type: event_type.to_owned(), payload: payload.clone(), created_at })
}

fn do_create_task(conn: &Connection, new_task: NewTask) -> Result<Task, SqliteStoreError> {
    let task_id = TaskId::new();
    let created_at = Timestamp::now();
    let input_text = serde_json::to_string(&new_task.input)?;
    conn.execute(
        "INSERT INTO tasks (task_id, story_id, stage, status, priority, assigned_agent, input, output, created_at, started_at, completed_at, deadline)
         VALUES (?1, ?2, ?3, 'pending', ?4, NULL, ?5, '{}', ?6, NULL, NULL, ?7)",
        params![
            task_id.to_string(),
            new_task.story_id.to_string(),
            new_task.stage.label(),
            new_task.priority,
            input_text,
            String::from(created_at),
            new_task.deadline.map(String::from),
        ],
    )?;
    Ok(Task {
        task_id,
        story_id: new_task.story_id,
        stage: new_task.stage,
        status: TaskStatus::Pending,
        priority: new_task.priority,
        assigned_agent: None,
        input: new_task.input,
        output: serde_json::Value::Object(serde_json::Map::new()),
        created_at,
        started_at: None,
        completed_at: None,
        deadline: new_task.deadline,
    })
}

fn do_claim_task(conn: &Connection, role: Role, agent_id: AgentId) -> Result<Option<Task>, SqliteStoreError> {
    let stages = pressline_core::core::stages_for_role(role);
    if stages.is_empty() {
        return Ok(None);
    }
    let placeholders: Vec<String> = stages.iter().map(|s| format!("'{}'", s.label())).collect();
    let sql = format!(
        "SELECT task_id FROM tasks WHERE status = 'pending' AND stage IN ({}) ORDER BY priority DESC, created_at ASC, task_id ASC LIMIT 1",
        placeholders.join(", ")
    );
    let task_id_str: Option<String> = conn.query_row(&sql, [], |row| row.get(0)).optional()?;
    let Some(task_id_str) = task_id_str else { return Ok(None) };

    let started_at = Timestamp::now();
    let changed = conn.execute(
        "UPDATE tasks SET status = 'active', assigned_agent = ?1, started_at = ?2 WHERE task_id = ?3 AND status = 'pending'",
        params![agent_id.to_string(), String::from(started_at), task_id_str],
    )?;
    if changed == 0 {
        // Lost the race to another caller between the SELECT and the UPDATE;
        // the caller's next poll will pick up whatever is left.
        return Ok(None);
    }

    let mut stmt = conn.prepare(
        "SELECT task_id, story_id, stage, status, priority, assigned_agent, input, output, created_at, started_at, completed_at, deadline
         FROM tasks WHERE task_id = ?1",
    )?;
    let task = stmt.query_row(params![task_id_str], |row| crate::convert::row_to_task(row).map_err(to_sql_err))?;
    Ok(Some(task))
}

fn do_transition_task(conn: &Connection, task_id: TaskId, status: TaskStatus, output: &serde_json::Value) -> Result<Task, SqliteStoreError> {
    let mut stmt = conn.prepare(
        "SELECT task_id, story_id, stage, status, priority, assigned_agent, input, output, created_at, started_at, completed_at, deadline
         FROM tasks WHERE task_id = ?1",
    )?;
    let existing = stmt
        .query_row(params![task_id.to_string()], |row| crate::convert::row_to_task(row).map_err(to_sql_err))
        .optional()?;
    let Some(existing) = existing else {
        return Err(SqliteStoreError::TaskNotFound(task_id));
    };
    if existing.status != TaskStatus::Active {
        return Err(SqliteStoreError::Invalid(format!("cannot transition task {task_id} from {:?} to {status:?}", existing.status)));
    }
    let completed_at = Timestamp::now();
    let output_text = serde_json::to_string(output)?;
    conn.execute(
        "UPDATE tasks SET status = ?1, output = ?2, completed_at = ?3 WHERE task_id = ?4",
        params![status.label(), output_text, String::from(completed_at), task_id.to_string()],
    )?;
    Ok(Task { status, output: output.clone(), completed_at: Some(completed_at), ..existing })
}

fn do_recover_stalled(conn: &Connection, stalled_lease: Duration, now: Timestamp) -> Result<Vec<Task>, SqliteStoreError> {
    let mut stmt = conn.prepare(
        "SELECT task_id, story_id, stage, status, priority, assigned_agent, input, output, created_at, started_at, completed_at, deadline
         FROM tasks WHERE status = 'active'",
    )?;
    let active: Vec<Task> = stmt
        .query_map([], |row| crate::convert::row_to_task(row).map_err(to_sql_err))?
        .collect::<rusqlite::Result<_>>()?;

    let mut recovered = Vec::new();
    for task in active {
        if task.is_stalled(stalled_lease, now) {
            conn.execute(
                "UPDATE tasks SET status = 'pending', assigned_agent = NULL, started_at = NULL WHERE task_id = ?1",
                params![task.task_id.to_string()],
            )?;
            tracing::warn!(task_id = %task.task_id, stage = %task.stage, "recovered stalled task");
            recovered.push(Task { status: TaskStatus::Pending, assigned_agent: None, started_at: None, ..task });
        }
    }
    Ok(recovered)
}

fn do_add_memory(
    conn: &Connection,
    story_id: StoryId,
    content: &str,
    embedding: Vec<f32>,
    memory_type: MemoryType,
    metadata: &serde_json::Value,
) -> Result<MemoryItem, SqliteStoreError> {
    if embedding.is_empty() {
        return Err(SqliteStoreError::Invalid("embedding must not be empty".to_owned()));
    }
    let id = MemoryId::new();
    let created_at = Timestamp::now();
    let embedding_text = serde_json::to_string(&embedding)?;
    let metadata_text = serde_json::to_string(metadata)?;
    conn.execute(
        "INSERT INTO memories (id, story_id, content, embedding, memory_type, metadata, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id.to_string(), story_id.to_string(), content, embedding_text, memory_type.label(), metadata_text, String::from(created_at)],
    )?;
    Ok(MemoryItem { id, story_id, content: content.to_owned(), embedding, memory_type, metadata: metadata.clone(), created_at })
}

fn do_publish_article(conn: &Connection, article: NewArticle) -> Result<Article, SqliteStoreError> {
    let article_id = ArticleId::new();
    let now = Timestamp::now();
    let sources_text = serde_json::to_string(&article.sources)?;
    let entities_text = serde_json::to_string(&article.entities)?;
    let tags_text = serde_json::to_string(&article.tags)?;
    let metadata_text = serde_json::to_string(&article.metadata)?;
    conn.execute(
        "INSERT INTO articles (article_id, story_id, headline, body, byline, summary, sources, entities, tags, metadata, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            article_id.to_string(),
            article.story_id.to_string(),
            article.headline,
            article.body,
            article.byline,
            article.summary,
            sources_text,
            entities_text,
            tags_text,
            metadata_text,
            String::from(now),
        ],
    )?;
    Ok(Article {
        article_id,
        story_id: article.story_id,
        headline: article.headline,
        body: article.body,
        byline: article.byline,
        summary: article.summary,
        sources: article.sources,
        entities: article.entities,
        tags: article.tags,
        metadata: article.metadata,
        created_at: now,
        updated_at: now,
    })
}

fn do_correct_article(conn: &Connection, article_id: ArticleId, body: &str, summary: &str) -> Result<Article, SqliteStoreError> {
    let updated_at = Timestamp::now();
    let changed = conn.execute(
        "UPDATE articles SET body = ?1, summary = ?2, updated_at = ?3 WHERE article_id = ?4",
        params![body, summary, String::from(updated_at), article_id.to_string()],
    )?;
    if changed == 0 {
        return Err(SqliteStoreError::ArticleNotFound(article_id));
    }
    let mut stmt = conn.prepare(
        "SELECT article_id, story_id, headline, body, byline, summary, sources, entities, tags, metadata, created_at, updated_at
         FROM articles WHERE article_id = ?1",
    )?;
    stmt.query_row(params![article_id.to_string()], |row| crate::convert::row_to_article(row).map_err(to_sql_err)).map_err(Into::into)
}

fn do_submit_source(conn: &Connection, source_type: HumanSourceType, content: &str) -> Result<HumanSource, SqliteStoreError> {
    let id = HumanSourceId::new();
    let created_at = Timestamp::now();
    conn.execute(
        "INSERT INTO human_sources (id, source_type, content, story_id, created_at) VALUES (?1, ?2, ?3, NULL, ?4)",
        params![id.to_string(), source_type.label(), content, String::from(created_at)],
    )?;
    Ok(HumanSource { id, source_type, content: content.to_owned(), story_id: None, created_at })
}

fn do_link_source(conn: &Connection, source_id: HumanSourceId, story_id: StoryId) -> Result<(), SqliteStoreError> {
    let changed = conn.execute(
        "UPDATE human_sources SET story_id = ?1 WHERE id = ?2",
        params![story_id.to_string(), source_id.to_string()],
    )?;
    if changed == 0 {
        return Err(SqliteStoreError::SourceNotFound(source_id));
    }
    Ok(())
}

fn do_submit_prompt(conn: &Connection, prompt: &str) -> Result<HumanPrompt, SqliteStoreError> {
    let id = HumanPromptId::new();
    let created_at = Timestamp::now();
    conn.execute(
        "INSERT INTO human_prompts (id, prompt, status, research_task_id, response, created_at) VALUES (?1, ?2, 'pending', NULL, NULL, ?3)",
        params![id.to_string(), prompt, String::from(created_at)],
    )?;
    Ok(HumanPrompt { id, prompt: prompt.to_owned(), status: HumanPromptStatus::Pending, research_task_id: None, response: None, created_at })
}

fn do_mark_processing(conn: &Connection, prompt_id: HumanPromptId, research_task_id: TaskId) -> Result<HumanPrompt, SqliteStoreError> {
    let changed = conn.execute(
        "UPDATE human_prompts SET status = 'processing', research_task_id = ?1 WHERE id = ?2",
        params![research_task_id.to_string(), prompt_id.to_string()],
    )?;
    if changed == 0 {
        return Err(SqliteStoreError::PromptNotFound(prompt_id));
    }
    fetch_prompt(conn, prompt_id)
}

fn do_answer_prompt(conn: &Connection, prompt_id: HumanPromptId, response: &str) -> Result<HumanPrompt, SqliteStoreError> {
    let changed = conn.execute(
        "UPDATE human_prompts SET status = 'answered', response = ?1 WHERE id = ?2",
        params![response, prompt_id.to_string()],
    )?;
    if changed == 0 {
        return Err(SqliteStoreError::PromptNotFound(prompt_id));
    }
    fetch_prompt(conn, prompt_id)
}

fn fetch_prompt(conn: &Connection, prompt_id: HumanPromptId) -> Result<HumanPrompt, SqliteStoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, prompt, status, research_task_id, response, created_at FROM human_prompts WHERE id = ?1",
    )?;
    stmt.query_row(params![prompt_id.to_string()], |row| crate::convert::row_to_human_prompt(row).map_err(to_sql_err)).map_err(Into::into)
}

fn do_register_agent(conn: &Connection, role: Role) -> Result<AgentRecord, SqliteStoreError> {
    let agent_id = AgentId::new();
    let last_heartbeat = Timestamp::now();
    conn.execute(
        "INSERT INTO agents (agent_id, role, status, last_heartbeat) VALUES (?1, ?2, 'idle', ?3)",
        params![agent_id.to_string(), role.label(), String::from(last_heartbeat)],
    )?;
    Ok(AgentRecord { agent_id, role, status: AgentStatus::Idle, last_heartbeat })
}

fn do_heartbeat(conn: &Connection, agent_id: AgentId, status: AgentStatus) -> Result<(), SqliteStoreError> {
    let last_heartbeat = Timestamp::now();
    let changed = conn.execute(
        "UPDATE agents SET status = ?1, last_heartbeat = ?2 WHERE agent_id = ?3",
        params![status.label(), String::from(last_heartbeat), agent_id.to_string()],
    )?;
    if changed == 0 {
        return Err(SqliteStoreError::AgentNotFound(agent_id));
    }
    Ok(())
}

fn to_sql_err(err: SqliteStoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}
