// pressline-store-sqlite/src/schema.rs
// ============================================================================
// Module: Schema
// Description: The DDL backing every `pressline-core::interfaces` trait.
// Purpose: Single source of truth for table/index layout, applied once at
//          store construction (spec §3 "Ownership").
// Dependencies: rusqlite
// ============================================================================

/// The full schema, applied idempotently via `CREATE TABLE IF NOT EXISTS`.
///
/// `payload`/`input`/`output`/`metadata` columns are stored as `TEXT`
/// holding serialized JSON (spec Design Note §9: schemaless payloads are a
/// deliberate choice, not a missing migration).
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS events (
    event_seq   INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id    TEXT NOT NULL,
    agent_id    TEXT,
    event_type  TEXT NOT NULL,
    payload     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_story ON events(story_id, event_seq);

CREATE TABLE IF NOT EXISTS tasks (
    task_id         TEXT PRIMARY KEY,
    story_id        TEXT NOT NULL,
    stage           TEXT NOT NULL,
    status          TEXT NOT NULL,
    priority        INTEGER NOT NULL,
    assigned_agent  TEXT,
    input           TEXT NOT NULL,
    output          TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    started_at      TEXT,
    completed_at    TEXT,
    deadline        TEXT
);
CREATE INDEX IF NOT EXISTS idx_tasks_claimable ON tasks(status, stage, priority DESC, created_at);
CREATE INDEX IF NOT EXISTS idx_tasks_story ON tasks(story_id);
CREATE INDEX IF NOT EXISTS idx_tasks_active_started ON tasks(status, started_at);

CREATE TABLE IF NOT EXISTS memories (
    id          TEXT PRIMARY KEY,
    story_id    TEXT NOT NULL,
    content     TEXT NOT NULL,
    embedding   TEXT NOT NULL,
    memory_type TEXT NOT NULL,
    metadata    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type);

CREATE TABLE IF NOT EXISTS articles (
    article_id  TEXT PRIMARY KEY,
    story_id    TEXT NOT NULL UNIQUE,
    headline    TEXT NOT NULL,
    body        TEXT NOT NULL,
    byline      TEXT NOT NULL,
    summary     TEXT NOT NULL,
    sources     TEXT NOT NULL,
    entities    TEXT NOT NULL,
    tags        TEXT NOT NULL,
    metadata    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS human_sources (
    id          TEXT PRIMARY KEY,
    source_type TEXT NOT NULL,
    content     TEXT NOT NULL,
    story_id    TEXT,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_human_sources_unlinked ON human_sources(story_id);

CREATE TABLE IF NOT EXISTS human_prompts (
    id                TEXT PRIMARY KEY,
    prompt            TEXT NOT NULL,
    status            TEXT NOT NULL,
    research_task_id  TEXT,
    response          TEXT,
    created_at        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_human_prompts_status ON human_prompts(status);

CREATE TABLE IF NOT EXISTS agents (
    agent_id        TEXT PRIMARY KEY,
    role            TEXT NOT NULL,
    status          TEXT NOT NULL,
    last_heartbeat  TEXT NOT NULL
);
";

/// Applies [`SCHEMA_SQL`] to `conn`.
///
/// # Errors
/// Returns a [`rusqlite::Error`] if any statement fails.
pub fn apply(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
