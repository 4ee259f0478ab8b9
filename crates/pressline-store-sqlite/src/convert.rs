// pressline-store-sqlite/src/convert.rs
// ============================================================================
// Module: Row conversion
// Description: Row <-> domain-type conversions shared by the writer gateway
//              and the read-pool query paths.
// Purpose: Keep one definition of each table's column layout.
// Dependencies: rusqlite, serde_json, pressline-core
// ============================================================================

use pressline_core::core::Article;
use pressline_core::core::Event;
use pressline_core::core::HumanPrompt;
use pressline_core::core::HumanSource;
use pressline_core::core::MemoryItem;
use pressline_core::core::Task;
use rusqlite::Row;

use crate::error::SqliteStoreError;

pub use pressline_core::core::AgentRecord;

/// A failable row converter, sharing [`SqliteStoreError`] with the rest of
/// the store.
pub type RowResult<T> = Result<T, SqliteStoreError>;

fn json_col(row: &Row, idx: usize) -> RowResult<serde_json::Value> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(Into::into)
}

fn timestamp_col(row: &Row, idx: usize) -> RowResult<pressline_core::core::Timestamp> {
    let raw: String = row.get(idx)?;
    raw.try_into().map_err(|err: pressline_core::core::TimestampParseError| SqliteStoreError::Corrupt(err.to_string()))
}

fn opt_timestamp_col(row: &Row, idx: usize) -> RowResult<Option<pressline_core::core::Timestamp>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| {
        value.try_into().map_err(|err: pressline_core::core::TimestampParseError| SqliteStoreError::Corrupt(err.to_string()))
    })
    .transpose()
}

/// Converts an `events` row into an [`Event`].
///
/// # Errors
/// Returns [`SqliteStoreError::Corrupt`] if a JSON or timestamp column fails
/// to decode.
pub fn row_to_event(row: &Row) -> RowResult<Event> {
    let agent_id: Option<String> = row.get(2)?;
    Ok(Event {
        event_seq: pressline_core::core::EventSeq::new(row.get(0)?),
        story_id: parse_uuid_col::<pressline_core::core::StoryId>(row, 1)?,
        agent_id: agent_id.map(|raw| parse_uuid_str(&raw).map(pressline_core::core::AgentId::from_uuid)).transpose()?,
        event_type: row.get(3)?,
        payload: json_col(row, 4)?,
        created_at: timestamp_col(row, 5)?,
    })
}

/// Converts a `tasks` row into a [`Task`].
///
/// # Errors
/// Returns [`SqliteStoreError::Corrupt`] if a JSON, enum, or timestamp
/// column fails to decode.
pub fn row_to_task(row: &Row) -> RowResult<Task> {
    let assigned_agent: Option<String> = row.get(5)?;
    let stage_label: String = row.get(2)?;
    let status_label: String = row.get(3)?;
    Ok(Task {
        task_id: parse_uuid_col::<pressline_core::core::TaskId>(row, 0)?,
        story_id: parse_uuid_col::<pressline_core::core::StoryId>(row, 1)?,
        stage: parse_stage(&stage_label)?,
        status: parse_task_status(&status_label)?,
        priority: row.get::<_, i32>(4)?,
        assigned_agent: assigned_agent.map(|raw| parse_uuid_str(&raw).map(pressline_core::core::AgentId::from_uuid)).transpose()?,
        input: json_col(row, 6)?,
        output: json_col(row, 7)?,
        created_at: timestamp_col(row, 8)?,
        started_at: opt_timestamp_col(row, 9)?,
        completed_at: opt_timestamp_col(row, 10)?,
        deadline: opt_timestamp_col(row, 11)?,
    })
}

/// Converts a `memories` row into a [`MemoryItem`].
///
/// # Errors
/// Returns [`SqliteStoreError::Corrupt`] if a JSON or timestamp column fails
/// to decode.
pub fn row_to_memory(row: &Row) -> RowResult<MemoryItem> {
    let memory_type_label: String = row.get(4)?;
    Ok(MemoryItem {
        id: parse_uuid_col::<pressline_core::core::MemoryId>(row, 0)?,
        story_id: parse_uuid_col::<pressline_core::core::StoryId>(row, 1)?,
        content: row.get(2)?,
        embedding: json_col(row, 3).and_then(|value| {
            serde_json::from_value(value).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))
        })?,
        memory_type: parse_memory_type(&memory_type_label)?,
        metadata: json_col(row, 5)?,
        created_at: timestamp_col(row, 6)?,
    })
}

/// Converts an `articles` row into an [`Article`].
///
/// # Errors
/// Returns [`SqliteStoreError::Corrupt`] if a JSON or timestamp column fails
/// to decode.
pub fn row_to_article(row: &Row) -> RowResult<Article> {
    Ok(Article {
        article_id: parse_uuid_col::<pressline_core::core::ArticleId>(row, 0)?,
        story_id: parse_uuid_col::<pressline_core::core::StoryId>(row, 1)?,
        headline: row.get(2)?,
        body: row.get(3)?,
        byline: row.get(4)?,
        summary: row.get(5)?,
        sources: json_col(row, 6).and_then(decode_string_vec)?,
        entities: json_col(row, 7).and_then(decode_string_vec)?,
        tags: json_col(row, 8).and_then(decode_string_vec)?,
        metadata: json_col(row, 9)?,
        created_at: timestamp_col(row, 10)?,
        updated_at: timestamp_col(row, 11)?,
    })
}

/// Converts a `human_sources` row into a [`HumanSource`].
///
/// # Errors
/// Returns [`SqliteStoreError::Corrupt`] if an enum or timestamp column
/// fails to decode.
pub fn row_to_human_source(row: &Row) -> RowResult<HumanSource> {
    let source_type_label: String = row.get(1)?;
    let story_id: Option<String> = row.get(3)?;
    Ok(HumanSource {
        id: parse_uuid_col::<pressline_core::core::HumanSourceId>(row, 0)?,
        source_type: parse_human_source_type(&source_type_label)?,
        content: row.get(2)?,
        story_id: story_id.map(|raw| parse_uuid_str(&raw).map(pressline_core::core::StoryId::from_uuid)).transpose()?,
        created_at: timestamp_col(row, 4)?,
    })
}

/// Converts a `human_prompts` row into a [`HumanPrompt`].
///
/// # Errors
/// Returns [`SqliteStoreError::Corrupt`] if an enum or timestamp column
/// fails to decode.
pub fn row_to_human_prompt(row: &Row) -> RowResult<HumanPrompt> {
    let status_label: String = row.get(2)?;
    let research_task_id: Option<String> = row.get(3)?;
    Ok(HumanPrompt {
        id: parse_uuid_col::<pressline_core::core::HumanPromptId>(row, 0)?,
        prompt: row.get(1)?,
        status: parse_human_prompt_status(&status_label)?,
        research_task_id: research_task_id.map(|raw| parse_uuid_str(&raw).map(pressline_core::core::TaskId::from_uuid)).transpose()?,
        response: row.get(4)?,
        created_at: timestamp_col(row, 5)?,
    })
}

/// Converts an `agents` row into an [`AgentRecord`].
///
/// # Errors
/// Returns [`SqliteStoreError::Corrupt`] if an enum or timestamp column
/// fails to decode.
pub fn row_to_agent(row: &Row) -> RowResult<AgentRecord> {
    let role_label: String = row.get(1)?;
    let status_label: String = row.get(2)?;
    Ok(AgentRecord {
        agent_id: parse_uuid_col::<pressline_core::core::AgentId>(row, 0)?,
        role: parse_role(&role_label)?,
        status: parse_agent_status(&status_label)?,
        last_heartbeat: timestamp_col(row, 3)?,
    })
}

fn decode_string_vec(value: serde_json::Value) -> RowResult<Vec<String>> {
    serde_json::from_value(value).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))
}

fn parse_uuid_str(raw: &str) -> RowResult<uuid::Uuid> {
    raw.parse().map_err(|_| SqliteStoreError::Corrupt(format!("invalid uuid: {raw}")))
}

fn parse_uuid_col<T: From<uuid::Uuid>>(row: &Row, idx: usize) -> RowResult<T> {
    let raw: String = row.get(idx)?;
    parse_uuid_str(&raw).map(T::from)
}

fn parse_stage(label: &str) -> RowResult<pressline_core::core::Stage> {
    use pressline_core::core::Stage;
    match label {
        "detect" => Ok(Stage::Detect),
        "research" => Ok(Stage::Research),
        "draft" => Ok(Stage::Draft),
        "edit" => Ok(Stage::Edit),
        "review" => Ok(Stage::Review),
        "publish" => Ok(Stage::Publish),
        other => Err(SqliteStoreError::Corrupt(format!("unknown stage: {other}"))),
    }
}

fn parse_task_status(label: &str) -> RowResult<pressline_core::core::TaskStatus> {
    use pressline_core::core::TaskStatus;
    match label {
        "pending" => Ok(TaskStatus::Pending),
        "active" => Ok(TaskStatus::Active),
        "completed" => Ok(TaskStatus::Completed),
        "failed" => Ok(TaskStatus::Failed),
        other => Err(SqliteStoreError::Corrupt(format!("unknown task status: {other}"))),
    }
}

fn parse_memory_type(label: &str) -> RowResult<pressline_core::core::MemoryType> {
    use pressline_core::core::MemoryType;
    match label {
        "summary" => Ok(MemoryType::Summary),
        "fact" => Ok(MemoryType::Fact),
        other => Err(SqliteStoreError::Corrupt(format!("unknown memory type: {other}"))),
    }
}

fn parse_human_source_type(label: &str) -> RowResult<pressline_core::core::HumanSourceType> {
    use pressline_core::core::HumanSourceType;
    match label {
        "url" => Ok(HumanSourceType::Url),
        "text" => Ok(HumanSourceType::Text),
        "document" => Ok(HumanSourceType::Document),
        other => Err(SqliteStoreError::Corrupt(format!("unknown human source type: {other}"))),
    }
}

fn parse_human_prompt_status(label: &str) -> RowResult<pressline_core::core::HumanPromptStatus> {
    use pressline_core::core::HumanPromptStatus;
    match label {
        "pending" => Ok(HumanPromptStatus::Pending),
        "processing" => Ok(HumanPromptStatus::Processing),
        "answered" => Ok(HumanPromptStatus::Answered),
        other => Err(SqliteStoreError::Corrupt(format!("unknown human prompt status: {other}"))),
    }
}

fn parse_role(label: &str) -> RowResult<pressline_core::core::Role> {
    use pressline_core::core::Role;
    match label {
        "chief" => Ok(Role::Chief),
        "scout" => Ok(Role::Scout),
        "reporter" => Ok(Role::Reporter),
        "editor" => Ok(Role::Editor),
        "publisher" => Ok(Role::Publisher),
        other => Err(SqliteStoreError::Corrupt(format!("unknown role: {other}"))),
    }
}

fn parse_agent_status(label: &str) -> RowResult<pressline_core::core::AgentStatus> {
    use pressline_core::core::AgentStatus;
    match label {
        "idle" => Ok(AgentStatus::Idle),
        "working" => Ok(AgentStatus::Working),
        "offline" => Ok(AgentStatus::Offline),
        other => Err(SqliteStoreError::Corrupt(format!("unknown agent status: {other}"))),
    }
}
