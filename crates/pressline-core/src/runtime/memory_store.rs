// pressline-core/src/runtime/memory_store.rs
// ============================================================================
// Module: In-memory store
// Description: A single struct implementing every `crate::interfaces` trait
//              over plain `Mutex<Vec<_>>` state.
// Purpose: Let runtime tests and examples exercise Chief/Scout/AgentRuntime
//          without a SQLite dependency, mirroring the teacher's pattern of
//          a lightweight fixture store alongside the real backend.
// Dependencies: crate::core, crate::interfaces, std::sync
// ============================================================================

use std::sync::Mutex;

use time::Duration;

use crate::core::AgentId;
use crate::core::AgentRecord;
use crate::core::AgentStatus;
use crate::core::Article;
use crate::core::ArticleId;
use crate::core::Event;
use crate::core::EventSeq;
use crate::core::HumanPrompt;
use crate::core::HumanPromptId;
use crate::core::HumanPromptStatus;
use crate::core::HumanSource;
use crate::core::HumanSourceId;
use crate::core::HumanSourceType;
use crate::core::MemoryItem;
use crate::core::MemoryId;
use crate::core::MemoryType;
use crate::core::NewTask;
use crate::core::Role;
use crate::core::SimilarMemory;
use crate::core::StoryId;
use crate::core::Task;
use crate::core::TaskId;
use crate::core::TaskStatus;
use crate::core::Timestamp;
use crate::core::cosine_similarity;
use crate::core::eligible_role;
use crate::interfaces::AgentRegistry;
use crate::interfaces::AgentRegistryError;
use crate::interfaces::ArticleStore;
use crate::interfaces::ArticleStoreError;
use crate::interfaces::EventLog;
use crate::interfaces::EventLogError;
use crate::interfaces::HumanOversightError;
use crate::interfaces::HumanOversightStore;
use crate::interfaces::MemoryStore;
use crate::interfaces::MemoryStoreError;
use crate::interfaces::NewArticle;
use crate::interfaces::TaskQueue;
use crate::interfaces::TaskQueueError;

#[derive(Default)]
struct State {
    events: Vec<Event>,
    tasks: Vec<Task>,
    memories: Vec<MemoryItem>,
    articles: Vec<Article>,
    human_sources: Vec<HumanSource>,
    human_prompts: Vec<HumanPrompt>,
    agents: Vec<AgentRecord>,
}

/// A single backing store implementing every trait in [`crate::interfaces`]
/// over locked `Vec`s. Not persistent, not optimized; intended for tests and
/// for running the CLI against an ephemeral in-process backend.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Builds an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl EventLog for InMemoryStore {
    fn append(
        &self,
        story_id: StoryId,
        agent_id: Option<AgentId>,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Event, EventLogError> {
        if event_type.is_empty() {
            return Err(EventLogError::Invalid("event_type must not be empty".to_owned()));
        }
        let mut state = self.lock();
        let event_seq = EventSeq::new(state.events.len() as i64 + 1);
        let event = Event { event_seq, story_id, agent_id, event_type: event_type.to_owned(), payload, created_at: Timestamp::now() };
        state.events.push(event.clone());
        Ok(event)
    }

    fn list_for_story(&self, story_id: StoryId) -> Result<Vec<Event>, EventLogError> {
        Ok(self.lock().events.iter().filter(|e| e.story_id == story_id).cloned().collect())
    }

    fn list_since(&self, since: EventSeq, limit: usize) -> Result<Vec<Event>, EventLogError> {
        Ok(self.lock().events.iter().filter(|e| e.event_seq > since).take(limit).cloned().collect())
    }

    fn latest_seq(&self) -> Result<EventSeq, EventLogError> {
        Ok(self.lock().events.last().map_or(EventSeq::new(0), |e| e.event_seq))
    }
}

impl TaskQueue for InMemoryStore {
    fn create(&self, new_task: NewTask) -> Result<Task, TaskQueueError> {
        let mut state = self.lock();
        let task = Task {
            task_id: TaskId::new(),
            story_id: new_task.story_id,
            stage: new_task.stage,
            status: TaskStatus::Pending,
            priority: new_task.priority,
            assigned_agent: None,
            input: new_task.input,
            output: serde_json::Value::Null,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            deadline: new_task.deadline,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    fn claim(&self, role: Role, agent_id: AgentId) -> Result<Option<Task>, TaskQueueError> {
        let mut state = self.lock();
        let mut candidate_idx = None;
        for (idx, task) in state.tasks.iter().enumerate() {
            if task.status != TaskStatus::Pending || eligible_role(task.stage) != Some(role) {
                continue;
            }
            candidate_idx = Some(match candidate_idx {
                None => idx,
                Some(best) => {
                    let best_task = &state.tasks[best];
                    if task.priority > best_task.priority
                        || (task.priority == best_task.priority && task.created_at.as_offset() < best_task.created_at.as_offset())
                    {
                        idx
                    } else {
                        best
                    }
                }
            });
        }
        let Some(idx) = candidate_idx else { return Ok(None) };
        let task = &mut state.tasks[idx];
        task.status = TaskStatus::Active;
        task.assigned_agent = Some(agent_id);
        task.started_at = Some(Timestamp::now());
        Ok(Some(task.clone()))
    }

    fn complete(&self, task_id: TaskId, output: serde_json::Value) -> Result<Task, TaskQueueError> {
        self.transition(task_id, TaskStatus::Completed, output)
    }

    fn fail(&self, task_id: TaskId, output: serde_json::Value) -> Result<Task, TaskQueueError> {
        self.transition(task_id, TaskStatus::Failed, output)
    }

    fn get(&self, task_id: TaskId) -> Result<Option<Task>, TaskQueueError> {
        Ok(self.lock().tasks.iter().find(|t| t.task_id == task_id).cloned())
    }

    fn list_for_story(&self, story_id: StoryId) -> Result<Vec<Task>, TaskQueueError> {
        Ok(self.lock().tasks.iter().filter(|t| t.story_id == story_id).cloned().collect())
    }

    fn recover_stalled(&self, stalled_lease: Duration, now: Timestamp) -> Result<Vec<Task>, TaskQueueError> {
        let mut state = self.lock();
        let mut recovered = Vec::new();
        for task in &mut state.tasks {
            if task.is_stalled(stalled_lease, now) {
                task.status = TaskStatus::Pending;
                task.assigned_agent = None;
                task.started_at = None;
                recovered.push(task.clone());
            }
        }
        Ok(recovered)
    }
}

impl InMemoryStore {
    fn transition(&self, task_id: TaskId, status: TaskStatus, output: serde_json::Value) -> Result<Task, TaskQueueError> {
        let mut state = self.lock();
        let task = state.tasks.iter_mut().find(|t| t.task_id == task_id).ok_or(TaskQueueError::NotFound(task_id))?;
        if task.status != TaskStatus::Active {
            return Err(TaskQueueError::IllegalTransition {
                task_id,
                reason: format!("cannot transition from {:?} to {status:?}", task.status),
            });
        }
        task.status = status;
        task.output = output;
        task.completed_at = Some(Timestamp::now());
        Ok(task.clone())
    }
}

impl MemoryStore for InMemoryStore {
    fn add(
        &self,
        story_id: StoryId,
        content: &str,
        embedding: Vec<f32>,
        memory_type: MemoryType,
        metadata: serde_json::Value,
    ) -> Result<MemoryItem, MemoryStoreError> {
        if embedding.is_empty() {
            return Err(MemoryStoreError::Invalid("embedding must not be empty".to_owned()));
        }
        let item = MemoryItem {
            id: MemoryId::new(),
            story_id,
            content: content.to_owned(),
            embedding,
            memory_type,
            metadata,
            created_at: Timestamp::now(),
        };
        self.lock().memories.push(item.clone());
        Ok(item)
    }

    fn find_similar(&self, embedding: &[f32], threshold: f32, limit: usize) -> Result<Vec<SimilarMemory>, MemoryStoreError> {
        let state = self.lock();
        let mut scored: Vec<SimilarMemory> = state
            .memories
            .iter()
            .filter(|m| m.memory_type == MemoryType::Summary)
            .map(|m| SimilarMemory { story_id: m.story_id, similarity: cosine_similarity(embedding, &m.embedding), content: m.content.clone() })
            .filter(|m| m.similarity >= threshold)
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(limit);
        Ok(scored)
    }
}

impl ArticleStore for InMemoryStore {
    fn publish(&self, article: NewArticle) -> Result<Article, ArticleStoreError> {
        let now = Timestamp::now();
        let record = Article {
            article_id: ArticleId::new(),
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
        };
        self.lock().articles.push(record.clone());
        Ok(record)
    }

    fn get(&self, article_id: ArticleId) -> Result<Option<Article>, ArticleStoreError> {
        Ok(self.lock().articles.iter().find(|a| a.article_id == article_id).cloned())
    }

    fn get_for_story(&self, story_id: StoryId) -> Result<Option<Article>, ArticleStoreError> {
        Ok(self.lock().articles.iter().find(|a| a.story_id == story_id).cloned())
    }

    fn correct(&self, article_id: ArticleId, body: &str, summary: &str) -> Result<Article, ArticleStoreError> {
        let mut state = self.lock();
        let article = state.articles.iter_mut().find(|a| a.article_id == article_id).ok_or(ArticleStoreError::NotFound(article_id))?;
        article.body = body.to_owned();
        article.summary = summary.to_owned();
        article.updated_at = Timestamp::now();
        Ok(article.clone())
    }
}

impl HumanOversightStore for InMemoryStore {
    fn submit_source(&self, source_type: HumanSourceType, content: &str) -> Result<HumanSource, HumanOversightError> {
        let source = HumanSource { id: HumanSourceId::new(), source_type, content: content.to_owned(), story_id: None, created_at: Timestamp::now() };
        self.lock().human_sources.push(source.clone());
        Ok(source)
    }

    fn link_source_to_story(&self, source_id: HumanSourceId, story_id: StoryId) -> Result<(), HumanOversightError> {
        let mut state = self.lock();
        let source = state.human_sources.iter_mut().find(|s| s.id == source_id).ok_or(HumanOversightError::SourceNotFound(source_id))?;
        source.story_id = Some(story_id);
        Ok(())
    }

    fn list_unlinked_sources(&self) -> Result<Vec<HumanSource>, HumanOversightError> {
        Ok(self.lock().human_sources.iter().filter(|s| s.story_id.is_none()).cloned().collect())
    }

    fn submit_prompt(&self, prompt: &str) -> Result<HumanPrompt, HumanOversightError> {
        let record = HumanPrompt {
            id: HumanPromptId::new(),
            prompt: prompt.to_owned(),
            status: HumanPromptStatus::Pending,
            research_task_id: None,
            response: None,
            created_at: Timestamp::now(),
        };
        self.lock().human_prompts.push(record.clone());
        Ok(record)
    }

    fn list_pending_prompts(&self) -> Result<Vec<HumanPrompt>, HumanOversightError> {
        Ok(self.lock().human_prompts.iter().filter(|p| p.status == HumanPromptStatus::Pending).cloned().collect())
    }

    fn mark_processing(&self, prompt_id: HumanPromptId, research_task_id: TaskId) -> Result<HumanPrompt, HumanOversightError> {
        let mut state = self.lock();
        let prompt = state.human_prompts.iter_mut().find(|p| p.id == prompt_id).ok_or(HumanOversightError::PromptNotFound(prompt_id))?;
        prompt.status = HumanPromptStatus::Processing;
        prompt.research_task_id = Some(research_task_id);
        Ok(prompt.clone())
    }

    fn answer(&self, prompt_id: HumanPromptId, response: &str) -> Result<HumanPrompt, HumanOversightError> {
        let mut state = self.lock();
        let prompt = state.human_prompts.iter_mut().find(|p| p.id == prompt_id).ok_or(HumanOversightError::PromptNotFound(prompt_id))?;
        prompt.status = HumanPromptStatus::Answered;
        prompt.response = Some(response.to_owned());
        Ok(prompt.clone())
    }
}

impl AgentRegistry for InMemoryStore {
    fn register(&self, role: Role) -> Result<AgentRecord, AgentRegistryError> {
        let record = AgentRecord { agent_id: AgentId::new(), role, status: AgentStatus::Idle, last_heartbeat: Timestamp::now() };
        self.lock().agents.push(record.clone());
        Ok(record)
    }

    fn heartbeat(&self, agent_id: AgentId, status: AgentStatus) -> Result<(), AgentRegistryError> {
        let mut state = self.lock();
        let agent = state.agents.iter_mut().find(|a| a.agent_id == agent_id).ok_or(AgentRegistryError::NotFound(agent_id))?;
        agent.status = status;
        agent.last_heartbeat = Timestamp::now();
        Ok(())
    }

    fn get(&self, agent_id: AgentId) -> Result<Option<AgentRecord>, AgentRegistryError> {
        Ok(self.lock().agents.iter().find(|a| a.agent_id == agent_id).cloned())
    }

    fn list(&self) -> Result<Vec<AgentRecord>, AgentRegistryError> {
        Ok(self.lock().agents.clone())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only fixture assertions."
)]
mod tests {
    use super::InMemoryStore;
    use crate::core::MemoryType;
    use crate::core::NewTask;
    use crate::core::Role;
    use crate::core::Stage;
    use crate::core::StoryId;
    use crate::interfaces::EventLog;
    use crate::interfaces::MemoryStore;
    use crate::interfaces::TaskQueue;

    #[test]
    fn claim_picks_highest_priority_then_oldest() {
        let store = InMemoryStore::new();
        let story_id = StoryId::new();
        let low = store
            .create(NewTask { story_id, stage: Stage::Research, priority: 1, input: serde_json::Value::Null, deadline: None })
            .unwrap();
        let high = store
            .create(NewTask { story_id, stage: Stage::Research, priority: 9, input: serde_json::Value::Null, deadline: None })
            .unwrap();

        let claimed = store.claim(Role::Reporter, crate::core::AgentId::new()).unwrap().unwrap();
        assert_eq!(claimed.task_id, high.task_id);
        assert_ne!(claimed.task_id, low.task_id);
    }

    #[test]
    fn claim_returns_none_when_empty() {
        let store = InMemoryStore::new();
        assert!(store.claim(Role::Reporter, crate::core::AgentId::new()).unwrap().is_none());
    }

    #[test]
    fn complete_twice_is_illegal_transition() {
        let store = InMemoryStore::new();
        let story_id = StoryId::new();
        let task = store
            .create(NewTask { story_id, stage: Stage::Research, priority: 1, input: serde_json::Value::Null, deadline: None })
            .unwrap();
        store.claim(Role::Reporter, crate::core::AgentId::new()).unwrap();
        store.complete(task.task_id, serde_json::json!({})).unwrap();
        assert!(store.complete(task.task_id, serde_json::json!({})).is_err());
    }

    #[test]
    fn find_similar_respects_threshold() {
        let store = InMemoryStore::new();
        let story_id = StoryId::new();
        store.add(story_id, "summary text", vec![1.0, 0.0], MemoryType::Summary, serde_json::Value::Null).unwrap();
        let matches = store.find_similar(&[1.0, 0.0], 0.99, 10).unwrap();
        assert_eq!(matches.len(), 1);
        let none = store.find_similar(&[0.0, 1.0], 0.5, 10).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn events_are_append_only_and_ordered() {
        let store = InMemoryStore::new();
        let story_id = StoryId::new();
        store.append(story_id, None, "story.detected", serde_json::json!({})).unwrap();
        store.append(story_id, None, "story.created", serde_json::json!({})).unwrap();
        let events = store.list_for_story(story_id).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].event_seq < events[1].event_seq);
    }
}
