// pressline-core/src/runtime/chief.rs
// ============================================================================
// Module: Chief
// Description: The orchestrator sweep that advances stories across stages.
// Purpose: Fold new events into task creation, publish decisions, and
//          stalled-task recovery (spec §4.1 "Orchestrator", §4.8).
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The Chief never claims a task itself; it reacts to the event log and the
//! task queue to create the *next* task in a story's pipeline (spec §3
//! Ownership: "the event log is the sole source of truth for pipeline
//! decisions; the task table is a derived, denormalized view"). One sweep is
//! a single, deterministic pass: drain new events, recover stalled leases,
//! and dispatch any pending human prompts. [`Chief::sweep_once`] is the
//! single canonical execution path; [`Chief::run`] just calls it on a timer,
//! grounded on the `ControlPlane` single-entry-point pattern.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde_json::json;
use time::Duration;

use crate::core::Event;
use crate::core::EventSeq;
use crate::core::NewTask;
use crate::core::ReviewDecision;
use crate::core::Stage;
use crate::core::StoryId;
use crate::core::TaskStatus;
use crate::core::Timestamp;
use crate::core::event_type;
use crate::interfaces::ArticleStoreError;
use crate::interfaces::EventLogError;
use crate::interfaces::HumanOversightError;
use crate::interfaces::NewArticle;
use crate::interfaces::TaskQueueError;
use crate::interfaces::{ArticleStore, EventLog, HumanOversightStore, TaskQueue};

/// Failure modes of a [`Chief`] sweep.
#[derive(Debug, thiserror::Error)]
pub enum ChiefError {
    /// The event log failed during a sweep.
    #[error("chief: event log failure: {0}")]
    EventLog(#[from] EventLogError),
    /// The task queue failed during a sweep.
    #[error("chief: task queue failure: {0}")]
    TaskQueue(#[from] TaskQueueError),
    /// The article store failed during a sweep.
    #[error("chief: article store failure: {0}")]
    ArticleStore(#[from] ArticleStoreError),
    /// The human oversight store failed during a sweep.
    #[error("chief: human oversight failure: {0}")]
    HumanOversight(#[from] HumanOversightError),
}

/// Tunables for one [`Chief`] instance (spec §4.8, §6 config keys).
#[derive(Debug, Clone)]
pub struct ChiefConfig {
    /// Detections scoring below this are rejected rather than admitted.
    pub min_newsworthiness_score: f32,
    /// How long an `active` task may hold its lease before it is considered
    /// stalled and returned to `pending`.
    pub stalled_lease: Duration,
    /// Page size for each event-log scan.
    pub event_batch_size: usize,
    /// Maximum `edit`-stage tasks a story may accumulate before a further
    /// `REJECT` review kills it instead of requesting another revision
    /// (spec §4.3 stage-advancement table, §8 invariant 4).
    pub max_revisions: u32,
    /// Channels attached to a `publish` task when the review output does not
    /// name any explicitly (spec §4.3 stage-advancement table).
    pub default_channels: Vec<String>,
}

impl Default for ChiefConfig {
    fn default() -> Self {
        Self {
            min_newsworthiness_score: 0.6,
            stalled_lease: Duration::minutes(10),
            event_batch_size: 256,
            max_revisions: 3,
            default_channels: vec!["log".to_owned()],
        }
    }
}

/// Outcome counters for one sweep, surfaced to the CLI and logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Detections admitted as new stories.
    pub detections_admitted: usize,
    /// Detections rejected below the newsworthiness threshold.
    pub detections_rejected: usize,
    /// Follow-on tasks created (draft/review/edit).
    pub tasks_created: usize,
    /// Articles published this sweep.
    pub articles_published: usize,
    /// Stalled tasks recovered back to `pending`.
    pub tasks_recovered: usize,
    /// Human prompts dispatched to a research task.
    pub prompts_dispatched: usize,
}

/// The orchestrator. Holds no business state of its own beyond its event
/// cursor; everything else lives in the stores it is built from.
pub struct Chief {
    log: Arc<dyn EventLog>,
    tasks: Arc<dyn TaskQueue>,
    articles: Arc<dyn ArticleStore>,
    human: Arc<dyn HumanOversightStore>,
    config: ChiefConfig,
    cursor: Mutex<EventSeq>,
}

impl Chief {
    /// Builds a `Chief` that starts tailing the event log from the
    /// beginning (`EventSeq::new(0)`).
    #[must_use]
    pub fn new(
        log: Arc<dyn EventLog>,
        tasks: Arc<dyn TaskQueue>,
        articles: Arc<dyn ArticleStore>,
        human: Arc<dyn HumanOversightStore>,
        config: ChiefConfig,
    ) -> Self {
        Self { log, tasks, articles, human, config, cursor: Mutex::new(EventSeq::new(0)) }
    }

    /// Runs one full sweep: drains new events, recovers stalled tasks, and
    /// dispatches pending human prompts. Safe to call repeatedly and
    /// concurrently with role workers claiming tasks.
    ///
    /// # Errors
    /// Returns [`ChiefError`] if any backing store fails. A failed sweep
    /// does not advance the event cursor, so the next sweep retries from the
    /// same point.
    pub fn sweep_once(&self, now: Timestamp) -> Result<SweepReport, ChiefError> {
        let mut report = SweepReport::default();

        let since = *self.cursor.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let events = self.log.list_since(since, self.config.event_batch_size)?;
        let mut new_cursor = since;
        for event in &events {
            self.handle_event(event, &mut report)?;
            new_cursor = event.event_seq;
        }
        *self.cursor.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = new_cursor;

        let recovered = self.tasks.recover_stalled(self.config.stalled_lease, now)?;
        report.tasks_recovered = recovered.len();

        let pending_prompts = self.human.list_pending_prompts()?;
        for prompt in pending_prompts {
            let task = self.tasks.create(NewTask {
                story_id: crate::core::StoryId::new(),
                stage: Stage::Research,
                priority: 5,
                input: json!({ "human_prompt_id": prompt.id, "question": prompt.prompt }),
                deadline: None,
            })?;
            self.human.mark_processing(prompt.id, task.task_id)?;
            report.prompts_dispatched += 1;
        }

        Ok(report)
    }

    fn handle_event(&self, event: &Event, report: &mut SweepReport) -> Result<(), ChiefError> {
        match event.event_type.as_str() {
            event_type::STORY_DETECTED => self.admit_or_reject(event, report),
            t if t == event_type::task_completed(Stage::Research) => {
                self.queue_follow_on(event, Stage::Draft, false, report)
            }
            t if t == event_type::task_completed(Stage::Draft)
                || t == event_type::task_completed(Stage::Edit) =>
            {
                self.queue_follow_on(event, Stage::Review, true, report)
            }
            t if t == event_type::task_completed(Stage::Review) => self.process_review(event, report),
            _ => Ok(()),
        }
    }

    /// Returns whether a task at `stage` already exists for `story_id`. When
    /// `only_non_terminal` is set, a `Completed`/`Failed` task at that stage
    /// does not count — a fresh `review` task is legal once the prior one has
    /// terminated, but a duplicate `draft` task never is (spec §4.3 "Task
    /// creation under these rules must be idempotent").
    fn task_exists_at_stage(
        &self,
        story_id: StoryId,
        stage: Stage,
        only_non_terminal: bool,
    ) -> Result<bool, ChiefError> {
        Ok(self.tasks.list_for_story(story_id)?.iter().any(|task| {
            task.stage == stage
                && (!only_non_terminal || matches!(task.status, TaskStatus::Pending | TaskStatus::Active))
        }))
    }

    fn admit_or_reject(&self, event: &Event, report: &mut SweepReport) -> Result<(), ChiefError> {
        if !self.log.list_for_story(event.story_id)?.iter().any(|e| {
            e.event_type == event_type::STORY_CREATED || e.event_type == event_type::STORY_REJECTED
        }) {
            self.admit_or_reject_unchecked(event, report)?;
        }
        Ok(())
    }

    fn admit_or_reject_unchecked(&self, event: &Event, report: &mut SweepReport) -> Result<(), ChiefError> {
        let payload = event.payload_object();
        let score = payload.get("score").and_then(serde_json::Value::as_f64).unwrap_or(0.0) as f32;
        if score < self.config.min_newsworthiness_score {
            self.log.append(
                event.story_id,
                None,
                event_type::STORY_REJECTED,
                json!({ "reason": "low_score", "score": score }),
            )?;
            report.detections_rejected += 1;
            return Ok(());
        }

        let title = payload.get("title").cloned().unwrap_or(serde_json::Value::Null);
        self.log.append(
            event.story_id,
            None,
            event_type::STORY_CREATED,
            json!({ "score": score, "title": title }),
        )?;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "score is in [0, 1]; score * 10.0 rounded is always in [0, 10]"
        )]
        let priority = (score * 10.0).round() as i32;
        self.tasks.create(NewTask {
            story_id: event.story_id,
            stage: Stage::Research,
            priority,
            input: payload.into(),
            deadline: None,
        })?;
        report.detections_admitted += 1;
        report.tasks_created += 1;
        Ok(())
    }

    fn queue_follow_on(
        &self,
        event: &Event,
        next_stage: Stage,
        only_block_non_terminal: bool,
        report: &mut SweepReport,
    ) -> Result<(), ChiefError> {
        if self.task_exists_at_stage(event.story_id, next_stage, only_block_non_terminal)? {
            return Ok(());
        }
        let payload = event.payload_object();
        let priority = payload.get("priority").and_then(serde_json::Value::as_i64).unwrap_or(5) as i32;
        self.tasks.create(NewTask {
            story_id: event.story_id,
            stage: next_stage,
            priority,
            input: event.payload.clone(),
            deadline: None,
        })?;
        report.tasks_created += 1;
        Ok(())
    }

    fn process_review(&self, event: &Event, report: &mut SweepReport) -> Result<(), ChiefError> {
        let payload = event.payload_object();
        let decision = payload
            .get("decision")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| serde_json::from_value::<ReviewDecision>(json!(s)).ok());

        match decision {
            Some(ReviewDecision::Approve) => self.approve_review(event, &payload, report),
            Some(ReviewDecision::Reject) | None => self.reject_review(event, &payload, report),
        }
    }

    fn approve_review(
        &self,
        event: &Event,
        payload: &serde_json::Map<String, serde_json::Value>,
        report: &mut SweepReport,
    ) -> Result<(), ChiefError> {
        if self.task_exists_at_stage(event.story_id, Stage::Publish, false)? {
            return Ok(());
        }
        let sources: Vec<String> = payload
            .get("sources")
            .and_then(serde_json::Value::as_array)
            .map(|values| values.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
            .unwrap_or_default();
        let article = self.articles.publish(NewArticle {
            story_id: event.story_id,
            headline: field_str(payload, "headline"),
            body: field_str(payload, "body"),
            byline: field_str(payload, "byline"),
            summary: field_str(payload, "summary"),
            sources,
            entities: field_str_array(payload, "entities"),
            tags: field_str_array(payload, "tags"),
            metadata: serde_json::Value::Object(payload.clone()),
        })?;
        self.log.append(
            event.story_id,
            None,
            event_type::ARTICLE_PUBLISHED,
            json!({ "article_id": article.article_id }),
        )?;
        report.articles_published += 1;
        self.tasks.create(NewTask {
            story_id: event.story_id,
            stage: Stage::Publish,
            priority: 8,
            input: json!({ "article_id": article.article_id, "channels": self.config.default_channels }),
            deadline: None,
        })?;
        report.tasks_created += 1;
        Ok(())
    }

    fn reject_review(
        &self,
        event: &Event,
        payload: &serde_json::Map<String, serde_json::Value>,
        report: &mut SweepReport,
    ) -> Result<(), ChiefError> {
        let revision_count = self
            .tasks
            .list_for_story(event.story_id)?
            .iter()
            .filter(|task| task.stage == Stage::Edit)
            .count();
        if revision_count as u32 >= self.config.max_revisions {
            self.log.append(
                event.story_id,
                None,
                event_type::STORY_KILLED,
                json!({
                    "reason": "too_many_revisions",
                    "last_feedback": payload.get("feedback").cloned().unwrap_or(serde_json::Value::Null),
                }),
            )?;
            return Ok(());
        }
        let priority = payload.get("priority").and_then(serde_json::Value::as_i64).unwrap_or(7) as i32;
        self.tasks.create(NewTask {
            story_id: event.story_id,
            stage: Stage::Edit,
            priority,
            input: json!({
                "draft": payload.get("draft").cloned().unwrap_or(serde_json::Value::Null),
                "feedback": payload.get("feedback").cloned().unwrap_or(serde_json::Value::Null),
                "revision_number": revision_count + 1,
            }),
            deadline: None,
        })?;
        report.tasks_created += 1;
        Ok(())
    }

    /// Runs [`Self::sweep_once`] on a fixed interval until `stop` is set,
    /// sleeping `poll_interval` between sweeps (spec §4.8 "Orchestrator main
    /// loop").
    pub fn run(&self, poll_interval: std::time::Duration, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            let now = Timestamp::now();
            if let Err(err) = self.sweep_once(now) {
                tracing::warn!(error = %err, "chief sweep failed");
            }
            std::thread::sleep(poll_interval);
        }
    }
}

fn field_str(payload: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
    payload.get(key).and_then(serde_json::Value::as_str).unwrap_or_default().to_owned()
}

fn field_str_array(payload: &serde_json::Map<String, serde_json::Value>, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(serde_json::Value::as_array)
        .map(|values| values.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
        .unwrap_or_default()
}
