// pressline-core/tests/pipeline_smoke.rs
// ============================================================================
// End-to-end smoke test: a detection sweeps all the way to a published
// article using only the in-memory fixture store (spec §8 scenario S1).
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only fixture assertions."
)]

use std::sync::Arc;

use pressline_core::core::Stage;
use pressline_core::core::StoryId;
use pressline_core::core::Timestamp;
use pressline_core::core::event_type;
use pressline_core::interfaces::AgentRegistry;
use pressline_core::interfaces::ArticleStore;
use pressline_core::interfaces::EventLog;
use pressline_core::interfaces::TaskQueue;
use pressline_core::runtime::Chief;
use pressline_core::runtime::ChiefConfig;
use pressline_core::runtime::InMemoryStore;
use time::Duration as TimeDuration;

#[test]
fn detection_flows_through_to_publication() {
    let store = Arc::new(InMemoryStore::new());
    let chief = Chief::new(
        store.clone() as Arc<dyn EventLog>,
        store.clone() as Arc<dyn TaskQueue>,
        store.clone() as Arc<dyn ArticleStore>,
        store.clone() as Arc<dyn pressline_core::interfaces::HumanOversightStore>,
        ChiefConfig { min_newsworthiness_score: 0.5, ..ChiefConfig::default() },
    );

    let story_id = StoryId::new();
    store
        .append(story_id, None, event_type::STORY_DETECTED, serde_json::json!({ "title": "t", "summary": "s", "score": 0.9 }))
        .unwrap();

    let report = chief.sweep_once(Timestamp::now()).unwrap();
    assert_eq!(report.detections_admitted, 1);
    assert_eq!(report.tasks_created, 1);

    let research_task =
        store.list_for_story(story_id).unwrap().into_iter().find(|t| t.stage == Stage::Research).unwrap();
    let reporter = pressline_core::core::eligible_role(Stage::Research).unwrap();
    store.claim(reporter, pressline_core::core::AgentId::new()).unwrap();
    store.complete(research_task.task_id, serde_json::json!({ "priority": 7 })).unwrap();
    store
        .append(story_id, None, &event_type::task_completed(Stage::Research), serde_json::json!({ "priority": 7 }))
        .unwrap();

    let report = chief.sweep_once(Timestamp::now()).unwrap();
    assert_eq!(report.tasks_created, 1);
    let draft_task = store.list_for_story(story_id).unwrap().into_iter().find(|t| t.stage == Stage::Draft).unwrap();
    store.claim(reporter, pressline_core::core::AgentId::new()).unwrap();
    store.complete(draft_task.task_id, serde_json::json!({})).unwrap();

    store
        .append(
            story_id,
            None,
            &event_type::task_completed(Stage::Draft),
            serde_json::json!({
                "decision": "APPROVE",
                "headline": "Headline",
                "body": "Body text",
                "byline": "Staff",
                "summary": "Summary",
                "sources": ["https://example.com/a"],
            }),
        )
        .unwrap();

    let report = chief.sweep_once(Timestamp::now()).unwrap();
    assert_eq!(report.tasks_created, 1, "review task queued");

    store
        .append(
            story_id,
            None,
            &event_type::task_completed(Stage::Review),
            serde_json::json!({
                "decision": "APPROVE",
                "headline": "Headline",
                "body": "Body text",
                "byline": "Staff",
                "summary": "Summary",
                "sources": ["https://example.com/a"],
            }),
        )
        .unwrap();

    let report = chief.sweep_once(Timestamp::now()).unwrap();
    assert_eq!(report.articles_published, 1);
    let article = store.get_for_story(story_id).unwrap().expect("article published");
    assert_eq!(article.headline, "Headline");
}

#[test]
fn third_rejected_review_kills_the_story_instead_of_requesting_another_edit() {
    let store = Arc::new(InMemoryStore::new());
    let chief = Chief::new(
        store.clone() as Arc<dyn EventLog>,
        store.clone() as Arc<dyn TaskQueue>,
        store.clone() as Arc<dyn ArticleStore>,
        store.clone() as Arc<dyn pressline_core::interfaces::HumanOversightStore>,
        ChiefConfig { max_revisions: 3, ..ChiefConfig::default() },
    );
    let story_id = StoryId::new();

    // Three prior edit-stage tasks already exist for this story (as if three
    // revisions have already been requested).
    for _ in 0..3 {
        store
            .create(pressline_core::core::NewTask {
                story_id,
                stage: Stage::Edit,
                priority: 7,
                input: serde_json::json!({}),
                deadline: None,
            })
            .unwrap();
    }

    store
        .append(
            story_id,
            None,
            &event_type::task_completed(Stage::Review),
            serde_json::json!({ "decision": "REJECT", "feedback": "still not good enough" }),
        )
        .unwrap();

    let report = chief.sweep_once(Timestamp::now()).unwrap();
    assert_eq!(report.tasks_created, 0, "no fourth edit task should be created");
    let events = store.list_for_story(story_id).unwrap();
    assert!(events.iter().any(|e| e.event_type == event_type::STORY_KILLED));
    let tasks = store.list_for_story(story_id).unwrap();
    assert_eq!(tasks.iter().filter(|t| t.stage == Stage::Edit).count(), 3);
}

#[test]
fn replaying_the_same_story_detected_event_does_not_duplicate_the_research_task() {
    let store = Arc::new(InMemoryStore::new());
    let chief = Chief::new(
        store.clone() as Arc<dyn EventLog>,
        store.clone() as Arc<dyn TaskQueue>,
        store.clone() as Arc<dyn ArticleStore>,
        store.clone() as Arc<dyn pressline_core::interfaces::HumanOversightStore>,
        ChiefConfig { min_newsworthiness_score: 0.5, ..ChiefConfig::default() },
    );
    let story_id = StoryId::new();
    store
        .append(story_id, None, event_type::STORY_DETECTED, serde_json::json!({ "title": "t", "summary": "s", "score": 0.9 }))
        .unwrap();

    let first = chief.sweep_once(Timestamp::now()).unwrap();
    assert_eq!(first.tasks_created, 1);

    // A fresh Chief with a reset in-memory cursor simulates a process
    // restart: it re-observes the same event from the start of the log.
    let restarted = Chief::new(
        store.clone() as Arc<dyn EventLog>,
        store.clone() as Arc<dyn TaskQueue>,
        store.clone() as Arc<dyn ArticleStore>,
        store.clone() as Arc<dyn pressline_core::interfaces::HumanOversightStore>,
        ChiefConfig { min_newsworthiness_score: 0.5, ..ChiefConfig::default() },
    );
    let second = restarted.sweep_once(Timestamp::now()).unwrap();
    assert_eq!(second.detections_admitted, 0, "already-admitted detection is not re-admitted");
    assert_eq!(second.tasks_created, 0, "replay must not create a second research task");
    let research_tasks =
        store.list_for_story(story_id).unwrap().into_iter().filter(|t| t.stage == Stage::Research).count();
    assert_eq!(research_tasks, 1);
}

#[test]
fn stalled_active_task_is_recovered_to_pending() {
    let store = Arc::new(InMemoryStore::new());
    let story_id = StoryId::new();
    let task = store
        .create(pressline_core::core::NewTask {
            story_id,
            stage: Stage::Research,
            priority: 5,
            input: serde_json::json!({}),
            deadline: None,
        })
        .unwrap();
    let reporter = pressline_core::core::eligible_role(Stage::Research).unwrap();
    store.claim(reporter, pressline_core::core::AgentId::new()).unwrap();

    let far_future = Timestamp::now().as_offset() + TimeDuration::minutes(31);
    let recovered = store
        .recover_stalled(TimeDuration::minutes(30), Timestamp::from_offset(far_future))
        .unwrap();

    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].task_id, task.task_id);
    let refreshed = store.get(task.task_id).unwrap().expect("task still exists");
    assert_eq!(refreshed.status, pressline_core::core::TaskStatus::Pending);
    assert!(refreshed.assigned_agent.is_none());
    assert!(refreshed.started_at.is_none());
}

#[test]
fn low_score_detection_is_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let chief = Chief::new(
        store.clone() as Arc<dyn EventLog>,
        store.clone() as Arc<dyn TaskQueue>,
        store.clone() as Arc<dyn ArticleStore>,
        store.clone() as Arc<dyn pressline_core::interfaces::HumanOversightStore>,
        ChiefConfig::default(),
    );
    let story_id = StoryId::new();
    store.append(story_id, None, event_type::STORY_DETECTED, serde_json::json!({ "score": 0.1 })).unwrap();
    let report = chief.sweep_once(Timestamp::now()).unwrap();
    assert_eq!(report.detections_rejected, 1);
    assert_eq!(report.detections_admitted, 0);
    let events = store.list_for_story(story_id).unwrap();
    assert!(events.iter().any(|e| e.event_type == event_type::STORY_REJECTED));
}
