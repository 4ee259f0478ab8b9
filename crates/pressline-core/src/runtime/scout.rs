// pressline-core/src/runtime/scout.rs
// ============================================================================
// Module: Scout
// Description: The ingestion loop that scans feeds and detects candidate
//              stories (spec §4.7 "Scout").
// Purpose: Score freshly fetched feed entries, drop near-duplicates of
//          already-known stories, and emit `story.detected` events for the
//          Chief to admit or reject.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The newsworthiness formula and its weights are carried over verbatim from
//! the prototype (spec §4.7): presence of a title and summary, recency,
//! presence of a link, and summary length each contribute, capped at `1.0`.
//! It is exposed as a pluggable [`ScoreFn`] so a different weighting can be
//! swapped in without touching the scan loop.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde_json::json;
use time::Date;
use time::OffsetDateTime;

use crate::core::MemoryType;
use crate::core::StoryId;
use crate::core::event_type;
use crate::interfaces::EmbeddingError;
use crate::interfaces::EmbeddingProvider;
use crate::interfaces::EventLogError;
use crate::interfaces::FeedEntry;
use crate::interfaces::FeedError;
use crate::interfaces::FeedReader;
use crate::interfaces::MemoryStoreError;
use crate::interfaces::{EventLog, MemoryStore};

/// Failure modes of a [`ScoutLoop`] scan.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// The feed could not be fetched or parsed.
    #[error("scout: feed failure: {0}")]
    Feed(#[from] FeedError),
    /// The embedding provider failed.
    #[error("scout: embedding failure: {0}")]
    Embedding(#[from] EmbeddingError),
    /// The memory store failed.
    #[error("scout: memory store failure: {0}")]
    Memory(#[from] MemoryStoreError),
    /// The event log failed.
    #[error("scout: event log failure: {0}")]
    EventLog(#[from] EventLogError),
}

/// Pluggable newsworthiness scoring function, `[0.0, 1.0]`.
pub type ScoreFn = Arc<dyn Fn(&FeedEntry) -> f32 + Send + Sync>;

/// The prototype's scoring formula, carried over verbatim (spec §4.7):
/// `+0.3` for a title and summary both present, `+0.2` for recency (an entry
/// published within the last 24 hours), `+0.2` for a link, and `+0.2` for a
/// summary longer than 200 characters, capped at `1.0`.
#[must_use]
pub fn default_newsworthiness_score(entry: &FeedEntry) -> f32 {
    let mut score = 0.0_f32;
    if entry.title.as_ref().is_some_and(|t| !t.is_empty()) && entry.summary.as_ref().is_some_and(|s| !s.is_empty()) {
        score += 0.3;
    }
    if let Some(published_at) = entry.published_at {
        let age = published_at.as_offset().max(OffsetDateTime::UNIX_EPOCH);
        if OffsetDateTime::now_utc() - age < time::Duration::hours(24) {
            score += 0.2;
        }
    }
    if entry.link.is_some() {
        score += 0.2;
    }
    if entry.summary.as_ref().is_some_and(|s| s.len() > 200) {
        score += 0.2;
    }
    score.min(1.0)
}

/// Tunables for one [`ScoutLoop`] instance (spec §4.7, §6 config keys).
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Minimum score to emit a detection at all (entries below this are
    /// dropped silently, never logged).
    pub detection_floor: f32,
    /// Cosine-similarity threshold above which a candidate is treated as a
    /// duplicate of an already-known story and dropped.
    pub dedup_threshold: f32,
    /// Soft daily cap on detections emitted, reset at UTC midnight
    /// (supplemental; spec §9 does not name this but the prototype's
    /// `max_stories_per_day` setting is carried over as an ambient guard
    /// against a noisy feed flooding the queue).
    pub max_detections_per_day: usize,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self { detection_floor: 0.0, dedup_threshold: 0.85, max_detections_per_day: 20 }
    }
}

/// The ingestion loop (spec §3 "Scout", §4.7).
pub struct ScoutLoop {
    log: Arc<dyn EventLog>,
    memory: Arc<dyn MemoryStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    feeds: Arc<dyn FeedReader>,
    config: ScoutConfig,
    score_fn: ScoreFn,
    daily_counter: Mutex<(Date, usize)>,
}

impl ScoutLoop {
    /// Builds a `ScoutLoop` using [`default_newsworthiness_score`].
    #[must_use]
    pub fn new(
        log: Arc<dyn EventLog>,
        memory: Arc<dyn MemoryStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        feeds: Arc<dyn FeedReader>,
        config: ScoutConfig,
    ) -> Self {
        Self::with_score_fn(log, memory, embeddings, feeds, config, Arc::new(default_newsworthiness_score))
    }

    /// Builds a `ScoutLoop` with a custom scoring function.
    #[must_use]
    pub fn with_score_fn(
        log: Arc<dyn EventLog>,
        memory: Arc<dyn MemoryStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        feeds: Arc<dyn FeedReader>,
        config: ScoutConfig,
        score_fn: ScoreFn,
    ) -> Self {
        let today = OffsetDateTime::now_utc().date();
        Self { log, memory, embeddings, feeds, config, score_fn, daily_counter: Mutex::new((today, 0)) }
    }

    /// Fetches `feed_url`, scores every entry, and emits a `story.detected`
    /// event for each candidate at or above [`ScoutConfig::detection_floor`],
    /// up to the daily cap (spec §4.7 step 5). A candidate whose embedding
    /// matches an existing story at or above [`ScoutConfig::dedup_threshold`]
    /// is emitted with `is_duplicate: true` against that story's id and is
    /// not added to memory; a genuinely new candidate is emitted with
    /// `is_duplicate: false` and its embedding is stored via
    /// [`MemoryStore::add`](crate::interfaces::MemoryStore::add) so later
    /// candidates can be deduplicated against it. Returns the number of
    /// detections emitted.
    ///
    /// # Errors
    /// Returns [`ScoutError`] if the feed, embedding provider, memory store,
    /// or event log fail.
    pub fn scan_feed(&self, feed_url: &str) -> Result<usize, ScoutError> {
        let entries = self.feeds.fetch(feed_url)?;
        let mut emitted = 0;
        for entry in &entries {
            if !self.take_daily_budget() {
                break;
            }
            let score = (self.score_fn)(entry);
            if score < self.config.detection_floor {
                continue;
            }

            let content = format!(
                "{} {}",
                entry.title.as_deref().unwrap_or_default(),
                entry.summary.as_deref().unwrap_or_default()
            );
            let embedding = self.embeddings.embed(&content)?;
            let similar = self.memory.find_similar(&embedding, self.config.dedup_threshold, 1)?;

            if let Some(existing) = similar.first() {
                self.log.append(
                    existing.story_id,
                    None,
                    event_type::STORY_DETECTED,
                    json!({
                        "title": entry.title,
                        "summary": entry.summary,
                        "link": entry.link,
                        "score": score,
                        "is_duplicate": true,
                    }),
                )?;
                emitted += 1;
                continue;
            }

            let story_id = StoryId::new();
            self.log.append(
                story_id,
                None,
                event_type::STORY_DETECTED,
                json!({
                    "title": entry.title,
                    "summary": entry.summary,
                    "link": entry.link,
                    "score": score,
                    "is_duplicate": false,
                }),
            )?;
            self.memory.add(story_id, &content, embedding, MemoryType::Summary, json!({}))?;
            emitted += 1;
        }
        Ok(emitted)
    }

    fn take_daily_budget(&self) -> bool {
        let mut guard = self.daily_counter.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let today = OffsetDateTime::now_utc().date();
        if guard.0 != today {
            *guard = (today, 0);
        }
        if guard.1 >= self.config.max_detections_per_day {
            return false;
        }
        guard.1 += 1;
        true
    }

    /// Scans every feed in `feed_urls` on a fixed interval until `stop` is
    /// set (spec §4.7 "Scout main loop"). A failed scan of one feed logs a
    /// warning and the loop continues with the next feed.
    pub fn run(&self, feed_urls: &[String], poll_interval: std::time::Duration, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            for feed_url in feed_urls {
                if let Err(err) = self.scan_feed(feed_url) {
                    tracing::warn!(feed = %feed_url, error = %err, "scout scan failed");
                }
            }
            std::thread::sleep(poll_interval);
        }
    }
}
