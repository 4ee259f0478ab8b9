// pressline-cli/src/handlers.rs
// ============================================================================
// Module: Role task handlers
// Description: The three `TaskHandler` implementations that back the
//              Reporter, Editor, and Publisher role workers.
// Purpose: Give `AgentRuntime` role-specific behavior for research/draft/edit,
//          review, and publish tasks (spec §4.3 stage-advancement table).
// Dependencies: pressline-core, pressline-channels
// ============================================================================

//! ## Overview
//! Pressline has no teacher-side analogue for content generation or
//! editorial review, so the decision thresholds and prompt shapes here are
//! grounded directly on the prototype's `agents/reporter.py` and
//! `agents/editor.py`: a reporter researches by searching for corroborating
//! sources and drafts by asking a [`ChatProvider`] to write the article; an
//! editor analyzes style, verifies claims against search results, and
//! approves only when both a verification score and a style score clear
//! their floors.

use std::sync::Arc;

use pressline_channels::CompositePublisher;
use pressline_core::core::ArticleId;
use pressline_core::core::Stage;
use pressline_core::core::Task;
use pressline_core::interfaces::ArticleStore;
use pressline_core::interfaces::providers::ChatProvider;
use pressline_core::interfaces::providers::SearchProvider;
use pressline_core::runtime::TaskHandler;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

fn str_field(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).and_then(Value::as_str).unwrap_or_default().to_owned()
}

fn str_array_field(object: &Map<String, Value>, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
        .unwrap_or_default()
}

/// Extracts the first top-level JSON object out of `text`, tolerating a
/// chat model's preamble or trailing commentary around the object.
fn extract_json_object(text: &str) -> Value {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end >= start => {
            serde_json::from_str(&text[start..=end]).unwrap_or_else(|_| json!({}))
        }
        _ => json!({}),
    }
}

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Claims `research`, `draft`, and `edit` tasks (spec §4.3, §4.5 role table).
pub struct ReporterHandler {
    search: Arc<dyn SearchProvider>,
    chat: Arc<dyn ChatProvider>,
}

impl ReporterHandler {
    /// Builds a reporter handler from its search and chat dependencies.
    #[must_use]
    pub fn new(search: Arc<dyn SearchProvider>, chat: Arc<dyn ChatProvider>) -> Self {
        Self { search, chat }
    }

    fn research(&self, task: &Task) -> Result<Value, String> {
        let detection = task.input.as_object().cloned().unwrap_or_default();
        let title = str_field(&detection, "title");
        let summary = str_field(&detection, "summary");
        let link = detection.get("link").and_then(Value::as_str).map(str::to_owned);

        let mut sources = Vec::new();
        if let Some(link) = link.clone() {
            sources.push(json!({
                "url": link,
                "title": title,
                "snippet": summary.chars().take(200).collect::<String>(),
                "type": "original",
            }));
        }
        let search_results = self.search.search(&title, 5).map_err(|err| err.to_string())?;
        for result in search_results {
            if Some(result.url.as_str()) == link.as_deref() {
                continue;
            }
            sources.push(json!({
                "url": result.url,
                "title": result.title,
                "snippet": result.snippet.unwrap_or_default(),
                "type": "corroboration",
            }));
        }

        let source_count = sources.len();
        let verified = source_count >= 2;
        let facts = vec![json!({
            "claim": format!("Story about: {title}"),
            "source": link,
            "verified": verified,
            "source_count": source_count,
        })];

        Ok(json!({
            "title": title,
            "summary": summary,
            "link": link,
            "facts": facts,
            "sources": sources,
            "entities": Vec::<String>::new(),
            "verified": verified,
            "source_count": source_count,
            "priority": if verified { 7 } else { 5 },
        }))
    }

    fn draft(&self, task: &Task) -> Result<Value, String> {
        let (revision_number, draft, feedback, research) = match task.stage {
            Stage::Edit => {
                let input = task.input.as_object().cloned().unwrap_or_default();
                let draft = input.get("draft").and_then(Value::as_object).cloned().unwrap_or_default();
                let feedback = input.get("feedback").cloned();
                let revision_number =
                    input.get("revision_number").and_then(Value::as_u64).unwrap_or(1);
                (revision_number, Some(draft), feedback, None)
            }
            _ => (0, None, None, Some(task.input.as_object().cloned().unwrap_or_default())),
        };

        let (title, sources_json, entities, prior_body) = match (&research, &draft) {
            (Some(research), _) => (
                str_field(research, "title"),
                research.get("sources").and_then(Value::as_array).cloned().unwrap_or_default(),
                str_array_field(research, "entities"),
                None,
            ),
            (None, Some(draft)) => (
                str_field(draft, "headline"),
                draft.get("sources").and_then(Value::as_array).cloned().unwrap_or_default(),
                str_array_field(draft, "entities"),
                Some(str_field(draft, "body")),
            ),
            (None, None) => (String::new(), Vec::new(), Vec::new(), None),
        };

        let sources: Vec<String> = sources_json
            .iter()
            .filter_map(|s| s.get("url").and_then(Value::as_str).map(str::to_owned))
            .filter(|url| !url.is_empty())
            .collect();

        let prompt = match &prior_body {
            Some(prior_body) => format!(
                "You are a reporter revising a news article after editorial feedback.\n\n\
                 Headline: {title}\n\nCurrent draft:\n{prior_body}\n\n\
                 Editor feedback:\n{}\n\n\
                 Rewrite the article body addressing the feedback. Keep it factual and 200-400 words.",
                feedback.as_ref().map(|v| v.to_string()).unwrap_or_default(),
            ),
            None => format!(
                "You are a reporter writing a news article.\n\nHeadline: {title}\n\n\
                 Number of independent sources: {}\n\
                 Write a clear, factual news article (200-400 words) based on this information. \
                 Cite sources appropriately. If the story has only one source, note that it is unverified.",
                sources.len(),
            ),
        };

        let body = self.chat.generate(&prompt).map_err(|err| err.to_string())?;
        let word_count = body.split_whitespace().count();
        let summary: String = body.chars().take(200).collect();

        Ok(json!({
            "headline": title,
            "body": body,
            "byline": "Staff",
            "summary": summary,
            "sources": sources,
            "entities": entities,
            "tags": Vec::<String>::new(),
            "word_count": word_count,
            "revision_number": revision_number,
        }))
    }
}

impl TaskHandler for ReporterHandler {
    fn handle(&self, task: &Task) -> Result<Value, String> {
        match task.stage {
            Stage::Research => self.research(task),
            Stage::Draft | Stage::Edit => self.draft(task),
            other => Err(format!("reporter cannot handle stage: {other}")),
        }
    }
}

// ============================================================================
// SECTION: Editor
// ============================================================================

/// Approval thresholds for [`EditorHandler`], grounded on `agents/editor.py`'s
/// `verification_score >= 0.8 and style_score >= 0.7` decision rule.
#[derive(Debug, Clone, Copy)]
pub struct EditorConfig {
    /// Minimum fraction of checked claims that must be search-supported.
    pub verification_floor: f32,
    /// Minimum style score from the chat provider's own analysis.
    pub style_floor: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { verification_floor: 0.8, style_floor: 0.7 }
    }
}

/// Claims `review` tasks (spec §4.3, §4.5 role table).
pub struct EditorHandler {
    search: Arc<dyn SearchProvider>,
    chat: Arc<dyn ChatProvider>,
    config: EditorConfig,
}

impl EditorHandler {
    /// Builds an editor handler from its dependencies and approval
    /// thresholds.
    #[must_use]
    pub fn new(search: Arc<dyn SearchProvider>, chat: Arc<dyn ChatProvider>, config: EditorConfig) -> Self {
        Self { search, chat, config }
    }

    fn analyze_text(&self, article_text: &str) -> Value {
        let prompt = format!(
            "Analyze the following news article draft.\n\nArticle:\n{article_text}\n\n\
             Extract: a list of up to 10 factual claims, a tone assessment \
             (Objective, Biased, Sensationalist, Dry), a list of style issues, \
             and a style score from 0.0 to 1.0.\n\n\
             Return JSON: {{\"claims\": [...], \"tone\": \"...\", \"style_issues\": [...], \"score\": 0.0}}",
        );
        match self.chat.generate(&prompt) {
            Ok(content) => extract_json_object(&content),
            Err(_) => json!({ "claims": [], "tone": "Unknown", "style_issues": [], "score": 0.5 }),
        }
    }

    fn check_claim_support(&self, claim: &str, context: &str) -> Value {
        let prompt = format!(
            "Claim: {claim}\n\nContext:\n{context}\n\n\
             Does the context support the claim? Return JSON: {{\"supported\": true, \"reason\": \"...\"}}",
        );
        match self.chat.generate(&prompt) {
            Ok(content) => extract_json_object(&content),
            Err(_) => json!({ "supported": false, "reason": "verification request failed" }),
        }
    }

    fn verify_claims(&self, claims: &[String]) -> Value {
        let mut details = Map::new();
        let mut verified_count = 0usize;
        let checked = claims.iter().take(5);
        let mut claims_checked = 0usize;
        for claim in checked {
            claims_checked += 1;
            let context = match self.search.search(claim, 3) {
                Ok(results) => results
                    .into_iter()
                    .filter_map(|r| r.snippet)
                    .collect::<Vec<_>>()
                    .join("\n"),
                Err(_) => String::new(),
            };
            let check = self.check_claim_support(claim, &context);
            if check.get("supported").and_then(Value::as_bool).unwrap_or(false) {
                verified_count += 1;
            }
            details.insert(claim.clone(), check);
        }
        json!({
            "claims_checked": claims_checked,
            "verified_count": verified_count,
            "details": Value::Object(details),
        })
    }

    fn review_article(&self, task: &Task) -> Result<Value, String> {
        let draft = task.input.as_object().cloned().unwrap_or_default();
        let body = str_field(&draft, "body");
        let headline = str_field(&draft, "headline");

        let analysis = self.analyze_text(&body);
        let claims = analysis
            .get("claims")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect::<Vec<_>>())
            .unwrap_or_default();
        let verification = self.verify_claims(&claims);

        let style_score = analysis.get("score").and_then(Value::as_f64).unwrap_or(0.5) as f32;
        let claims_checked = verification.get("claims_checked").and_then(Value::as_u64).unwrap_or(0);
        let verified_count = verification.get("verified_count").and_then(Value::as_u64).unwrap_or(0);
        let verification_score =
            if claims_checked > 0 { verified_count as f32 / claims_checked as f32 } else { 1.0 };
        let score = (verification_score * 0.6) + (style_score * 0.4);

        let decision = if verification_score >= self.config.verification_floor
            && style_score >= self.config.style_floor
        {
            "APPROVE"
        } else {
            "REJECT"
        };

        let feedback = format!(
            "Decision: {decision} (score {score:.2}); style {style_score:.2}; \
             verified {verified_count}/{claims_checked} claims; headline \"{headline}\"",
        );

        let mut output = draft.clone();
        output.insert("draft".to_owned(), Value::Object(draft));
        output.insert("decision".to_owned(), json!(decision));
        output.insert("score".to_owned(), json!(score));
        output.insert("verification_score".to_owned(), json!(verification_score));
        output.insert("style_score".to_owned(), json!(style_score));
        output.insert("feedback".to_owned(), json!(feedback));
        output.insert("verification".to_owned(), verification);
        output.insert("analysis".to_owned(), analysis);
        Ok(Value::Object(output))
    }
}

impl TaskHandler for EditorHandler {
    fn handle(&self, task: &Task) -> Result<Value, String> {
        match task.stage {
            Stage::Review => self.review_article(task),
            other => Err(format!("editor cannot handle stage: {other}")),
        }
    }
}

// ============================================================================
// SECTION: Publisher
// ============================================================================

/// Claims `publish` tasks (spec §4.3, §4.5 role table).
pub struct PublisherHandler {
    articles: Arc<dyn ArticleStore>,
    publisher: Arc<CompositePublisher>,
}

impl PublisherHandler {
    /// Builds a publisher handler from the article store and the composite
    /// channel dispatcher.
    #[must_use]
    pub fn new(articles: Arc<dyn ArticleStore>, publisher: Arc<CompositePublisher>) -> Self {
        Self { articles, publisher }
    }

    fn publish(&self, task: &Task) -> Result<Value, String> {
        let input = task.input.as_object().cloned().unwrap_or_default();
        let article_id: ArticleId = input
            .get("article_id")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .ok_or_else(|| "publish task missing article_id".to_owned())?;
        let channels = str_array_field(&input, "channels");

        let article = self
            .articles
            .get(article_id)
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("article {article_id} not found"))?;

        let outcome = self.publisher.publish(&article, &channels);
        let results: Map<String, Value> = outcome
            .results
            .into_iter()
            .map(|(name, result)| (name, json!({ "success": result.success, "detail": result.detail })))
            .collect();

        Ok(json!({
            "article_id": article.article_id,
            "success_count": outcome.success_count,
            "results": Value::Object(results),
        }))
    }
}

impl TaskHandler for PublisherHandler {
    fn handle(&self, task: &Task) -> Result<Value, String> {
        match task.stage {
            Stage::Publish => self.publish(task),
            other => Err(format!("publisher cannot handle stage: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "test-only fixture assertions"
)]
mod tests {
    use pressline_core::core::ArticleId;
    use pressline_core::core::Stage;
    use pressline_core::core::StoryId;
    use pressline_core::core::Timestamp;
    use pressline_core::interfaces::providers::ChatError;
    use pressline_core::interfaces::providers::SearchError;
    use pressline_core::interfaces::providers::SearchResult;
    use pressline_core::runtime::InMemoryStore;
    use pressline_core::interfaces::ArticleStore as _;
    use pressline_core::interfaces::NewArticle;

    use super::*;

    struct StaticChat(String);
    impl ChatProvider for StaticChat {
        fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
            Ok(self.0.clone())
        }
    }

    struct StaticSearch(Vec<SearchResult>);
    impl SearchProvider for StaticSearch {
        fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>, SearchError> {
            Ok(self.0.clone())
        }
    }

    fn task_with(stage: Stage, input: Value) -> Task {
        Task {
            task_id: pressline_core::core::TaskId::new(),
            story_id: StoryId::new(),
            stage,
            status: pressline_core::core::TaskStatus::Active,
            priority: 5,
            assigned_agent: None,
            input,
            output: json!({}),
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            deadline: None,
        }
    }

    #[test]
    fn reporter_research_flags_unverified_single_source_stories() {
        let handler = ReporterHandler::new(
            Arc::new(StaticSearch(vec![])),
            Arc::new(StaticChat("draft body".to_owned())),
        );
        let task = task_with(
            Stage::Research,
            json!({ "title": "t", "summary": "s", "link": "https://example.com/a" }),
        );
        let output = handler.handle(&task).expect("research succeeds");
        assert_eq!(output["verified"], json!(false));
        assert_eq!(output["source_count"], json!(1));
    }

    #[test]
    fn reporter_draft_cites_sources_from_research() {
        let handler = ReporterHandler::new(
            Arc::new(StaticSearch(vec![SearchResult {
                title: "corroborating".to_owned(),
                url: "https://example.com/b".to_owned(),
                snippet: Some("snippet".to_owned()),
            }])),
            Arc::new(StaticChat("Generated article body.".to_owned())),
        );
        let task = task_with(
            Stage::Draft,
            json!({
                "title": "Headline",
                "sources": [{ "url": "https://example.com/a" }, { "url": "https://example.com/b" }],
                "entities": [],
            }),
        );
        let output = handler.handle(&task).expect("draft succeeds");
        assert_eq!(output["headline"], json!("Headline"));
        assert_eq!(output["body"], json!("Generated article body."));
        assert_eq!(output["sources"].as_array().expect("sources array").len(), 2);
    }

    #[test]
    fn editor_approves_when_verification_and_style_clear_their_floors() {
        let handler = EditorHandler::new(
            Arc::new(StaticSearch(vec![SearchResult {
                title: "s".to_owned(),
                url: "https://example.com".to_owned(),
                snippet: Some("supporting context".to_owned()),
            }])),
            Arc::new(StaticChat(
                r#"{"claims": ["claim a"], "tone": "Objective", "style_issues": [], "score": 0.9, "supported": true, "reason": "matches"}"#
                    .to_owned(),
            )),
            EditorConfig::default(),
        );
        let task = task_with(
            Stage::Review,
            json!({ "headline": "H", "body": "B", "sources": ["https://example.com/a"] }),
        );
        let output = handler.handle(&task).expect("review succeeds");
        assert_eq!(output["decision"], json!("APPROVE"));
    }

    #[test]
    fn editor_rejects_when_claims_are_unsupported() {
        let handler = EditorHandler::new(
            Arc::new(StaticSearch(vec![])),
            Arc::new(StaticChat(
                r#"{"claims": ["claim a"], "tone": "Objective", "style_issues": [], "score": 0.9, "supported": false, "reason": "no context"}"#
                    .to_owned(),
            )),
            EditorConfig::default(),
        );
        let task = task_with(Stage::Review, json!({ "headline": "H", "body": "B" }));
        let output = handler.handle(&task).expect("review succeeds");
        assert_eq!(output["decision"], json!("REJECT"));
        assert_eq!(output["draft"]["headline"], json!("H"));
    }

    #[test]
    fn publisher_delivers_to_every_requested_channel() {
        let store = Arc::new(InMemoryStore::new());
        let story_id = StoryId::new();
        let article = store
            .publish(NewArticle {
                story_id,
                headline: "H".to_owned(),
                body: "B".to_owned(),
                byline: "Staff".to_owned(),
                summary: "S".to_owned(),
                sources: vec!["https://example.com".to_owned()],
                entities: vec![],
                tags: vec![],
                metadata: json!({}),
            })
            .expect("publish fixture article");

        let publisher = Arc::new(
            CompositePublisher::builder()
                .channel("log", pressline_channels::LogChannel::new())
                .build(),
        );
        let handler = PublisherHandler::new(store.clone(), publisher);
        let task = task_with(
            Stage::Publish,
            json!({ "article_id": article.article_id, "channels": ["log"] }),
        );
        let output = handler.handle(&task).expect("publish succeeds");
        assert_eq!(output["success_count"], json!(1));
    }

    #[test]
    fn publisher_fails_the_task_when_the_article_is_missing() {
        let store = Arc::new(InMemoryStore::new());
        let publisher = Arc::new(CompositePublisher::builder().build());
        let handler = PublisherHandler::new(store, publisher);
        let task = task_with(
            Stage::Publish,
            json!({ "article_id": ArticleId::new(), "channels": ["log"] }),
        );
        assert!(handler.handle(&task).is_err());
    }
}
