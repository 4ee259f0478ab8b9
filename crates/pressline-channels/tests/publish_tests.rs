// pressline-channels/tests/publish_tests.rs
// ============================================================================
// Module: Publish Integration Tests
// Description: End-to-end coverage of CompositePublisher across multiple
//              channel kinds.
// Purpose: Exercise the `publish` task's fan-out-and-collect contract the way
//          the Chief actually drives it.
// Dependencies: pressline-channels
// ============================================================================

//! ## Overview
//! Drives [`pressline_channels::CompositePublisher`] the way the Chief's
//! `publish` stage handler does: build once from configured channels, deliver
//! one article, inspect the per-channel results.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use pressline_channels::CallbackChannel;
use pressline_channels::ChannelError;
use pressline_channels::ChannelReceipt;
use pressline_channels::CompositePublisher;
use pressline_channels::LogChannel;
use pressline_core::core::Article;
use pressline_core::core::ArticleId;
use pressline_core::core::StoryId;
use pressline_core::core::Timestamp;

fn sample_article() -> Article {
    let now = Timestamp::now();
    Article {
        article_id: ArticleId::new(),
        story_id: StoryId::new(),
        headline: "Local council approves new park".to_owned(),
        body: "The council voted 5-2 to fund the park renovation.".to_owned(),
        byline: "Staff Reporter".to_owned(),
        summary: "Council approves park renovation funding.".to_owned(),
        sources: vec!["https://example.com/minutes".to_owned()],
        entities: vec!["City Council".to_owned()],
        tags: vec!["local".to_owned()],
        metadata: serde_json::json!({}),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn publish_delivers_to_every_configured_channel() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_handle = Arc::clone(&calls);
    let callback = CallbackChannel::new(move |article: &Article| {
        calls_handle.fetch_add(1, Ordering::SeqCst);
        Ok(ChannelReceipt {
            channel: "callback".to_owned(),
            dispatch_id: format!("callback-{}", article.article_id),
            delivered_at: Timestamp::now(),
        })
    });

    let publisher = CompositePublisher::builder()
        .channel("log", LogChannel::new())
        .channel("callback", callback)
        .build();

    let article = sample_article();
    let names = vec!["log".to_owned(), "callback".to_owned()];
    let outcome = publisher.publish(&article, &names);

    assert_eq!(outcome.success_count, 2);
    assert!(outcome.results["log"].success);
    assert!(outcome.results["callback"].success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn publish_partially_succeeds_when_one_channel_rejects() {
    let rejecting = CallbackChannel::new(|_article: &Article| {
        Err(ChannelError::Rejected("destination offline".to_owned()))
    });

    let publisher =
        CompositePublisher::builder().channel("log", LogChannel::new()).channel("rejecting", rejecting).build();

    let article = sample_article();
    let names = vec!["log".to_owned(), "rejecting".to_owned()];
    let outcome = publisher.publish(&article, &names);

    assert_eq!(outcome.success_count, 1);
    assert!(outcome.results["log"].success);
    assert!(!outcome.results["rejecting"].success);
}
