// pressline-channels/src/composite.rs
// ============================================================================
// Module: Composite Publisher
// Description: Wires named channels behind one `publish` entry point.
// Purpose: Implement the `publish` task's fan-out-and-collect contract
//          (spec §4 stage table: `publish` output carries one result per
//          requested channel plus a `success_count`).
// Dependencies: pressline-core, std
// ============================================================================

//! ## Overview
//! [`CompositePublisher`] holds a registry of named [`Channel`] implementations
//! and delivers one article to every channel named in a `publish` task's
//! input. Unlike a single-sink dispatcher, a composite publisher never fails
//! closed on one channel's error: every requested channel is attempted and
//! its outcome recorded, matching spec.md's `publish` output shape
//! (`results: { <channel>: { success, ... } }, success_count`).
//!
//! Invariants:
//! - Channel names are unique within the registry; later registrations
//!   overwrite earlier ones.
//! - A channel named in the request but not registered is recorded as a
//!   failed result rather than aborting the whole publish.

use std::collections::BTreeMap;
use std::sync::Arc;

use pressline_core::core::Article;

use crate::channel::Channel;
use crate::channel::ChannelError;

/// The outcome of delivering (or failing to deliver) to one requested channel.
#[derive(Debug, Clone)]
pub struct ChannelOutcome {
    /// Whether delivery succeeded.
    pub success: bool,
    /// The dispatch ID on success, or a description of the failure.
    pub detail: String,
}

/// The full result of one `publish` call across every requested channel.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Per-channel outcome, keyed by channel name.
    pub results: BTreeMap<String, ChannelOutcome>,
    /// Count of channels that succeeded.
    pub success_count: usize,
}

/// Builder for a [`CompositePublisher`].
#[derive(Default)]
pub struct CompositePublisherBuilder {
    /// Channel registry keyed by name.
    channels: BTreeMap<String, Arc<dyn Channel>>,
}

impl CompositePublisherBuilder {
    /// Registers a channel under `name`.
    #[must_use]
    pub fn channel(mut self, name: impl Into<String>, channel: impl Channel + 'static) -> Self {
        self.channels.insert(name.into(), Arc::new(channel));
        self
    }

    /// Builds the composite publisher.
    #[must_use]
    pub fn build(self) -> CompositePublisher {
        CompositePublisher { channels: self.channels }
    }
}

/// Delivers articles to any number of named channels.
pub struct CompositePublisher {
    /// Channel registry keyed by name.
    channels: BTreeMap<String, Arc<dyn Channel>>,
}

impl CompositePublisher {
    /// Returns a builder for a composite publisher.
    #[must_use]
    pub fn builder() -> CompositePublisherBuilder {
        CompositePublisherBuilder::default()
    }

    /// Delivers `article` to every channel named in `channel_names`.
    ///
    /// Every requested channel is attempted regardless of earlier failures;
    /// an unregistered name is recorded as a failure rather than rejected up
    /// front, so one misconfigured channel in the list never blocks delivery
    /// to the others.
    #[must_use]
    pub fn publish(&self, article: &Article, channel_names: &[String]) -> PublishOutcome {
        let mut results = BTreeMap::new();
        let mut success_count = 0;
        for name in channel_names {
            let outcome = match self.channels.get(name) {
                Some(channel) => match channel.deliver(article) {
                    Ok(receipt) => {
                        success_count += 1;
                        ChannelOutcome { success: true, detail: receipt.dispatch_id }
                    }
                    Err(err) => ChannelOutcome { success: false, detail: err.to_string() },
                },
                None => {
                    let err = ChannelError::DeliveryFailed(format!("unknown channel: {name}"));
                    ChannelOutcome { success: false, detail: err.to_string() }
                }
            };
            results.insert(name.clone(), outcome);
        }
        PublishOutcome { results, success_count }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "test assertions favor clarity over production error handling"
)]
mod tests {
    use std::sync::Mutex;

    use pressline_core::core::ArticleId;
    use pressline_core::core::StoryId;
    use pressline_core::core::Timestamp;

    use super::*;
    use crate::channel::ChannelReceipt;

    struct RecordingChannel {
        name: &'static str,
        fail: bool,
        calls: Mutex<usize>,
    }

    impl Channel for RecordingChannel {
        fn deliver(&self, _article: &Article) -> Result<ChannelReceipt, ChannelError> {
            *self.calls.lock().expect("mutex poisoned") += 1;
            if self.fail {
                return Err(ChannelError::DeliveryFailed("boom".to_owned()));
            }
            Ok(ChannelReceipt {
                channel: self.name.to_owned(),
                dispatch_id: format!("{}-1", self.name),
                delivered_at: Timestamp::now(),
            })
        }
    }

    fn sample_article() -> Article {
        let now = Timestamp::now();
        Article {
            article_id: ArticleId::new(),
            story_id: StoryId::new(),
            headline: "Headline".to_owned(),
            body: "Body".to_owned(),
            byline: "Staff".to_owned(),
            summary: "Summary".to_owned(),
            sources: vec!["https://example.com".to_owned()],
            entities: vec![],
            tags: vec![],
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn publish_attempts_every_requested_channel_even_after_a_failure() {
        let publisher = CompositePublisher::builder()
            .channel("rss", RecordingChannel { name: "rss", fail: true, calls: Mutex::new(0) })
            .channel("log", RecordingChannel { name: "log", fail: false, calls: Mutex::new(0) })
            .build();

        let article = sample_article();
        let names = vec!["rss".to_owned(), "log".to_owned()];
        let outcome = publisher.publish(&article, &names);

        assert_eq!(outcome.success_count, 1);
        assert!(!outcome.results["rss"].success);
        assert!(outcome.results["log"].success);
    }

    #[test]
    fn publish_records_unregistered_channels_as_failures() {
        let publisher = CompositePublisher::builder().build();
        let article = sample_article();
        let names = vec!["nowhere".to_owned()];
        let outcome = publisher.publish(&article, &names);

        assert_eq!(outcome.success_count, 0);
        assert!(!outcome.results["nowhere"].success);
    }
}
