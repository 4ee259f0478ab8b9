// pressline-channels/src/channels/log.rs
// ============================================================================
// Module: Log Channel
// Description: Channel that records a structured log line instead of
//              dispatching to an external system.
// Purpose: Give every deployment a zero-configuration default channel and a
//          deterministic channel for tests.
// Dependencies: pressline-core, tracing
// ============================================================================

//! ## Overview
//! [`LogChannel`] emits one `tracing` event per delivery and always succeeds.
//! It does not reach any external system, so it is the channel every article
//! can safely target even before real channels are configured.

use pressline_core::core::Article;

use crate::channel::Channel;
use crate::channel::ChannelError;
use crate::channel::ChannelReceipt;
use crate::channel::ReceiptFactory;

/// Log-only delivery channel.
pub struct LogChannel {
    receipts: ReceiptFactory,
}

impl LogChannel {
    /// Creates a log channel named `log`.
    #[must_use]
    pub fn new() -> Self {
        Self { receipts: ReceiptFactory::new("log") }
    }

    /// Creates a log channel under a custom name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { receipts: ReceiptFactory::new(name) }
    }
}

impl Default for LogChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for LogChannel {
    fn deliver(&self, article: &Article) -> Result<ChannelReceipt, ChannelError> {
        let receipt = self.receipts.next();
        tracing::info!(
            article_id = %article.article_id,
            story_id = %article.story_id,
            dispatch_id = %receipt.dispatch_id,
            headline = %article.headline,
            "article published to log channel",
        );
        Ok(receipt)
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
    use pressline_core::core::ArticleId;
    use pressline_core::core::StoryId;
    use pressline_core::core::Timestamp;

    use super::*;

    #[test]
    fn log_channel_always_succeeds_and_increments_dispatch_ids() {
        let channel = LogChannel::new();
        let now = Timestamp::now();
        let article = Article {
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
        };

        let first = channel.deliver(&article).expect("delivery succeeds");
        let second = channel.deliver(&article).expect("delivery succeeds");
        assert_ne!(first.dispatch_id, second.dispatch_id);
        assert_eq!(first.channel, "log");
    }
}
