// pressline-channels/src/channel.rs
// ============================================================================
// Module: Channel
// Description: The delivery trait every publish channel implements, plus its
//              error and receipt types.
// Purpose: Let the `publish` task target any number of named channels behind
//          one interface, independent of wire format (spec §6 "channels").
// Dependencies: pressline-core, thiserror
// ============================================================================

//! ## Overview
//! A [`Channel`] delivers a finished [`pressline_core::core::Article`] to one
//! external destination (a webhook, a log sink, a test callback) and returns a
//! [`ChannelReceipt`] recording that the delivery happened. Channels never
//! mutate the article; they only observe it.
//!
//! Invariants:
//! - A receipt is returned only after delivery succeeds.
//! - A failed delivery must not yield a receipt.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use pressline_core::core::Article;
use pressline_core::core::Timestamp;

/// Errors a channel can report when delivering an article.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel's transport (HTTP, filesystem, ...) failed.
    #[error("channel delivery failed: {0}")]
    DeliveryFailed(String),
    /// The destination responded but rejected the delivery.
    #[error("channel rejected delivery: {0}")]
    Rejected(String),
}

/// Proof that a channel delivered an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReceipt {
    /// Name of the channel that produced this receipt.
    pub channel: String,
    /// Dispatcher-assigned identifier, unique per delivery.
    pub dispatch_id: String,
    /// When the delivery completed.
    pub delivered_at: Timestamp,
}

/// Delivers articles to one external destination.
pub trait Channel: Send + Sync {
    /// Delivers `article` to this channel's destination.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when delivery fails or is rejected.
    fn deliver(&self, article: &Article) -> Result<ChannelReceipt, ChannelError>;
}

/// Builds deterministic dispatch IDs for a channel's deliveries.
#[derive(Debug)]
pub(crate) struct ReceiptFactory {
    /// Channel name embedded in every receipt.
    channel: String,
    /// Monotonic counter used for deterministic IDs.
    counter: AtomicU64,
}

impl ReceiptFactory {
    /// Creates a receipt factory for the named channel.
    pub(crate) fn new(channel: impl Into<String>) -> Self {
        Self { channel: channel.into(), counter: AtomicU64::new(0) }
    }

    /// Returns the next receipt for this channel.
    pub(crate) fn next(&self) -> ChannelReceipt {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        ChannelReceipt {
            channel: self.channel.clone(),
            dispatch_id: format!("{}-{seq}", self.channel),
            delivered_at: Timestamp::now(),
        }
    }
}
