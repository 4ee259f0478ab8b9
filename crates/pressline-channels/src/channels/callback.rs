// pressline-channels/src/channels/callback.rs
// ============================================================================
// Module: Callback Channel
// Description: Channel that invokes a user-supplied closure.
// Purpose: Let callers (and tests) observe or simulate delivery without a
//          real transport.
// Dependencies: pressline-core, std
// ============================================================================

//! ## Overview
//! [`CallbackChannel`] delivers by invoking a handler closure and returning
//! whatever it returns. It carries no transport of its own.

use std::sync::Arc;

use pressline_core::core::Article;

use crate::channel::Channel;
use crate::channel::ChannelError;
use crate::channel::ChannelReceipt;

/// Handler signature invoked by [`CallbackChannel`].
type Handler = dyn Fn(&Article) -> Result<ChannelReceipt, ChannelError> + Send + Sync;

/// Callback-based delivery channel.
#[derive(Clone)]
pub struct CallbackChannel {
    handler: Arc<Handler>,
}

impl CallbackChannel {
    /// Creates a callback channel from a handler closure.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Article) -> Result<ChannelReceipt, ChannelError> + Send + Sync + 'static,
    {
        Self { handler: Arc::new(handler) }
    }
}

impl Channel for CallbackChannel {
    fn deliver(&self, article: &Article) -> Result<ChannelReceipt, ChannelError> {
        (self.handler)(article)
    }
}
