// pressline-channels/src/channels/mod.rs
// ============================================================================
// Module: Channel Implementations
// Description: Concrete `Channel` implementations shipped with this crate.
// Purpose: Cover the channels the `publish` task needs out of the box; wire
//          formats beyond the JSON article payload are out of scope (spec.md
//          Non-goals: "channel-specific publishing (RSS feed XML, email,
//          social posting)").
// Dependencies: pressline-core, reqwest, tracing
// ============================================================================

pub mod callback;
pub mod log;
pub mod webhook;

pub use callback::CallbackChannel;
pub use log::LogChannel;
pub use webhook::WebhookChannel;
