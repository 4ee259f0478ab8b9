// pressline-channels/src/lib.rs
// ============================================================================
// Crate: pressline-channels
// Description: Composite publish dispatcher wiring named delivery channels
//              behind the `publish` task (spec.md §4 stage table; SPEC_FULL.md
//              §2 crate table).
// ============================================================================

//! ## Overview
//! The `publish` task's job is to deliver a finished article to every channel
//! named in its input and report one outcome per channel. This crate defines
//! the [`Channel`] trait every delivery mechanism implements, ships three
//! ([`LogChannel`], [`WebhookChannel`], [`CallbackChannel`]), and composes
//! them behind [`CompositePublisher`], which the Chief's `publish` stage
//! handler builds once at startup from `pressline-config`'s channel list.
//!
//! Wire formats for specific destinations (RSS XML, email, social posting)
//! are explicitly out of scope (spec.md Non-goals); this crate only carries
//! the dispatch plumbing, matching the teacher's `decision-gate-broker`
//! split between a generic `Sink` trait and the policy concerns layered on
//! top of it.

mod channel;
mod channels;
mod composite;

pub use channel::Channel;
pub use channel::ChannelError;
pub use channel::ChannelReceipt;
pub use channels::CallbackChannel;
pub use channels::LogChannel;
pub use channels::WebhookChannel;
pub use composite::ChannelOutcome;
pub use composite::CompositePublisher;
pub use composite::CompositePublisherBuilder;
pub use composite::PublishOutcome;
