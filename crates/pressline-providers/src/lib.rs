// pressline-providers/src/lib.rs
// ============================================================================
// Crate: pressline-providers
// Description: Concrete implementations of `pressline-core::interfaces`'s
//              provider traits (spec §6 "External Interfaces").
// Purpose: Give the runtime real HTTP-backed embedding, search, chat, and
//          feed-reader clients, plus deterministic fakes for tests.
// ============================================================================

//! ## Overview
//! Every provider ships two implementations: an `Http*` client that speaks
//! a simple JSON (or, for feeds, RSS/Atom XML) protocol over blocking
//! `reqwest`, and a deterministic `Fake*`/`Static*` double with no network
//! access, for use in tests and the demo CLI profile.

pub mod chat;
pub mod embedding;
pub mod feed;
pub mod search;

pub use chat::FakeChatProvider;
pub use chat::HttpChatProvider;
pub use embedding::FakeEmbeddingProvider;
pub use embedding::HttpEmbeddingProvider;
pub use feed::HttpFeedReader;
pub use feed::StaticFeedReader;
pub use search::FakeSearchProvider;
pub use search::HttpSearchProvider;
