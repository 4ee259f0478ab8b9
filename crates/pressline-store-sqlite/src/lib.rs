// pressline-store-sqlite/src/lib.rs
// ============================================================================
// Crate: pressline-store-sqlite
// Description: SQLite-backed implementation of every `pressline-core`
//              storage trait, behind a single-writer/multi-reader split.
// ============================================================================

//! ## Overview
//! [`SqliteStore`] is the one concrete backend shipped with this repo,
//! implementing [`pressline_core::interfaces::EventLog`],
//! [`pressline_core::interfaces::TaskQueue`],
//! [`pressline_core::interfaces::MemoryStore`],
//! [`pressline_core::interfaces::ArticleStore`],
//! [`pressline_core::interfaces::HumanOversightStore`], and
//! [`pressline_core::interfaces::AgentRegistry`] over one SQLite file.
//!
//! Writes are serialized through a single background thread ([`writer::WriteGateway`]);
//! reads round-robin a small pool of read-only connections. This mirrors
//! SQLite's own single-writer model rather than fighting it with external
//! locking.

mod convert;
mod error;
mod schema;
mod store;
mod writer;

pub use error::SqliteStoreError;
pub use store::SqliteStore;
pub use store::SqliteStoreConfig;
