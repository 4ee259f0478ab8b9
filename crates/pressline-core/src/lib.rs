// pressline-core/src/lib.rs
// ============================================================================
// Crate: pressline-core
// Description: Domain types, backend-agnostic trait interfaces, and the
//              orchestrator/ingestion/worker runtime for the Pressline
//              newsroom coordination pipeline.
// ============================================================================

//! ## Overview
//! `pressline-core` has three layers, each depending only on the one below
//! it:
//!
//! - [`core`] — plain data: events, tasks, agents, memory items, articles,
//!   human oversight records, and the identifiers that tie them together.
//! - [`interfaces`] — the traits a storage backend or external service must
//!   satisfy: [`interfaces::EventLog`], [`interfaces::TaskQueue`],
//!   [`interfaces::MemoryStore`], [`interfaces::ArticleStore`],
//!   [`interfaces::HumanOversightStore`], [`interfaces::AgentRegistry`], and
//!   the provider traits in [`interfaces::providers`].
//! - [`runtime`] — the executable loops built on those traits:
//!   [`runtime::Chief`] (orchestrator), [`runtime::ScoutLoop`] (ingestion),
//!   and [`runtime::AgentRuntime`] (generic role worker), plus
//!   [`runtime::InMemoryStore`], a fixture backend implementing every trait.
//!
//! Concrete backends (`pressline-store-sqlite`), external service clients
//! (`pressline-providers`), and the CLI (`pressline-cli`) depend on this
//! crate but never the reverse.

pub mod core;
pub mod interfaces;
pub mod runtime;
