// pressline-config/src/lib.rs
// ============================================================================
// Module: Pressline Config Library
// Description: Canonical config model, loading, and validation.
// Purpose: Single source of truth for pressline.toml semantics.
// Dependencies: serde, toml
// ============================================================================

//! ## Overview
//! `pressline-config` defines the canonical configuration model for the
//! Pressline newsroom coordination substrate: recognized keys (spec.md §6
//! "Configuration (recognized keys)"), TOML loading, and fail-closed
//! validation. Every process entry point in `pressline-cli` loads one
//! [`config::PresslineConfig`] at startup and hands its sections to the
//! store, the Chief, and the channel dispatcher.

pub mod config;

pub use config::ConfigError;
pub use config::PresslineConfig;
