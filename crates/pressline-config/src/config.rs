// pressline-config/src/config.rs
// ============================================================================
// Module: Pressline Configuration
// Description: Configuration loading and validation for Pressline.
// Purpose: Provide strict, fail-closed config parsing with sane defaults for
//          every key spec.md §6 recognizes, plus the ambient keys a running
//          deployment needs (store location, default channels, embedding
//          dimension, log level).
// Dependencies: serde, toml, std
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file. Every key is optional and
//! defaults to the value spec.md §6 specifies; an invalid combination (for
//! example a threshold outside `[0, 1]`) fails closed at [`PresslineConfig::load`]
//! rather than silently clamping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "pressline.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "PRESSLINE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length accepted for any path-shaped config value.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Top-Level Configuration
// ============================================================================

/// The full recognized configuration surface (spec.md §6 "Configuration
/// (recognized keys)" plus the ambient keys a running deployment needs).
#[derive(Debug, Clone, Deserialize)]
pub struct PresslineConfig {
    /// Durable-store location and connection pool sizing.
    #[serde(default)]
    pub store: StoreConfig,
    /// Pipeline timing and scoring thresholds.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Governance thresholds not already covered by `pipeline`.
    #[serde(default)]
    pub governance: GovernanceConfig,
    /// Publish-stage defaults.
    #[serde(default)]
    pub publish: PublishConfig,
    /// Embedding model and vector dimension.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Process-wide logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for PresslineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
            governance: GovernanceConfig::default(),
            publish: PublishConfig::default(),
            embedding: EmbeddingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PresslineConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// an explicit `path`, then `PRESSLINE_CONFIG`, then `./pressline.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, is too large,
    /// fails to parse, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_owned()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_owned()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any section is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.pipeline.validate()?;
        self.governance.validate()?;
        self.publish.validate()?;
        self.embedding.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Store Configuration
// ============================================================================

/// Durable-store location and connection pool sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the `SQLite` database file (spec.md §3 "Durable Store").
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Write-lock wait timeout in milliseconds before a writer gives up.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,
    /// Number of pooled read-only connections.
    #[serde(default = "default_read_pool_size")]
    pub read_pool_size: usize,
    /// Bounded capacity of the write-gateway command queue.
    #[serde(default = "default_writer_queue_capacity")]
    pub writer_queue_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            read_pool_size: default_read_pool_size(),
            writer_queue_capacity: default_writer_queue_capacity(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("store.path", &self.path.to_string_lossy())?;
        if self.read_pool_size == 0 {
            return Err(ConfigError::Invalid("store.read_pool_size must be > 0".to_owned()));
        }
        if self.writer_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "store.writer_queue_capacity must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Pipeline Configuration
// ============================================================================

/// Pipeline timing and scoring thresholds (spec.md §6 "Configuration
/// (recognized keys)").
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Minimum newsworthiness score for a detection to be admitted
    /// (spec.md §4.2 "Scout"). Below this, the story is rejected.
    #[serde(default = "default_min_newsworthiness_score")]
    pub min_newsworthiness_score: f64,
    /// Scout's own pre-filter threshold before emitting `story.detected`.
    #[serde(default = "default_scout_score_threshold")]
    pub scout_score_threshold: f64,
    /// Cosine similarity at or above which a new detection is treated as a
    /// duplicate of an existing story (spec.md §4.4 "Memory").
    #[serde(default = "default_dedup_similarity_threshold")]
    pub dedup_similarity_threshold: f64,
    /// Seconds an `active` task may run before the recovery sweep reclaims
    /// it as `pending` (spec.md §8 invariant 7 "Stalled-task recovery").
    #[serde(default = "default_stalled_lease_seconds")]
    pub stalled_lease_seconds: u64,
    /// Seconds between an agent's task-queue polls.
    #[serde(default = "default_task_poll_interval_seconds")]
    pub task_poll_interval_seconds: u64,
    /// Seconds between agent heartbeats.
    #[serde(default = "default_agent_heartbeat_interval_seconds")]
    pub agent_heartbeat_interval_seconds: u64,
    /// Maximum number of `edit` stage tasks a story may accumulate
    /// (spec.md §8 invariant 4 "Revision bound") before it is killed.
    #[serde(default = "default_max_revisions")]
    pub max_revisions: u32,
    /// Maximum number of agent processes the deployment expects to run
    /// concurrently; used to size worker pools, not enforced as a hard cap.
    #[serde(default = "default_max_concurrent_agents")]
    pub max_concurrent_agents: usize,
    /// Seconds between Chief sweeps (stalled-task recovery, feed polling).
    #[serde(default = "default_scan_interval_seconds")]
    pub scan_interval_seconds: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_newsworthiness_score: default_min_newsworthiness_score(),
            scout_score_threshold: default_scout_score_threshold(),
            dedup_similarity_threshold: default_dedup_similarity_threshold(),
            stalled_lease_seconds: default_stalled_lease_seconds(),
            task_poll_interval_seconds: default_task_poll_interval_seconds(),
            agent_heartbeat_interval_seconds: default_agent_heartbeat_interval_seconds(),
            max_revisions: default_max_revisions(),
            max_concurrent_agents: default_max_concurrent_agents(),
            scan_interval_seconds: default_scan_interval_seconds(),
        }
    }
}

impl PipelineConfig {
    /// Validates pipeline configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_unit_interval("pipeline.min_newsworthiness_score", self.min_newsworthiness_score)?;
        validate_unit_interval("pipeline.scout_score_threshold", self.scout_score_threshold)?;
        validate_unit_interval(
            "pipeline.dedup_similarity_threshold",
            self.dedup_similarity_threshold,
        )?;
        if self.stalled_lease_seconds == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.stalled_lease_seconds must be > 0".to_owned(),
            ));
        }
        if self.task_poll_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.task_poll_interval_seconds must be > 0".to_owned(),
            ));
        }
        if self.agent_heartbeat_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.agent_heartbeat_interval_seconds must be > 0".to_owned(),
            ));
        }
        if self.stalled_lease_seconds <= self.task_poll_interval_seconds {
            return Err(ConfigError::Invalid(
                "pipeline.stalled_lease_seconds must exceed task_poll_interval_seconds, or a \
                 task still in flight would be reclaimed before its own worker could complete it"
                    .to_owned(),
            ));
        }
        if self.max_concurrent_agents == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_concurrent_agents must be > 0".to_owned(),
            ));
        }
        if self.scan_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.scan_interval_seconds must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Governance Configuration
// ============================================================================

/// Governance thresholds supplementing the pipeline's scoring knobs
/// (original_source `config/settings.py`'s `min_sources_required` and
/// `max_stories_per_day`, renamed here to avoid colliding with spec.md's
/// own `Task`/`Story` vocabulary).
#[derive(Debug, Clone, Deserialize)]
pub struct GovernanceConfig {
    /// Minimum distinct sources an article is expected to cite, carried
    /// over from `original_source/config/settings.py`'s
    /// `min_sources_required`. Informational for now: publish is
    /// unconditional on review approval (spec §4.6's stage table), so
    /// nothing currently reads this threshold as a hard gate.
    #[serde(default = "default_min_sources_required")]
    pub min_sources_required: usize,
    /// Soft cap on new detections admitted per day, a defense against a
    /// noisy feed flooding the pipeline.
    #[serde(default = "default_max_detections_per_day")]
    pub max_detections_per_day: u32,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            min_sources_required: default_min_sources_required(),
            max_detections_per_day: default_max_detections_per_day(),
        }
    }
}

impl GovernanceConfig {
    /// Validates governance configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_sources_required == 0 {
            return Err(ConfigError::Invalid(
                "governance.min_sources_required must be > 0".to_owned(),
            ));
        }
        if self.max_detections_per_day == 0 {
            return Err(ConfigError::Invalid(
                "governance.max_detections_per_day must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Publish Configuration
// ============================================================================

/// Publish-stage defaults (spec.md §4 stage table row 3: a `publish` task is
/// created with `{ article_id, channels: default_channels }`).
#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Channel names attached to a `publish` task when none are specified
    /// explicitly.
    #[serde(default = "default_channels")]
    pub default_channels: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self { default_channels: default_channels() }
    }
}

impl PublishConfig {
    /// Validates publish configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_channels.is_empty() {
            return Err(ConfigError::Invalid(
                "publish.default_channels must name at least one channel".to_owned(),
            ));
        }
        for channel in &self.default_channels {
            if channel.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "publish.default_channels entries must be non-empty".to_owned(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Embedding Configuration
// ============================================================================

/// Embedding model and vector dimension (spec.md §3 "Vector dimension is
/// fixed at initialization from the embedding-model configuration").
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Identifier of the embedding model in use.
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Fixed vector dimension produced by `model`.
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { model: default_embedding_model(), dimension: default_embedding_dimension() }
    }
}

impl EmbeddingConfig {
    /// Validates embedding configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.model must be non-empty".to_owned()));
        }
        if self.dimension == 0 {
            return Err(ConfigError::Invalid("embedding.dimension must be > 0".to_owned()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging Configuration
// ============================================================================

/// Process-wide logging configuration, consumed by `pressline-cli` when it
/// installs the `tracing-subscriber` `EnvFilter`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` `EnvFilter` directive, e.g. `"info"` or
    /// `"pressline_core=debug,info"`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_owned()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against a maximum length.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_owned()));
    }
    Ok(())
}

/// Validates a path-shaped config string against a maximum length.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Validates that a score-like value lies in `[0, 1]`.
fn validate_unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!("{field} must be within [0, 1]")));
    }
    Ok(())
}

/// Default `SQLite` database path.
fn default_store_path() -> PathBuf {
    PathBuf::from("pressline.db")
}

/// Default busy-timeout for write-lock waits, in milliseconds.
const fn default_busy_timeout_ms() -> u32 {
    5_000
}

/// Default number of pooled read-only connections.
const fn default_read_pool_size() -> usize {
    4
}

/// Default write-gateway queue capacity.
const fn default_writer_queue_capacity() -> usize {
    256
}

/// Default minimum newsworthiness score (spec.md §6).
const fn default_min_newsworthiness_score() -> f64 {
    0.6
}

/// Default Scout pre-filter threshold (spec.md §6).
const fn default_scout_score_threshold() -> f64 {
    0.6
}

/// Default dedup similarity threshold (spec.md §6).
const fn default_dedup_similarity_threshold() -> f64 {
    0.85
}

/// Default stalled-lease duration in seconds (spec.md §6).
const fn default_stalled_lease_seconds() -> u64 {
    1_800
}

/// Default task poll interval in seconds (spec.md §6).
const fn default_task_poll_interval_seconds() -> u64 {
    5
}

/// Default agent heartbeat interval in seconds (spec.md §6).
const fn default_agent_heartbeat_interval_seconds() -> u64 {
    30
}

/// Default maximum revisions before a story is killed (spec.md §6).
const fn default_max_revisions() -> u32 {
    3
}

/// Default maximum concurrent agents (spec.md §6).
const fn default_max_concurrent_agents() -> usize {
    10
}

/// Default Chief scan interval in seconds (spec.md §6).
const fn default_scan_interval_seconds() -> u64 {
    300
}

/// Default minimum sources required per article.
const fn default_min_sources_required() -> usize {
    1
}

/// Default soft cap on detections admitted per day.
const fn default_max_detections_per_day() -> u32 {
    200
}

/// Default publish channels when none are configured.
fn default_channels() -> Vec<String> {
    vec!["log".to_owned()]
}

/// Default embedding model identifier.
fn default_embedding_model() -> String {
    "BAAI/bge-small-en-v1.5".to_owned()
}

/// Default embedding vector dimension for `default_embedding_model`.
const fn default_embedding_dimension() -> usize {
    384
}

/// Default `tracing-subscriber` `EnvFilter` directive.
fn default_log_level() -> String {
    "info".to_owned()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "test assertions favor clarity over production error handling"
)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn defaults_match_spec_recognized_keys() {
        let config = PresslineConfig::default();
        assert!((config.pipeline.min_newsworthiness_score - 0.6).abs() < f64::EPSILON);
        assert!((config.pipeline.scout_score_threshold - 0.6).abs() < f64::EPSILON);
        assert!((config.pipeline.dedup_similarity_threshold - 0.85).abs() < f64::EPSILON);
        assert_eq!(config.pipeline.stalled_lease_seconds, 1_800);
        assert_eq!(config.pipeline.task_poll_interval_seconds, 5);
        assert_eq!(config.pipeline.agent_heartbeat_interval_seconds, 30);
        assert_eq!(config.pipeline.max_revisions, 3);
        assert_eq!(config.pipeline.max_concurrent_agents, 10);
        assert_eq!(config.pipeline.scan_interval_seconds, 300);
    }

    #[test]
    fn empty_file_loads_to_defaults() {
        let file = write_config("");
        let config = PresslineConfig::load(Some(file.path())).expect("load succeeds");
        assert_eq!(config.publish.default_channels, vec!["log".to_owned()]);
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let file = write_config(
            r#"
            [pipeline]
            max_revisions = 5

            [publish]
            default_channels = ["log", "webhook"]
            "#,
        );
        let config = PresslineConfig::load(Some(file.path())).expect("load succeeds");
        assert_eq!(config.pipeline.max_revisions, 5);
        assert_eq!(config.pipeline.task_poll_interval_seconds, 5);
        assert_eq!(config.publish.default_channels, vec!["log".to_owned(), "webhook".to_owned()]);
    }

    #[test]
    fn score_outside_unit_interval_is_rejected() {
        let file = write_config(
            r#"
            [pipeline]
            min_newsworthiness_score = 1.5
            "#,
        );
        let err = PresslineConfig::load(Some(file.path())).expect_err("load fails");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn stalled_lease_shorter_than_poll_interval_is_rejected() {
        let file = write_config(
            r#"
            [pipeline]
            stalled_lease_seconds = 1
            task_poll_interval_seconds = 5
            "#,
        );
        let err = PresslineConfig::load(Some(file.path())).expect_err("load fails");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_default_channels_is_rejected() {
        let file = write_config(
            r#"
            [publish]
            default_channels = []
            "#,
        );
        let err = PresslineConfig::load(Some(file.path())).expect_err("load fails");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = PresslineConfig::load(Some(Path::new("/nonexistent/pressline.toml")))
            .expect_err("load fails");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
