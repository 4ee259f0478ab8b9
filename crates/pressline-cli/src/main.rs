#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "A CLI's job is to print to the terminal."
)]
// pressline-cli/src/main.rs
// ============================================================================
// Module: Pressline CLI Entry Point
// Description: Command dispatcher for database setup, the Chief sweep loop,
//              the Scout ingestion loop, and role worker processes.
// Purpose: Wire `pressline-config`, `pressline-store-sqlite`,
//          `pressline-providers`, and `pressline-channels` together behind a
//          single binary (spec §4.8, §4.5, §4.7 main loops).
// Dependencies: clap, pressline-core, pressline-config, pressline-store-sqlite,
//               pressline-providers, pressline-channels.
// ============================================================================

//! ## Overview
//! Every subcommand loads one [`PresslineConfig`] and opens one
//! [`SqliteStore`], then drives exactly one of the runtime loops built in
//! `pressline-core`: `init-db` just applies the schema and exits, `chief`
//! runs [`Chief::sweep_once`] or [`Chief::run`], `scout` runs
//! [`ScoutLoop::run`], and `agent` registers an [`AgentRuntime`] for one role
//! and runs its claim loop. None of these loops are async, so `main` runs on
//! the default single thread.

mod handlers;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use pressline_channels::CompositePublisher;
use pressline_channels::LogChannel;
use pressline_channels::WebhookChannel;
use pressline_config::PresslineConfig;
use pressline_core::core::Role;
use pressline_core::core::StoryId;
use pressline_core::core::Timestamp;
use pressline_core::interfaces::AgentRegistry;
use pressline_core::interfaces::ArticleStore;
use pressline_core::interfaces::EventLog;
use pressline_core::interfaces::HumanOversightStore;
use pressline_core::interfaces::MemoryStore;
use pressline_core::interfaces::TaskQueue;
use pressline_core::interfaces::providers::ChatProvider;
use pressline_core::interfaces::providers::EmbeddingProvider;
use pressline_core::interfaces::providers::FeedReader;
use pressline_core::interfaces::providers::SearchProvider;
use pressline_core::runtime::AgentRuntime;
use pressline_core::runtime::AgentRuntimeConfig;
use pressline_core::runtime::Chief;
use pressline_core::runtime::ChiefConfig;
use pressline_core::runtime::ScoutConfig;
use pressline_core::runtime::ScoutLoop;
use pressline_providers::FakeChatProvider;
use pressline_providers::FakeEmbeddingProvider;
use pressline_providers::FakeSearchProvider;
use pressline_providers::HttpChatProvider;
use pressline_providers::HttpEmbeddingProvider;
use pressline_providers::HttpFeedReader;
use pressline_providers::HttpSearchProvider;
use pressline_providers::StaticFeedReader;
use pressline_store_sqlite::SqliteStore;
use pressline_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

use crate::handlers::EditorConfig;
use crate::handlers::EditorHandler;
use crate::handlers::PublisherHandler;
use crate::handlers::ReporterHandler;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "pressline", disable_help_subcommand = true, arg_required_else_help = true)]
struct Cli {
    /// Path to `pressline.toml`; falls back to `PRESSLINE_CONFIG` or defaults
    /// (spec §6 "Configuration").
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the configured database, applying its schema.
    InitDb,
    /// Run the Chief orchestrator.
    Chief(ChiefCommand),
    /// Run the Scout ingestion loop.
    Scout(ScoutCommand),
    /// Run one role worker process.
    Agent(AgentCommand),
    /// Inspect a story's events, tasks, and article.
    Story(StoryCommand),
}

/// Arguments for the `chief` command.
#[derive(Args, Debug)]
struct ChiefCommand {
    /// Run exactly one sweep and exit instead of looping.
    #[arg(long)]
    once: bool,
}

/// Arguments for the `scout` command.
#[derive(Args, Debug)]
struct ScoutCommand {
    /// Feed URL to scan; repeatable. Required unless `--fake` is also set,
    /// in which case a built-in static feed is scanned instead.
    #[arg(long = "feed-url", value_name = "URL")]
    feed_urls: Vec<String>,
    /// Run exactly one scan pass over every feed and exit.
    #[arg(long)]
    once: bool,
    /// Use deterministic fake embedding and feed providers instead of HTTP
    /// ones, for local exercise without any external services.
    #[arg(long)]
    fake: bool,
}

/// Arguments for the `agent` command.
#[derive(Args, Debug)]
struct AgentCommand {
    /// Which role this worker process claims tasks for.
    #[arg(long, value_enum)]
    role: AgentRole,
    /// Run exactly one claim/process cycle and exit instead of looping.
    #[arg(long)]
    once: bool,
    /// Use deterministic fake search and chat providers instead of HTTP
    /// ones, for local exercise without any external services.
    #[arg(long)]
    fake: bool,
}

/// Roles selectable by the `agent` command.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum AgentRole {
    /// Claims `research`, `draft`, and `edit` tasks.
    Reporter,
    /// Claims `review` tasks.
    Editor,
    /// Claims `publish` tasks.
    Publisher,
}

/// Arguments for the `story` command.
#[derive(Args, Debug)]
struct StoryCommand {
    /// Story identifier (UUID) to inspect.
    story_id: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper; every fallible path collapses into one message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = PresslineConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("loading config: {err}")))?;
    let store = Arc::new(
        SqliteStore::open(SqliteStoreConfig {
            path: config.store.path.clone(),
            busy_timeout_ms: config.store.busy_timeout_ms,
            read_pool_size: config.store.read_pool_size,
            writer_queue_capacity: config.store.writer_queue_capacity,
        })
        .map_err(|err| CliError::new(format!("opening store: {err}")))?,
    );

    match cli.command {
        Commands::InitDb => command_init_db(),
        Commands::Chief(command) => command_chief(&store, &config, &command),
        Commands::Scout(command) => command_scout(&store, &config, &command),
        Commands::Agent(command) => command_agent(&store, &config, &command),
        Commands::Story(command) => command_story(&store, &command),
    }
}

// ============================================================================
// SECTION: init-db
// ============================================================================

fn command_init_db() -> CliResult<ExitCode> {
    println!("database opened and schema applied");
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: chief
// ============================================================================

fn command_chief(
    store: &Arc<SqliteStore>,
    config: &PresslineConfig,
    command: &ChiefCommand,
) -> CliResult<ExitCode> {
    let chief = Chief::new(
        store.clone() as Arc<dyn EventLog>,
        store.clone() as Arc<dyn TaskQueue>,
        store.clone() as Arc<dyn ArticleStore>,
        store.clone() as Arc<dyn HumanOversightStore>,
        ChiefConfig {
            min_newsworthiness_score: config.pipeline.min_newsworthiness_score as f32,
            stalled_lease: time::Duration::seconds(i64::try_from(config.pipeline.stalled_lease_seconds).unwrap_or(i64::MAX)),
            max_revisions: config.pipeline.max_revisions,
            default_channels: config.publish.default_channels.clone(),
            ..ChiefConfig::default()
        },
    );

    if command.once {
        let report = chief.sweep_once(Timestamp::now()).map_err(|err| CliError::new(err.to_string()))?;
        println!("{report:?}");
        return Ok(ExitCode::SUCCESS);
    }

    let stop = AtomicBool::new(false);
    chief.run(std::time::Duration::from_secs(config.pipeline.task_poll_interval_seconds), &stop);
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: scout
// ============================================================================

fn command_scout(
    store: &Arc<SqliteStore>,
    config: &PresslineConfig,
    command: &ScoutCommand,
) -> CliResult<ExitCode> {
    let embeddings: Arc<dyn EmbeddingProvider> = if command.fake {
        Arc::new(FakeEmbeddingProvider::new(config.embedding.dimension))
    } else {
        Arc::new(
            HttpEmbeddingProvider::new("http://127.0.0.1:8000", config.embedding.model.clone())
                .map_err(|err| CliError::new(err.to_string()))?,
        )
    };
    let feeds: Arc<dyn FeedReader> =
        if command.fake { Arc::new(StaticFeedReader::new()) } else { Arc::new(HttpFeedReader::new().map_err(|err| CliError::new(err.to_string()))?) };

    let scout = ScoutLoop::new(
        store.clone() as Arc<dyn EventLog>,
        store.clone() as Arc<dyn MemoryStore>,
        embeddings,
        feeds,
        ScoutConfig {
            detection_floor: config.pipeline.scout_score_threshold as f32,
            dedup_threshold: config.pipeline.dedup_similarity_threshold as f32,
            max_detections_per_day: usize::try_from(config.governance.max_detections_per_day)
                .unwrap_or(usize::MAX),
        },
    );

    let feed_urls = command.feed_urls.clone();
    if command.once {
        for feed_url in &feed_urls {
            let emitted = scout.scan_feed(feed_url).map_err(|err| CliError::new(err.to_string()))?;
            println!("{feed_url}: {emitted} detection(s)");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let stop = AtomicBool::new(false);
    scout.run(&feed_urls, std::time::Duration::from_secs(config.pipeline.scan_interval_seconds), &stop);
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: agent
// ============================================================================

fn command_agent(
    store: &Arc<SqliteStore>,
    config: &PresslineConfig,
    command: &AgentCommand,
) -> CliResult<ExitCode> {
    let heartbeat_every_n_polls = (config.pipeline.agent_heartbeat_interval_seconds
        / config.pipeline.task_poll_interval_seconds.max(1))
    .clamp(1, u64::from(u32::MAX));
    let runtime_config = AgentRuntimeConfig {
        poll_interval: std::time::Duration::from_secs(config.pipeline.task_poll_interval_seconds),
        heartbeat_every_n_polls: u32::try_from(heartbeat_every_n_polls).unwrap_or(u32::MAX),
    };
    let stop = AtomicBool::new(false);

    match command.role {
        AgentRole::Reporter => {
            let (search, chat) = build_search_and_chat(command.fake)?;
            let runtime = AgentRuntime::register(
                Role::Reporter,
                store.clone() as Arc<dyn AgentRegistry>,
                store.clone() as Arc<dyn TaskQueue>,
                store.clone() as Arc<dyn EventLog>,
                ReporterHandler::new(search, chat),
                runtime_config,
            )
            .map_err(|err| CliError::new(err.to_string()))?;
            run_agent(&runtime, command.once, &stop)
        }
        AgentRole::Editor => {
            let (search, chat) = build_search_and_chat(command.fake)?;
            let runtime = AgentRuntime::register(
                Role::Editor,
                store.clone() as Arc<dyn AgentRegistry>,
                store.clone() as Arc<dyn TaskQueue>,
                store.clone() as Arc<dyn EventLog>,
                EditorHandler::new(search, chat, EditorConfig::default()),
                runtime_config,
            )
            .map_err(|err| CliError::new(err.to_string()))?;
            run_agent(&runtime, command.once, &stop)
        }
        AgentRole::Publisher => {
            let publisher = Arc::new(build_publisher(config)?);
            let runtime = AgentRuntime::register(
                Role::Publisher,
                store.clone() as Arc<dyn AgentRegistry>,
                store.clone() as Arc<dyn TaskQueue>,
                store.clone() as Arc<dyn EventLog>,
                PublisherHandler::new(store.clone() as Arc<dyn ArticleStore>, publisher),
                runtime_config,
            )
            .map_err(|err| CliError::new(err.to_string()))?;
            run_agent(&runtime, command.once, &stop)
        }
    }
}

/// Builds the search and chat providers a `reporter`/`editor` worker needs;
/// skipped entirely for a `publisher` worker, which uses neither.
fn build_search_and_chat(fake: bool) -> CliResult<(Arc<dyn SearchProvider>, Arc<dyn ChatProvider>)> {
    let search: Arc<dyn SearchProvider> = if fake {
        Arc::new(FakeSearchProvider::new(vec![pressline_core::interfaces::providers::SearchResult {
            title: "fixture result".to_owned(),
            url: "https://example.com/fixture".to_owned(),
            snippet: Some("fixture snippet".to_owned()),
        }]))
    } else {
        Arc::new(HttpSearchProvider::new("http://127.0.0.1:8100").map_err(|err| CliError::new(err.to_string()))?)
    };
    let chat: Arc<dyn ChatProvider> = if fake {
        Arc::new(FakeChatProvider::default())
    } else {
        Arc::new(HttpChatProvider::new("http://127.0.0.1:8200").map_err(|err| CliError::new(err.to_string()))?)
    };
    Ok((search, chat))
}

fn run_agent<H: pressline_core::runtime::TaskHandler>(
    runtime: &AgentRuntime<H>,
    once: bool,
    stop: &AtomicBool,
) -> CliResult<ExitCode> {
    if once {
        runtime.run_once().map_err(|err| CliError::new(err.to_string()))?;
        return Ok(ExitCode::SUCCESS);
    }
    runtime.run(stop);
    Ok(ExitCode::SUCCESS)
}

/// Builds the composite publisher from configured channel names; only the
/// `log` channel needs no further configuration, so every other requested
/// name is wired as a webhook to a fixed local URL matching the HTTP
/// provider convention used elsewhere in this CLI.
fn build_publisher(config: &PresslineConfig) -> CliResult<CompositePublisher> {
    let mut builder = CompositePublisher::builder().channel("log", LogChannel::new());
    for name in &config.publish.default_channels {
        if name == "log" {
            continue;
        }
        let url = url::Url::parse(&format!("http://127.0.0.1:8300/{name}"))
            .map_err(|err| CliError::new(err.to_string()))?;
        builder = builder.channel(
            name.clone(),
            WebhookChannel::named(name.clone(), url).map_err(|err| CliError::new(err.to_string()))?,
        );
    }
    Ok(builder.build())
}

// ============================================================================
// SECTION: story
// ============================================================================

fn command_story(store: &Arc<SqliteStore>, command: &StoryCommand) -> CliResult<ExitCode> {
    let uuid = uuid::Uuid::parse_str(&command.story_id)
        .map_err(|err| CliError::new(format!("invalid story id: {err}")))?;
    let story_id = StoryId::from_uuid(uuid);

    let events =
        EventLog::list_for_story(store.as_ref(), story_id).map_err(|err| CliError::new(err.to_string()))?;
    println!("events:");
    for event in &events {
        println!("  [{}] {}: {}", event.event_seq.value(), event.event_type, event.payload);
    }

    let tasks =
        TaskQueue::list_for_story(store.as_ref(), story_id).map_err(|err| CliError::new(err.to_string()))?;
    println!("tasks:");
    for task in &tasks {
        println!("  {} {:?} priority={}", task.stage, task.status, task.priority);
    }

    match store.get_for_story(story_id).map_err(|err| CliError::new(err.to_string()))? {
        Some(article) => println!("article: {} ({})", article.headline, article.article_id),
        None => println!("article: none"),
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test-only fixture assertions")]
mod tests {
    use clap::CommandFactory;

    use super::Cli;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
