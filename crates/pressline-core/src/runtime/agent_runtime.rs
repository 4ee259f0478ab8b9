// pressline-core/src/runtime/agent_runtime.rs
// ============================================================================
// Module: Agent runtime
// Description: The generic claim/handle/complete loop shared by every role
//              worker (spec §3 "Agent", §4.5).
// Purpose: Give Reporter/Editor/Publisher a single, well-tested main loop;
//          only the task-handling behavior differs between roles.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! One [`AgentRuntime`] is one role worker process. It registers with the
//! [`AgentRegistry`] on construction, then alternates between claiming a
//! task, running it through a [`TaskHandler`], and reporting the outcome to
//! the [`TaskQueue`] and [`EventLog`] — mirroring the prototype's
//! register/heartbeat/claim/process loop (spec §4.5 "Agent lifecycle").

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde_json::json;

use crate::core::AgentId;
use crate::core::AgentStatus;
use crate::core::Role;
use crate::core::Task;
use crate::core::event_type;
use crate::interfaces::AgentRegistryError;
use crate::interfaces::EventLogError;
use crate::interfaces::TaskQueueError;
use crate::interfaces::{AgentRegistry, EventLog, TaskQueue};

/// Failure modes of an [`AgentRuntime`] loop.
#[derive(Debug, thiserror::Error)]
pub enum AgentRuntimeError {
    /// The agent registry failed.
    #[error("agent runtime: registry failure: {0}")]
    Registry(#[from] AgentRegistryError),
    /// The task queue failed.
    #[error("agent runtime: task queue failure: {0}")]
    TaskQueue(#[from] TaskQueueError),
    /// The event log failed.
    #[error("agent runtime: event log failure: {0}")]
    EventLog(#[from] EventLogError),
}

/// The work a role performs on one claimed task (spec §4.5).
///
/// Implementations are the only place role-specific behavior lives; the
/// claim/complete/fail bookkeeping around a call to `handle` is identical
/// for every role.
pub trait TaskHandler: Send + Sync {
    /// Executes `task` and returns its output payload.
    ///
    /// # Errors
    /// Any `Err` return fails the task; the message is recorded as the
    /// task's output under an `"error"` key (spec §4.5 "on exception, fail
    /// the task").
    fn handle(&self, task: &Task) -> Result<serde_json::Value, String>;
}

/// Tunables for one [`AgentRuntime`] instance (spec §6 config keys).
#[derive(Debug, Clone, Copy)]
pub struct AgentRuntimeConfig {
    /// How often to poll for a claimable task when idle.
    pub poll_interval: std::time::Duration,
    /// How many poll iterations between heartbeats.
    pub heartbeat_every_n_polls: u32,
}

impl Default for AgentRuntimeConfig {
    fn default() -> Self {
        Self { poll_interval: std::time::Duration::from_secs(5), heartbeat_every_n_polls: 6 }
    }
}

/// One role worker process (spec §3 "Agent").
pub struct AgentRuntime<H: TaskHandler> {
    agent_id: AgentId,
    role: Role,
    registry: std::sync::Arc<dyn AgentRegistry>,
    tasks: std::sync::Arc<dyn TaskQueue>,
    log: std::sync::Arc<dyn EventLog>,
    handler: H,
    config: AgentRuntimeConfig,
}

impl<H: TaskHandler> AgentRuntime<H> {
    /// Registers a new agent with `role` and builds its runtime.
    ///
    /// # Errors
    /// Returns [`AgentRuntimeError::Registry`] if registration fails.
    pub fn register(
        role: Role,
        registry: std::sync::Arc<dyn AgentRegistry>,
        tasks: std::sync::Arc<dyn TaskQueue>,
        log: std::sync::Arc<dyn EventLog>,
        handler: H,
        config: AgentRuntimeConfig,
    ) -> Result<Self, AgentRuntimeError> {
        let record = registry.register(role)?;
        Ok(Self { agent_id: record.agent_id, role, registry, tasks, log, handler, config })
    }

    /// Returns this runtime's assigned agent identifier.
    #[must_use]
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Attempts to claim and process one task. Returns `true` if a task was
    /// claimed (regardless of whether it ultimately succeeded or failed),
    /// `false` if the queue had nothing claimable for this role.
    ///
    /// # Errors
    /// Returns [`AgentRuntimeError`] if claiming or reporting the outcome
    /// fails. A handler error alone is not an `Err` here: it is recorded as
    /// a failed task (spec §4.5).
    pub fn run_once(&self) -> Result<bool, AgentRuntimeError> {
        let Some(task) = self.tasks.claim(self.role, self.agent_id)? else {
            return Ok(false);
        };
        self.process_task(&task)?;
        Ok(true)
    }

    fn process_task(&self, task: &Task) -> Result<(), AgentRuntimeError> {
        self.registry.heartbeat(self.agent_id, AgentStatus::Working)?;
        match self.handler.handle(task) {
            Ok(output) => {
                self.tasks.complete(task.task_id, output.clone())?;
                self.log.append(
                    task.story_id,
                    Some(self.agent_id),
                    &event_type::task_completed(task.stage),
                    output,
                )?;
            }
            Err(message) => {
                self.tasks.fail(task.task_id, json!({ "error": message }))?;
                self.log.append(
                    task.story_id,
                    Some(self.agent_id),
                    &event_type::task_failed(task.stage),
                    json!({ "error": message }),
                )?;
            }
        }
        self.registry.heartbeat(self.agent_id, AgentStatus::Idle)?;
        Ok(())
    }

    /// Runs the claim/process loop until `stop` is set: claims and processes
    /// tasks back-to-back while work is available, sleeping
    /// [`AgentRuntimeConfig::poll_interval`] between polls when idle, and
    /// heartbeating every [`AgentRuntimeConfig::heartbeat_every_n_polls`]
    /// idle iterations (spec §4.5 "Agent main loop").
    pub fn run(&self, stop: &AtomicBool) {
        let mut idle_polls: u32 = 0;
        while !stop.load(Ordering::Relaxed) {
            match self.run_once() {
                Ok(true) => {
                    idle_polls = 0;
                }
                Ok(false) => {
                    idle_polls += 1;
                    if idle_polls % self.config.heartbeat_every_n_polls == 0
                        && let Err(err) = self.registry.heartbeat(self.agent_id, AgentStatus::Idle)
                    {
                        tracing::warn!(agent_id = %self.agent_id, error = %err, "heartbeat failed");
                    }
                    std::thread::sleep(self.config.poll_interval);
                }
                Err(err) => {
                    tracing::warn!(agent_id = %self.agent_id, error = %err, "agent runtime iteration failed");
                    std::thread::sleep(self.config.poll_interval);
                }
            }
        }
        if let Err(err) = self.registry.heartbeat(self.agent_id, AgentStatus::Offline) {
            tracing::warn!(agent_id = %self.agent_id, error = %err, "failed to record offline status");
        }
    }
}
