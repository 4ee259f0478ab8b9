// pressline-core/src/core/agent.rs
// ============================================================================
// Module: Agent
// Description: Worker registration record (spec §3 "Agent").
// Purpose: Define the shape persisted by AgentRegistry implementations.
// Dependencies: crate::core
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AgentId;
use crate::core::identifiers::AgentStatus;
use crate::core::identifiers::Role;
use crate::core::time::Timestamp;

/// A registered worker process (spec §3 "Agent").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Unique agent identifier, minted at registration.
    pub agent_id: AgentId,
    /// The agent's fixed role.
    pub role: Role,
    /// Current lifecycle status.
    pub status: AgentStatus,
    /// Timestamp of the most recent heartbeat.
    pub last_heartbeat: Timestamp,
}
