//! Events exchanged between the dispatcher, work finders and the agent transport.

use crate::agent::Agent;
use crate::ids::AgentId;
use crate::work::Work;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Subject pattern matching every idle-agent event.
pub const AGENT_IDLE_SUBJECTS: &str = "agent.*.idle";
/// Subject pattern matching every work-assigned event.
pub const WORK_ASSIGNED_SUBJECTS: &str = "work.assigned.>";

/// All events in the Oxide CI dispatch cycle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    AgentIdle(AgentIdlePayload),
    WorkAssigned(WorkAssignedPayload),
}

impl Event {
    /// Get the NATS subject for this event.
    pub fn subject(&self) -> String {
        match self {
            Event::AgentIdle(p) => format!("agent.{}.idle", p.agent_id),
            Event::WorkAssigned(p) => format!("work.assigned.{}", p.agent_id),
        }
    }

    pub fn agent_id(&self) -> AgentId {
        match self {
            Event::AgentIdle(p) => p.agent_id,
            Event::WorkAssigned(p) => p.agent_id,
        }
    }
}

/// An agent is waiting for work.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AgentIdlePayload {
    pub agent_id: AgentId,
    pub agent: Agent,
    pub requested_at: DateTime<Utc>,
}

impl AgentIdlePayload {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent_id: agent.id(),
            agent,
            requested_at: Utc::now(),
        }
    }
}

/// Answer to exactly one [`AgentIdlePayload`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkAssignedPayload {
    pub agent_id: AgentId,
    pub work: Work,
    pub assigned_at: DateTime<Utc>,
}

impl WorkAssignedPayload {
    pub fn new(agent_id: AgentId, work: Work) -> Self {
        Self {
            agent_id,
            work,
            assigned_at: Utc::now(),
        }
    }
}
