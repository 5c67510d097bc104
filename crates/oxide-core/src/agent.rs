//! Agent types.

use crate::ids::AgentId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a remote agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AgentIdentity {
    pub id: AgentId,
    pub hostname: String,
    pub ip_address: String,
}

impl AgentIdentity {
    pub fn new(id: AgentId, hostname: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            id,
            hostname: hostname.into(),
            ip_address: ip_address.into(),
        }
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.hostname, self.ip_address, self.id)
    }
}

/// Runtime snapshot of an agent as seen by the fleet service.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Agent {
    pub identity: AgentIdentity,
    pub status: AgentStatus,
    /// Free-form resources used to match jobs (e.g. `docker`, `jdk17`).
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub environments: Vec<String>,
    pub os: Os,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn id(&self) -> AgentId {
        self.identity.id
    }

    pub fn has_resources(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|r| self.resources.iter().any(|own| own.eq_ignore_ascii_case(r)))
    }

    pub fn in_environment(&self, environment: &str) -> bool {
        self.environments.iter().any(|e| e == environment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    Linux,
    Macos,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Building,
    Cancelled,
    LostContact,
    Missing,
    Disabled,
}

impl AgentStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, AgentStatus::Idle)
    }
}
