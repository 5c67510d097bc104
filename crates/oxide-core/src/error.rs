//! Error types for Oxide CI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Dispatch errors
    #[error("No subscribers for subject: {0}")]
    NoSubscribers(String),

    #[error("Work selection failed for agent {agent}: {message}")]
    WorkSelection { agent: String, message: String },

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    // Material errors
    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    #[error("Material revision not found: {fingerprint} at {revision}")]
    MaterialRevisionNotFound {
        fingerprint: String,
        revision: String,
    },

    #[error("Invalid revision: {0}")]
    InvalidRevision(String),

    // Lineage errors
    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Pipeline run not found: {pipeline}/{counter}")]
    PipelineRunNotFound { pipeline: String, counter: u32 },

    #[error("Cyclic dependency detected: {0}")]
    CyclicDependency(String),

    #[error("Value stream map can not be rendered: {0}")]
    LineageContract(String),

    // Infrastructure errors
    #[error("Event bus error: {0}")]
    EventBus(String),

    #[error("Run history error: {0}")]
    History(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}
