//! Units of work handed to agents.

use crate::ids::{AgentId, PipelineName, WorkId};
use crate::material::Material;
use crate::revision::RevisionContext;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of work selection for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Work {
    NoWork,
    Build(BuildWork),
}

impl Work {
    pub fn is_no_work(&self) -> bool {
        matches!(self, Work::NoWork)
    }

    pub fn description(&self) -> String {
        match self {
            Work::NoWork => "no work".to_string(),
            Work::Build(build) => build.job.to_string(),
        }
    }
}

/// A concrete job bound to one agent, with the revision to build for each material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BuildWork {
    pub id: WorkId,
    pub agent_id: AgentId,
    pub job: JobIdentifier,
    pub materials: Vec<MaterialSync>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct JobIdentifier {
    pub pipeline: PipelineName,
    pub pipeline_counter: u32,
    pub stage: String,
    pub stage_counter: u32,
    pub job: String,
}

impl JobIdentifier {
    pub fn new(
        pipeline: impl Into<String>,
        pipeline_counter: u32,
        stage: impl Into<String>,
        stage_counter: u32,
        job: impl Into<String>,
    ) -> Self {
        Self {
            pipeline: PipelineName::new(pipeline),
            pipeline_counter,
            stage: stage.into(),
            stage_counter,
            job: job.into(),
        }
    }
}

impl fmt::Display for JobIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.pipeline, self.pipeline_counter, self.stage, self.stage_counter, self.job
        )
    }
}

/// A material paired with the revision the agent must bring it to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MaterialSync {
    pub material: Material,
    pub revision: RevisionContext,
}
