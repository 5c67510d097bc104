//! Persisted pipeline and stage run records.

use crate::ids::{Fingerprint, PipelineName};
use crate::material::Material;
use crate::revision::{DependencyRevision, MaterialRevision, Revision};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One run of a pipeline and the material revisions that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineRun {
    pub pipeline: PipelineName,
    pub counter: u32,
    pub label: String,
    pub build_cause: Vec<MaterialRevision>,
    pub scheduled_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new(pipeline: impl Into<String>, counter: u32) -> Self {
        Self {
            pipeline: PipelineName::new(pipeline),
            counter,
            label: counter.to_string(),
            build_cause: vec![],
            scheduled_at: Utc::now(),
        }
    }

    pub fn with_build_cause(mut self, build_cause: Vec<MaterialRevision>) -> Self {
        self.build_cause = build_cause;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// One attempt of a stage within a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StageRun {
    pub name: String,
    /// Attempt number; reruns of the same stage increase it.
    pub counter: u32,
    pub result: StageResult,
    pub scheduled_at: DateTime<Utc>,
}

impl StageRun {
    pub fn new(name: impl Into<String>, counter: u32, result: StageResult) -> Self {
        Self {
            name: name.into(),
            counter,
            result,
            scheduled_at: Utc::now(),
        }
    }
}

/// The upstream revision a downstream run is looked up by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Trigger {
    Pipeline {
        pipeline: PipelineName,
        counter: u32,
    },
    Material {
        fingerprint: Fingerprint,
        revision: Revision,
    },
}

impl Trigger {
    /// Whether a run with this build cause was triggered by this revision.
    pub fn matches(&self, build_cause: &[MaterialRevision]) -> bool {
        build_cause.iter().any(|cause| match (self, &cause.material) {
            (Trigger::Pipeline { pipeline, counter }, Material::Dependency(dep)) => {
                dep.pipeline == *pipeline
                    && cause.modifications.iter().any(|m| {
                        DependencyRevision::parse(m.revision.as_str())
                            .map(|rev| rev.pipeline_counter == *counter)
                            .unwrap_or(false)
                    })
            }
            (Trigger::Material { fingerprint, revision }, material) => {
                material.fingerprint() == *fingerprint
                    && cause.modifications.iter().any(|m| m.revision == *revision)
            }
            _ => false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageResult {
    Passed,
    Failed,
    Cancelled,
    Building,
    /// Configured but never scheduled in this run.
    NotRun,
}

impl StageResult {
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            StageResult::Passed | StageResult::Failed | StageResult::Cancelled
        )
    }
}
