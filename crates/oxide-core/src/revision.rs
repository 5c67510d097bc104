//! Revisions and modifications of materials.

use crate::ids::PipelineName;
use crate::material::Material;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque point in a material's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(revision: impl Into<String>) -> Self {
        Self(revision.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for console messages.
    pub fn short(&self) -> &str {
        self.0.get(..7).unwrap_or(&self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single change detected in a material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Modification {
    pub revision: Revision,
    pub user_name: Option<String>,
    pub comment: Option<String>,
    pub modified_at: DateTime<Utc>,
}

impl Modification {
    pub fn new(revision: impl Into<String>, modified_at: DateTime<Utc>) -> Self {
        Self {
            revision: Revision::new(revision),
            user_name: None,
            comment: None,
            modified_at,
        }
    }
}

/// Modifications between the last-built revision and the one to build, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RevisionContext {
    pub latest: Revision,
    #[serde(default)]
    pub oldest: Option<Revision>,
    #[serde(default)]
    pub modifications: Vec<Modification>,
}

impl RevisionContext {
    pub fn new(latest: Revision) -> Self {
        Self {
            latest,
            oldest: None,
            modifications: vec![],
        }
    }

    pub fn with_modifications(mut self, modifications: Vec<Modification>) -> Self {
        self.oldest = modifications.last().map(|m| m.revision.clone());
        self.modifications = modifications;
        self
    }

    pub fn latest_revision(&self) -> &Revision {
        &self.latest
    }

    pub fn number_of_modifications(&self) -> usize {
        self.modifications.len()
    }

    /// Minimum history depth that contains every modification in the context.
    pub fn required_depth(&self) -> u32 {
        u32::try_from(self.modifications.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }
}

/// The modifications of one material that caused a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MaterialRevision {
    pub material: Material,
    pub modifications: Vec<Modification>,
}

impl MaterialRevision {
    pub fn new(material: Material, modifications: Vec<Modification>) -> Self {
        Self {
            material,
            modifications,
        }
    }

    pub fn latest_modification(&self) -> Option<&Modification> {
        self.modifications.first()
    }

    pub fn latest_revision(&self) -> Option<&Revision> {
        self.latest_modification().map(|m| &m.revision)
    }
}

/// Revision string of a dependency material: `pipeline/counter/stage/stage_counter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct DependencyRevision {
    pub pipeline: PipelineName,
    pub pipeline_counter: u32,
    pub stage: String,
    pub stage_counter: u32,
}

impl DependencyRevision {
    pub fn parse(revision: &str) -> Result<Self> {
        let invalid = || Error::InvalidRevision(revision.to_string());
        let parts: Vec<&str> = revision.split('/').collect();
        let [pipeline, counter, stage, stage_counter] = parts.as_slice() else {
            return Err(invalid());
        };
        Ok(Self {
            pipeline: PipelineName::new(*pipeline),
            pipeline_counter: counter.parse().map_err(|_| invalid())?,
            stage: stage.to_string(),
            stage_counter: stage_counter.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for DependencyRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.pipeline, self.pipeline_counter, self.stage, self.stage_counter
        )
    }
}
