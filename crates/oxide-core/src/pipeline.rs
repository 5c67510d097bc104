//! Pipeline configuration as seen by the dependency graph.

use crate::ids::{Fingerprint, PipelineName};
use crate::material::Material;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Resolved configuration of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    pub name: PipelineName,
    pub materials: Vec<Material>,
    /// Stage names in execution order.
    pub stages: Vec<String>,
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: PipelineName::new(name),
            materials: vec![],
            stages: vec![],
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    pub fn with_stages(mut self, stages: &[&str]) -> Self {
        self.stages = stages.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Whether this pipeline consumes the output of `upstream`.
    pub fn depends_on(&self, upstream: &PipelineName) -> bool {
        self.materials.iter().any(|m| match m {
            Material::Dependency(dep) => dep.pipeline == *upstream,
            _ => false,
        })
    }

    pub fn uses_material(&self, fingerprint: &Fingerprint) -> bool {
        self.materials.iter().any(|m| m.fingerprint() == *fingerprint)
    }

    pub fn find_material(&self, fingerprint: &Fingerprint) -> Option<&Material> {
        self.materials.iter().find(|m| m.fingerprint() == *fingerprint)
    }
}
