//! In-memory history and configuration for the lineage unit tests.

use async_trait::async_trait;
use chrono::Utc;
use oxide_core::Result;
use oxide_core::ids::{Fingerprint, PipelineName};
use oxide_core::material::{DependencyMaterial, Material};
use oxide_core::pipeline::PipelineConfig;
use oxide_core::ports::{PipelineConfigSource, RunHistory};
use oxide_core::revision::{MaterialRevision, Modification, Revision};
use oxide_core::run::{PipelineRun, StageRun, Trigger};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeHistory {
    runs: Mutex<Vec<PipelineRun>>,
    stages: Mutex<HashMap<(String, u32), Vec<StageRun>>>,
    modifications: Mutex<Vec<(Fingerprint, Modification)>>,
    trigger_queries: Mutex<Vec<String>>,
}

impl FakeHistory {
    pub fn add_run(&self, run: PipelineRun) {
        self.runs.lock().unwrap().push(run);
    }

    pub fn add_stages(&self, pipeline: &str, counter: u32, stages: Vec<StageRun>) {
        self.stages
            .lock()
            .unwrap()
            .insert((pipeline.to_ascii_lowercase(), counter), stages);
    }

    pub fn add_modification(&self, material: &Material, revision: &str) {
        self.modifications
            .lock()
            .unwrap()
            .push((material.fingerprint(), Modification::new(revision, Utc::now())));
    }

    /// How often runs of `pipeline` were looked up by trigger.
    pub fn trigger_queries_for(&self, pipeline: &str) -> usize {
        self.trigger_queries
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.eq_ignore_ascii_case(pipeline))
            .count()
    }
}

#[async_trait]
impl RunHistory for FakeHistory {
    async fn find_run(&self, pipeline: &PipelineName, counter: u32) -> Result<Option<PipelineRun>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.pipeline == *pipeline && r.counter == counter)
            .cloned())
    }

    async fn runs_triggered_by(
        &self,
        pipeline: &PipelineName,
        trigger: &Trigger,
    ) -> Result<Vec<PipelineRun>> {
        self.trigger_queries
            .lock()
            .unwrap()
            .push(pipeline.as_str().to_string());
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.pipeline == *pipeline && trigger.matches(&r.build_cause))
            .cloned()
            .collect())
    }

    async fn stage_runs(&self, pipeline: &PipelineName, counter: u32) -> Result<Vec<StageRun>> {
        Ok(self
            .stages
            .lock()
            .unwrap()
            .get(&(pipeline.key(), counter))
            .cloned()
            .unwrap_or_default())
    }

    async fn find_modification(
        &self,
        material: &Fingerprint,
        revision: &Revision,
    ) -> Result<Option<Modification>> {
        Ok(self
            .modifications
            .lock()
            .unwrap()
            .iter()
            .find(|(f, m)| f == material && m.revision == *revision)
            .map(|(_, m)| m.clone()))
    }
}

#[derive(Default)]
pub struct FakeConfigs {
    pipelines: Mutex<Vec<PipelineConfig>>,
}

impl FakeConfigs {
    pub fn add(&self, config: PipelineConfig) {
        self.pipelines.lock().unwrap().push(config);
    }
}

#[async_trait]
impl PipelineConfigSource for FakeConfigs {
    async fn find_pipeline(&self, name: &PipelineName) -> Result<Option<PipelineConfig>> {
        Ok(self
            .pipelines
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.name == *name)
            .cloned())
    }

    async fn all_pipelines(&self) -> Result<Vec<PipelineConfig>> {
        Ok(self.pipelines.lock().unwrap().clone())
    }
}

pub fn dependency(upstream: &str) -> Material {
    Material::Dependency(DependencyMaterial::new(upstream, "dist"))
}

/// Build cause entry for a run triggered by `upstream/counter`.
pub fn dependency_cause(upstream: &str, counter: u32) -> MaterialRevision {
    MaterialRevision::new(
        dependency(upstream),
        vec![Modification::new(
            format!("{upstream}/{counter}/dist/1"),
            Utc::now(),
        )],
    )
}

/// Build cause entry for a run triggered by a source revision.
pub fn material_cause(material: &Material, revision: &str) -> MaterialRevision {
    MaterialRevision::new(
        material.clone(),
        vec![Modification::new(revision, Utc::now())],
    )
}
