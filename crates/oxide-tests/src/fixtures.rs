//! Test fixtures for creating sample data and in-memory ports.

use async_trait::async_trait;
use chrono::Utc;
use oxide_core::Result;
use oxide_core::agent::{Agent, AgentIdentity, AgentStatus, Os};
use oxide_core::ids::{AgentId, Fingerprint, PipelineName, WorkId};
use oxide_core::material::{DependencyMaterial, GitMaterial, Material};
use oxide_core::pipeline::PipelineConfig;
use oxide_core::ports::{PipelineConfigSource, RunHistory, WorkSelector};
use oxide_core::revision::{MaterialRevision, Modification, Revision, RevisionContext};
use oxide_core::run::{PipelineRun, StageRun, Trigger};
use oxide_core::work::{BuildWork, JobIdentifier, MaterialSync, Work};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Factory for creating test agents.
pub struct AgentFixture;

impl AgentFixture {
    /// An idle Linux agent without resources.
    pub fn idle(hostname: &str) -> Agent {
        Agent {
            identity: AgentIdentity::new(AgentId::new(), hostname, "127.0.0.1"),
            status: AgentStatus::Idle,
            resources: vec![],
            environments: vec![],
            os: Os::Linux,
            last_heartbeat_at: Some(Utc::now()),
        }
    }

    /// An idle agent offering `resources`.
    pub fn with_resources(hostname: &str, resources: &[&str]) -> Agent {
        let mut agent = Self::idle(hostname);
        agent.resources = resources.iter().map(|r| r.to_string()).collect();
        agent
    }
}

/// Factory for creating materials and build causes.
pub struct MaterialFixture;

impl MaterialFixture {
    pub fn git(url: &str) -> Material {
        Material::Git(GitMaterial::new(url))
    }

    pub fn dependency(upstream: &str) -> Material {
        Material::Dependency(DependencyMaterial::new(upstream, "dist"))
    }

    /// Build cause entry for a run triggered by a source revision.
    pub fn cause(material: &Material, revision: &str) -> MaterialRevision {
        MaterialRevision::new(
            material.clone(),
            vec![Modification::new(revision, Utc::now())],
        )
    }

    /// Build cause entry for a run triggered by `upstream/counter`.
    pub fn dependency_cause(upstream: &str, counter: u32) -> MaterialRevision {
        MaterialRevision::new(
            Self::dependency(upstream),
            vec![Modification::new(
                format!("{upstream}/{counter}/dist/1"),
                Utc::now(),
            )],
        )
    }
}

/// Factory for creating units of work.
pub struct WorkFixture;

impl WorkFixture {
    /// Build work for `agent` syncing one git material to `revision`.
    pub fn build(agent: &Agent, job: &str, url: &str, revision: &str) -> Work {
        Work::Build(BuildWork {
            id: WorkId::new(),
            agent_id: agent.id(),
            job: JobIdentifier::new("build", 1, "compile", 1, job),
            materials: vec![MaterialSync {
                material: MaterialFixture::git(url),
                revision: RevisionContext::new(Revision::new(revision)),
            }],
        })
    }
}

/// Selector that answers from a script, then with "no work".
#[derive(Default)]
pub struct ScriptedSelector {
    answers: Mutex<VecDeque<Work>>,
    calls: Mutex<Vec<AgentId>>,
}

impl ScriptedSelector {
    pub fn push(&self, work: Work) {
        self.answers.lock().unwrap().push_back(work);
    }

    /// Agents the selector was asked about, in order.
    pub fn calls(&self) -> Vec<AgentId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkSelector for ScriptedSelector {
    async fn select_work(&self, agent: &Agent) -> Result<Work> {
        self.calls.lock().unwrap().push(agent.id());
        Ok(self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Work::NoWork))
    }
}

/// Run history kept in memory.
#[derive(Default)]
pub struct InMemoryRunHistory {
    runs: Mutex<Vec<PipelineRun>>,
    stages: Mutex<HashMap<(String, u32), Vec<StageRun>>>,
    modifications: Mutex<Vec<(Fingerprint, Modification)>>,
}

impl InMemoryRunHistory {
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
}

#[async_trait]
impl RunHistory for InMemoryRunHistory {
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

/// Pipeline configuration kept in memory.
#[derive(Default)]
pub struct InMemoryPipelineConfigs {
    pipelines: Mutex<Vec<PipelineConfig>>,
}

impl InMemoryPipelineConfigs {
    pub fn add(&self, config: PipelineConfig) {
        self.pipelines.lock().unwrap().push(config);
    }
}

#[async_trait]
impl PipelineConfigSource for InMemoryPipelineConfigs {
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
