//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the core domain and external adapters.

use crate::agent::Agent;
use crate::events::Event;
use crate::ids::{Fingerprint, PipelineName};
use crate::pipeline::PipelineConfig;
use crate::revision::{Modification, Revision};
use crate::run::{PipelineRun, StageRun, Trigger};
use crate::work::Work;
use crate::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Event>> + Send>>;

/// Event bus for publishing and subscribing to events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event.
    async fn publish(&self, event: Event) -> Result<()>;

    /// Subscribe to events matching a pattern.
    /// Pattern supports wildcards: `agent.*.idle`, `work.>`
    async fn subscribe(&self, pattern: &str) -> Result<EventStream>;

    /// Subscribe as a member of a queue group; each message reaches one member.
    async fn subscribe_with_group(&self, pattern: &str, group: &str) -> Result<EventStream> {
        let _ = group;
        self.subscribe(pattern).await
    }
}

/// Chooses the next unit of work for an idle agent.
#[async_trait]
pub trait WorkSelector: Send + Sync {
    async fn select_work(&self, agent: &Agent) -> Result<Work>;
}

/// Read access to persisted run history. Missing rows are empty results, not errors.
#[async_trait]
pub trait RunHistory: Send + Sync {
    /// Get a pipeline run by name and counter.
    async fn find_run(&self, pipeline: &PipelineName, counter: u32) -> Result<Option<PipelineRun>>;

    /// Runs of `pipeline` whose build cause contains the trigger revision.
    async fn runs_triggered_by(
        &self,
        pipeline: &PipelineName,
        trigger: &Trigger,
    ) -> Result<Vec<PipelineRun>>;

    /// All stage attempts of a run, in scheduling order.
    async fn stage_runs(&self, pipeline: &PipelineName, counter: u32) -> Result<Vec<StageRun>>;

    /// A recorded modification of a material.
    async fn find_modification(
        &self,
        material: &Fingerprint,
        revision: &Revision,
    ) -> Result<Option<Modification>>;
}

/// Source of resolved pipeline configuration.
#[async_trait]
pub trait PipelineConfigSource: Send + Sync {
    /// Get a pipeline by name (case-insensitive).
    async fn find_pipeline(&self, name: &PipelineName) -> Result<Option<PipelineConfig>>;

    /// List all pipelines.
    async fn all_pipelines(&self) -> Result<Vec<PipelineConfig>>;
}
