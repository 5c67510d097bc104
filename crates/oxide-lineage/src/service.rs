//! Builds value stream maps from run history and pipeline configuration.

use oxide_core::ids::{Fingerprint, PipelineName};
use oxide_core::material::Material;
use oxide_core::pipeline::PipelineConfig;
use oxide_core::ports::{PipelineConfigSource, RunHistory};
use oxide_core::revision::{DependencyRevision, MaterialRevision, Revision};
use oxide_core::run::PipelineRun;
use oxide_core::{Error, Result};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::graph::{NodeId, PipelineRevision, ValueStreamMap};
use crate::populate::{DownstreamInstancePopulator, RunStagesPopulator, UnrunStagesPopulator};

pub struct ValueStreamMapService {
    history: Arc<dyn RunHistory>,
    config: Arc<dyn PipelineConfigSource>,
}

impl ValueStreamMapService {
    pub fn new(history: Arc<dyn RunHistory>, config: Arc<dyn PipelineConfigSource>) -> Self {
        Self { history, config }
    }

    /// Lineage of one pipeline run: everything it was built from and
    /// everything built from it.
    pub async fn for_pipeline(&self, name: &PipelineName, counter: u32) -> Result<ValueStreamMap> {
        info!(pipeline = %name, counter, "Building value stream map");

        let config = self
            .config
            .find_pipeline(name)
            .await?
            .ok_or_else(|| Error::PipelineNotFound(name.to_string()))?;
        let run = self
            .history
            .find_run(&config.name, counter)
            .await?
            .ok_or_else(|| Error::PipelineRunNotFound {
                pipeline: config.name.to_string(),
                counter,
            })?;

        let mut map = ValueStreamMap::for_pipeline(&config.name, Some(revision_of(&run)));
        let current = current_node(&map)?;
        self.add_upstream(&mut map, current, run).await?;

        let pipelines = self.config.all_pipelines().await?;
        add_downstream(&mut map, &pipelines, vec![config.name.clone()]);

        map.add_warning_if_built_from_incompatible_revisions();
        self.complete(&mut map).await?;

        info!(pipeline = %name, counter, nodes = map.len(), "Built value stream map");
        Ok(map)
    }

    /// Lineage of one material revision: every pipeline run it fed.
    pub async fn for_material(
        &self,
        fingerprint: &Fingerprint,
        revision: &Revision,
    ) -> Result<ValueStreamMap> {
        info!(material = %fingerprint, revision = %revision, "Building value stream map");

        let pipelines = self.config.all_pipelines().await?;
        let material: Material = pipelines
            .iter()
            .find_map(|p| p.find_material(fingerprint))
            .cloned()
            .ok_or_else(|| Error::MaterialNotFound(fingerprint.to_string()))?;
        let modification = self
            .history
            .find_modification(fingerprint, revision)
            .await?
            .ok_or_else(|| Error::MaterialRevisionNotFound {
                fingerprint: fingerprint.to_string(),
                revision: revision.to_string(),
            })?;

        let mut map = ValueStreamMap::for_material(
            &material,
            Some(MaterialRevision::new(material.clone(), vec![modification])),
        );
        let current = current_node(&map)?;

        let consumers: Vec<PipelineName> = pipelines
            .iter()
            .filter(|p| p.uses_material(fingerprint))
            .map(|p| p.name.clone())
            .collect();
        for consumer in &consumers {
            map.add_downstream_node(consumer, current);
        }
        add_downstream(&mut map, &pipelines, consumers);

        self.complete(&mut map).await?;

        info!(material = %fingerprint, revision = %revision, nodes = map.len(), "Built value stream map");
        Ok(map)
    }

    /// Walk build causes upward. Each upstream run is expanded once.
    async fn add_upstream(
        &self,
        map: &mut ValueStreamMap,
        current: NodeId,
        run: PipelineRun,
    ) -> Result<()> {
        let mut visited: HashSet<(String, u32)> =
            HashSet::from([(run.pipeline.key(), run.counter)]);
        let mut pending = vec![(current, run)];

        while let Some((node, run)) = pending.pop() {
            for cause in &run.build_cause {
                let Material::Dependency(dependency) = &cause.material else {
                    map.add_upstream_material_node(&cause.material, node, Some(cause.clone()));
                    continue;
                };

                let Some(config) = self.config.find_pipeline(&dependency.pipeline).await? else {
                    let id = map.add_upstream_node(&dependency.pipeline, None, node);
                    map.mark_deleted(id);
                    debug!(pipeline = %dependency.pipeline, "Upstream pipeline no longer configured");
                    continue;
                };

                let Some(latest) = cause.latest_revision() else {
                    map.add_upstream_node(&config.name, None, node);
                    continue;
                };
                let upstream = DependencyRevision::parse(latest.as_str())?;

                match self
                    .history
                    .find_run(&config.name, upstream.pipeline_counter)
                    .await?
                {
                    Some(upstream_run) => {
                        let id =
                            map.add_upstream_node(&config.name, Some(revision_of(&upstream_run)), node);
                        if visited.insert((upstream_run.pipeline.key(), upstream_run.counter)) {
                            pending.push((id, upstream_run));
                        }
                    }
                    None => {
                        map.add_upstream_node(&config.name, None, node);
                    }
                }
            }
        }
        Ok(())
    }

    /// Passes shared by both entry points, once the map has its shape.
    async fn complete(&self, map: &mut ValueStreamMap) -> Result<()> {
        if map.has_cycle() {
            let current = current_node(map)?;
            let name = map.node(current).name.clone();
            warn!(node = %name, "Cycle detected in value stream map");
            return Err(Error::CyclicDependency(name));
        }

        DownstreamInstancePopulator::new(self.history.clone())
            .populate(map)
            .await?;
        map.layout()?;
        RunStagesPopulator::new(self.history.clone())
            .populate(map)
            .await?;
        UnrunStagesPopulator::new(self.config.clone())
            .populate(map)
            .await?;
        Ok(())
    }
}

/// Add every configured pipeline that transitively depends on `roots`.
fn add_downstream(map: &mut ValueStreamMap, pipelines: &[PipelineConfig], roots: Vec<PipelineName>) {
    let mut seen: HashSet<String> = roots.iter().map(PipelineName::key).collect();
    let mut queue: VecDeque<PipelineName> = roots.into();

    while let Some(parent) = queue.pop_front() {
        let Some(parent_id) = map.find_pipeline(&parent) else {
            continue;
        };
        for child in pipelines.iter().filter(|p| p.depends_on(&parent)) {
            map.add_downstream_node(&child.name, parent_id);
            if seen.insert(child.name.key()) {
                queue.push_back(child.name.clone());
            }
        }
    }
}

fn revision_of(run: &PipelineRun) -> PipelineRevision {
    PipelineRevision::new(run.pipeline.clone(), run.counter, run.label.clone())
}

fn current_node(map: &ValueStreamMap) -> Result<NodeId> {
    map.current()
        .ok_or_else(|| Error::LineageContract("map has no current node".to_string()))
}
