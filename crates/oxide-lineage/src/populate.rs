//! Passes that attach concrete runs and stage outcomes to a value stream map.

use oxide_core::ids::PipelineName;
use oxide_core::ports::{PipelineConfigSource, RunHistory};
use oxide_core::run::{StageResult, Trigger};
use oxide_core::{Error, Result};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

use crate::graph::{NodeId, NodeRevision, PipelineRevision, StageOutcome, ValueStreamMap};

/// Walks downstream from the current node and attaches the runs each
/// revision triggered.
pub struct DownstreamInstancePopulator {
    history: Arc<dyn RunHistory>,
}

impl DownstreamInstancePopulator {
    pub fn new(history: Arc<dyn RunHistory>) -> Self {
        Self { history }
    }

    /// Breadth first. Each pipeline run is expanded at most once, however
    /// many paths lead to it.
    pub async fn populate(&self, map: &mut ValueStreamMap) -> Result<()> {
        let current = map
            .current()
            .ok_or_else(|| Error::LineageContract("map has no current node".to_string()))?;
        let start = &map.node(current).revisions;
        if start.is_empty() {
            return Err(Error::LineageContract(format!(
                "current node {} has no revision",
                map.node(current).name
            )));
        }

        let mut queue: VecDeque<(NodeId, NodeRevision)> =
            start.iter().map(|r| (current, r.clone())).collect();
        let mut visited: HashSet<(String, u32)> = HashSet::new();

        while let Some((node, revision)) = queue.pop_front() {
            let Some(trigger) = trigger_for(&revision) else {
                continue;
            };

            for child in map.children(node) {
                if !map.node(child).is_pipeline() {
                    continue;
                }
                let pipeline = PipelineName::new(map.node(child).name.clone());
                let runs = self.history.runs_triggered_by(&pipeline, &trigger).await?;
                if runs.is_empty() {
                    debug!(pipeline = %pipeline, "No runs triggered by upstream revision");
                }

                for run in runs {
                    let found = PipelineRevision::new(run.pipeline, run.counter, run.label);
                    let key = (found.pipeline.key(), found.counter);
                    let revision = NodeRevision::Pipeline(found);
                    map.node_mut(child).add_revision(revision.clone());
                    if visited.insert(key) {
                        queue.push_back((child, revision));
                    }
                }
            }
        }
        Ok(())
    }
}

fn trigger_for(revision: &NodeRevision) -> Option<Trigger> {
    match revision {
        NodeRevision::Pipeline(p) => Some(Trigger::Pipeline {
            pipeline: p.pipeline.clone(),
            counter: p.counter,
        }),
        NodeRevision::Material(m) => m.latest_revision().map(|revision| Trigger::Material {
            fingerprint: m.material.fingerprint(),
            revision: revision.clone(),
        }),
    }
}

/// Fills in the latest attempt of every stage for each pipeline revision.
pub struct RunStagesPopulator {
    history: Arc<dyn RunHistory>,
}

impl RunStagesPopulator {
    pub fn new(history: Arc<dyn RunHistory>) -> Self {
        Self { history }
    }

    pub async fn populate(&self, map: &mut ValueStreamMap) -> Result<()> {
        for (id, index, revision) in pipeline_revisions(map) {
            let runs = self
                .history
                .stage_runs(&revision.pipeline, revision.counter)
                .await?;

            let mut latest: Vec<StageOutcome> = Vec::new();
            for run in runs {
                match latest.iter_mut().find(|s| s.name == run.name) {
                    Some(existing) if existing.counter <= run.counter => {
                        existing.counter = run.counter;
                        existing.result = run.result;
                    }
                    Some(_) => {}
                    None => latest.push(StageOutcome {
                        name: run.name,
                        counter: run.counter,
                        result: run.result,
                    }),
                }
            }

            if let NodeRevision::Pipeline(p) = &mut map.node_mut(id).revisions[index] {
                p.stages = latest;
            }
        }
        Ok(())
    }
}

/// Appends configured stages a run never reached, so every revision shows
/// the whole pipeline.
pub struct UnrunStagesPopulator {
    config: Arc<dyn PipelineConfigSource>,
}

impl UnrunStagesPopulator {
    pub fn new(config: Arc<dyn PipelineConfigSource>) -> Self {
        Self { config }
    }

    pub async fn populate(&self, map: &mut ValueStreamMap) -> Result<()> {
        for (id, index, revision) in pipeline_revisions(map) {
            let Some(config) = self.config.find_pipeline(&revision.pipeline).await? else {
                continue;
            };
            if let NodeRevision::Pipeline(p) = &mut map.node_mut(id).revisions[index] {
                for stage in &config.stages {
                    if !p.stages.iter().any(|s| s.name == *stage) {
                        p.stages.push(StageOutcome {
                            name: stage.clone(),
                            counter: 0,
                            result: StageResult::NotRun,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Every pipeline revision with its node and position, cloned so the map
/// can be mutated while iterating.
fn pipeline_revisions(map: &ValueStreamMap) -> Vec<(NodeId, usize, PipelineRevision)> {
    map.node_ids()
        .flat_map(|id| {
            map.node(id)
                .revisions
                .iter()
                .enumerate()
                .filter_map(move |(index, revision)| match revision {
                    NodeRevision::Pipeline(p) => Some((id, index, p.clone())),
                    NodeRevision::Material(_) => None,
                })
        })
        .collect()
}
