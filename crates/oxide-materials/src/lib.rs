//! Material synchronization planning for Oxide CI.
//!
//! Turns a material and a target revision into a [`SyncStep`] tree that an
//! agent executes to bring its working copy to exactly that revision.

pub mod config;
pub mod git;
pub mod hg;
pub mod render;
pub mod simulate;
pub mod step;

#[cfg(test)]
mod testing;

pub use config::{Depth, PlannerConfig};
pub use render::render;
pub use simulate::{Effect, SyncOracle, simulate};
pub use step::{Action, Guard, SyncStep};

use oxide_core::material::Material;
use oxide_core::revision::RevisionContext;
use oxide_core::work::Work;
use std::path::Path;
use tracing::debug;

/// Plans working-copy synchronization for every material kind.
#[derive(Debug, Clone, Default)]
pub struct MaterialPlanner {
    config: PlannerConfig,
}

impl MaterialPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Tree for one material, checked out under `base_dir` in its folder.
    pub fn plan(&self, material: &Material, base_dir: &Path, revision: &RevisionContext) -> SyncStep {
        let dir = match material.folder() {
            Some(folder) => base_dir.join(folder),
            None => base_dir.to_path_buf(),
        };
        debug!(
            material = %material.display_name(),
            revision = %revision.latest_revision().short(),
            dir = %dir.display(),
            "Planning material sync"
        );

        match material {
            Material::Git(git) => git::plan(git, &dir, revision, &self.config),
            Material::Hg(hg) => hg::plan(hg, &dir, revision, &self.config),
            // Upstream artifacts are fetched by the job itself
            Material::Dependency(_) => SyncStep::compose(vec![]),
        }
    }

    /// One tree per material of a unit of work, in material order.
    pub fn plan_work(&self, work: &Work, base_dir: &Path) -> SyncStep {
        let Work::Build(build) = work else {
            return SyncStep::compose(vec![]);
        };

        let mut steps = vec![SyncStep::mkdirs(base_dir)];
        steps.extend(
            build
                .materials
                .iter()
                .map(|sync| self.plan(&sync.material, base_dir, &sync.revision)),
        );
        SyncStep::compose(steps)
    }
}
