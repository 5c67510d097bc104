//! Command tree for mercurial working copies.

use oxide_core::material::HgMaterial;
use oxide_core::revision::RevisionContext;
use std::path::Path;

use crate::config::PlannerConfig;
use crate::step::{Guard, SyncStep};

pub fn plan(
    material: &HgMaterial,
    dir: &Path,
    revision: &RevisionContext,
    config: &PlannerConfig,
) -> SyncStep {
    let url = material.repository_url();
    let branch = material.branch();
    let target = revision.latest_revision().as_str();
    let prefix = &config.console_prefix;
    let hg_dir = dir.join(".hg");

    SyncStep::compose(vec![
        SyncStep::echo(format!(
            "{prefix} Start updating {} at revision {} from {}",
            dir.display(),
            target,
            url.for_display()
        )),
        SyncStep::secret(url.for_command_line(), url.for_display()),
        SyncStep::clean_dir(dir)
            .run_if(Guard::all(vec![Guard::dir_exists(dir), Guard::dir_missing(&hg_dir)])),
        SyncStep::clean_dir(dir).run_if(Guard::all(vec![
            Guard::dir_exists(&hg_dir),
            Guard::not_equals(
                url.for_command_line(),
                SyncStep::exec("hg", &["paths", "default"]).in_dir(dir),
            ),
        ])),
        SyncStep::exec("hg", &["clone", "-b", branch.as_str()])
            .arg(url.for_command_line())
            .arg(dir.display().to_string())
            .run_if(Guard::dir_missing(&hg_dir)),
        SyncStep::compose(vec![
            SyncStep::exec("hg", &["pull", "-b", branch.as_str(), "--config"])
                .arg(format!("paths.default={}", url.for_command_line())),
            SyncStep::exec("hg", &["update", "--clean", "-r", target]),
            SyncStep::exec("hg", &["--config", "extensions.purge=", "purge", "--all"]),
        ])
        .in_dir_recursive(dir),
        SyncStep::echo(format!("{prefix} Done.")),
    ])
}
