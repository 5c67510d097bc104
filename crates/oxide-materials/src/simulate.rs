//! Dry-run interpretation of a command tree.

use std::path::{Path, PathBuf};

use crate::step::{Action, Guard, SyncStep};

/// Something an executor did while walking the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Run {
        program: String,
        args: Vec<String>,
        working_dir: Option<PathBuf>,
    },
    Echo(String),
    CleanDir(PathBuf),
    MkDirs(PathBuf),
    Fail(String),
}

/// Answers the questions an executor asks the agent's file system.
pub trait SyncOracle {
    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    /// Output of a probe command.
    fn output(&mut self, program: &str, args: &[String], working_dir: Option<&Path>) -> String;

    /// Observe an effect so that later guards see its outcome.
    fn apply(&mut self, effect: &Effect) {
        let _ = effect;
    }
}

/// Walk `step` the way an executor would and return what ran, in order.
///
/// Secrets are not effects. A `Fail` step ends the walk.
pub fn simulate(step: &SyncStep, oracle: &mut dyn SyncOracle) -> Vec<Effect> {
    let mut effects = Vec::new();
    run(step, oracle, &mut effects);
    effects
}

/// Returns false once the walk must stop.
fn run(step: &SyncStep, oracle: &mut dyn SyncOracle, effects: &mut Vec<Effect>) -> bool {
    if let Some(guard) = &step.guard {
        if !holds(guard, oracle) {
            return true;
        }
    }

    let effect = match &step.action {
        Action::Compose { steps } => {
            return steps.iter().all(|child| run(child, oracle, effects));
        }
        Action::Secret { .. } => return true,
        Action::Exec { program, args } => Effect::Run {
            program: program.clone(),
            args: args.clone(),
            working_dir: step.working_dir.clone(),
        },
        Action::Echo { message } => Effect::Echo(message.clone()),
        Action::CleanDir { path } => Effect::CleanDir(path.clone()),
        Action::MkDirs { path } => Effect::MkDirs(path.clone()),
        Action::Fail { message } => {
            effects.push(Effect::Fail(message.clone()));
            return false;
        }
    };

    oracle.apply(&effect);
    effects.push(effect);
    true
}

fn holds(guard: &Guard, oracle: &mut dyn SyncOracle) -> bool {
    match guard {
        Guard::DirExists { path } => oracle.is_dir(path),
        Guard::DirMissing { path } => !oracle.is_dir(path),
        Guard::FileExists { path } => oracle.is_file(path),
        Guard::FileMissing { path } => !oracle.is_file(path),
        Guard::Equals { expected, probe } => probe_output(probe, oracle) == *expected,
        Guard::NotEquals { expected, probe } => probe_output(probe, oracle) != *expected,
        Guard::All { guards } => guards.iter().all(|g| holds(g, oracle)),
    }
}

fn probe_output(probe: &SyncStep, oracle: &mut dyn SyncOracle) -> String {
    match &probe.action {
        Action::Exec { program, args } => oracle
            .output(program, args, probe.working_dir.as_deref())
            .trim()
            .to_string(),
        _ => String::new(),
    }
}
