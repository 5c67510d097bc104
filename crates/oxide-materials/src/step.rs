//! The synchronization command tree.
//!
//! A [`SyncStep`] is pure data: it describes what to run and under which
//! condition. Executors interpret guards against the real working copy.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What a step does when its guard holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Run an external program.
    Exec { program: String, args: Vec<String> },
    /// Run children in order.
    Compose { steps: Vec<SyncStep> },
    /// Print a line to the job console.
    Echo { message: String },
    /// Redact `value` as `display` in everything written to the console.
    Secret { value: String, display: String },
    /// Delete a directory tree if present.
    CleanDir { path: PathBuf },
    /// Create a directory and its parents.
    MkDirs { path: PathBuf },
    /// Abort the whole tree.
    Fail { message: String },
}

/// Condition evaluated by the executor before running a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum Guard {
    DirExists { path: PathBuf },
    DirMissing { path: PathBuf },
    FileExists { path: PathBuf },
    FileMissing { path: PathBuf },
    /// Trimmed output of `probe` equals `expected`.
    Equals { expected: String, probe: Box<SyncStep> },
    /// Trimmed output of `probe` differs from `expected`.
    NotEquals { expected: String, probe: Box<SyncStep> },
    All { guards: Vec<Guard> },
}

impl Guard {
    pub fn dir_exists(path: impl Into<PathBuf>) -> Self {
        Guard::DirExists { path: path.into() }
    }

    pub fn dir_missing(path: impl Into<PathBuf>) -> Self {
        Guard::DirMissing { path: path.into() }
    }

    pub fn file_exists(path: impl Into<PathBuf>) -> Self {
        Guard::FileExists { path: path.into() }
    }

    pub fn file_missing(path: impl Into<PathBuf>) -> Self {
        Guard::FileMissing { path: path.into() }
    }

    pub fn equals(expected: impl Into<String>, probe: SyncStep) -> Self {
        Guard::Equals {
            expected: expected.into(),
            probe: Box::new(probe),
        }
    }

    pub fn not_equals(expected: impl Into<String>, probe: SyncStep) -> Self {
        Guard::NotEquals {
            expected: expected.into(),
            probe: Box::new(probe),
        }
    }

    pub fn all(guards: Vec<Guard>) -> Self {
        Guard::All { guards }
    }

    fn probes_mut(&mut self) -> Vec<&mut SyncStep> {
        match self {
            Guard::Equals { probe, .. } | Guard::NotEquals { probe, .. } => vec![probe.as_mut()],
            Guard::All { guards } => guards.iter_mut().flat_map(Guard::probes_mut).collect(),
            _ => vec![],
        }
    }
}

/// One node of the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStep {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Guard>,
}

impl SyncStep {
    fn new(action: Action) -> Self {
        Self {
            action,
            working_dir: None,
            guard: None,
        }
    }

    pub fn exec(program: impl Into<String>, args: &[&str]) -> Self {
        Self::new(Action::Exec {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    pub fn compose(steps: Vec<SyncStep>) -> Self {
        Self::new(Action::Compose { steps })
    }

    pub fn echo(message: impl Into<String>) -> Self {
        Self::new(Action::Echo {
            message: message.into(),
        })
    }

    pub fn secret(value: impl Into<String>, display: impl Into<String>) -> Self {
        Self::new(Action::Secret {
            value: value.into(),
            display: display.into(),
        })
    }

    pub fn clean_dir(path: impl Into<PathBuf>) -> Self {
        Self::new(Action::CleanDir { path: path.into() })
    }

    pub fn mkdirs(path: impl Into<PathBuf>) -> Self {
        Self::new(Action::MkDirs { path: path.into() })
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Action::Fail {
            message: message.into(),
        })
    }

    /// Append an argument to an `Exec` step. Other steps are unchanged.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        if let Action::Exec { args, .. } = &mut self.action {
            args.push(arg.into());
        }
        self
    }

    /// Only run this step when `guard` holds.
    pub fn run_if(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Set the working directory of this node only.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the working directory of this node, and of every descendant and
    /// guard probe that has none of its own.
    pub fn in_dir_recursive(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.working_dir = Some(dir.to_path_buf());
        self.fill_working_dir(dir);
        self
    }

    fn fill_working_dir(&mut self, dir: &Path) {
        if self.working_dir.is_none() {
            self.working_dir = Some(dir.to_path_buf());
        }
        if let Some(guard) = &mut self.guard {
            for probe in guard.probes_mut() {
                probe.fill_working_dir(dir);
            }
        }
        if let Action::Compose { steps } = &mut self.action {
            for step in steps {
                step.fill_working_dir(dir);
            }
        }
    }

    pub fn children(&self) -> &[SyncStep] {
        match &self.action {
            Action::Compose { steps } => steps,
            _ => &[],
        }
    }

    /// Pre-order walk over this node and its descendants, not including probes.
    pub fn walk(&self) -> Vec<&SyncStep> {
        let mut nodes = vec![self];
        for child in self.children() {
            nodes.extend(child.walk());
        }
        nodes
    }

    /// Every `Exec` reachable from this node, including guard probes.
    pub fn commands(&self) -> Vec<&SyncStep> {
        fn guard_commands<'a>(guard: &'a Guard, out: &mut Vec<&'a SyncStep>) {
            match guard {
                Guard::Equals { probe, .. } | Guard::NotEquals { probe, .. } => {
                    out.extend(probe.commands())
                }
                Guard::All { guards } => guards.iter().for_each(|g| guard_commands(g, out)),
                _ => {}
            }
        }

        let mut out = Vec::new();
        for node in self.walk() {
            if let Some(guard) = &node.guard {
                guard_commands(guard, &mut out);
            }
            if matches!(node.action, Action::Exec { .. }) {
                out.push(node);
            }
        }
        out
    }

    /// Program and arguments joined by spaces, for `Exec` steps.
    pub fn command_line(&self) -> Option<String> {
        match &self.action {
            Action::Exec { program, args } => {
                let mut line = program.clone();
                for arg in args {
                    line.push(' ');
                    line.push_str(arg);
                }
                Some(line)
            }
            _ => None,
        }
    }
}
