//! A fake working copy for simulating planned trees.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::simulate::{Effect, SyncOracle};

/// Models one repository directory, its remote, branch and clone depth.
/// `target_depth` is the history depth needed to reach the target revision.
pub struct FakeRepo {
    root: PathBuf,
    remote: String,
    branch: String,
    target_depth: u32,
    /// `None` for a full clone.
    depth: Option<u32>,
    dirs: HashSet<PathBuf>,
    files: HashSet<PathBuf>,
}

impl FakeRepo {
    pub fn new(remote: &str, branch: &str, target_depth: u32) -> Self {
        Self {
            root: PathBuf::from("/work/app"),
            remote: remote.to_string(),
            branch: branch.to_string(),
            target_depth,
            depth: None,
            dirs: HashSet::new(),
            files: HashSet::new(),
        }
    }

    pub fn at(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// An existing git clone. Depth 0 means a full clone.
    pub fn cloned_with_depth(mut self, depth: u32) -> Self {
        let root = self.root.clone();
        self.clone_into(&root, if depth == 0 { None } else { Some(depth) });
        self
    }

    /// An existing mercurial clone.
    pub fn hg_clone(mut self) -> Self {
        self.dirs.insert(self.root.clone());
        self.dirs.insert(self.root.join(".hg"));
        self
    }

    /// A directory that is not a repository.
    pub fn not_a_repository(mut self) -> Self {
        self.dirs.insert(self.root.clone());
        self
    }

    pub fn with_submodules(mut self) -> Self {
        self.files.insert(self.root.join(".gitmodules"));
        self
    }

    pub fn is_shallow(&self) -> bool {
        self.files.contains(&self.root.join(".git").join("shallow"))
    }

    fn clone_into(&mut self, dir: &Path, depth: Option<u32>) {
        self.root = dir.to_path_buf();
        self.dirs.insert(dir.to_path_buf());
        self.dirs.insert(dir.join(".git"));
        self.depth = depth;
        if depth.is_some() {
            self.files.insert(dir.join(".git").join("shallow"));
        }
    }

    fn reachable(&self) -> bool {
        self.depth.is_none_or(|d| d >= self.target_depth)
    }
}

impl SyncOracle for FakeRepo {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn output(&mut self, _program: &str, args: &[String], _dir: Option<&Path>) -> String {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["config", "remote.origin.url"] | ["paths", "default"] => self.remote.clone(),
            ["rev-parse", "--abbrev-ref", "HEAD"] => self.branch.clone(),
            ["cat-file", "-t", _] if self.reachable() => "commit\n".to_string(),
            _ => String::new(),
        }
    }

    fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::CleanDir(path) => {
                self.dirs.retain(|d| !d.starts_with(path));
                self.files.retain(|f| !f.starts_with(path));
            }
            Effect::Run { program, args, .. } => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                match (program.as_str(), args.as_slice()) {
                    ("git", ["clone", rest @ ..]) => {
                        let depth = rest
                            .iter()
                            .find_map(|a| a.strip_prefix("--depth="))
                            .and_then(|d| d.parse().ok());
                        if let Some(branch) = rest.iter().find_map(|a| a.strip_prefix("--branch=")) {
                            self.branch = branch.to_string();
                        }
                        if let [.., url, dir] = rest {
                            self.remote = url.to_string();
                            self.clone_into(Path::new(dir), depth);
                        }
                    }
                    ("git", ["fetch", "origin", "--unshallow"]) => {
                        self.depth = None;
                        let shallow = self.root.join(".git").join("shallow");
                        self.files.remove(&shallow);
                    }
                    ("git", ["fetch", "origin", depth]) => {
                        if let Some(n) = depth
                            .strip_prefix("--depth=")
                            .and_then(|d| d.parse::<u32>().ok())
                        {
                            self.depth = self.depth.map(|current| current.max(n));
                        }
                    }
                    ("hg", ["clone", "-b", branch, url, dir]) => {
                        self.branch = branch.to_string();
                        self.remote = url.to_string();
                        self.root = PathBuf::from(dir);
                        self.dirs.insert(PathBuf::from(dir));
                        self.dirs.insert(Path::new(dir).join(".hg"));
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}
