//! Material descriptors: the source-control inputs of a pipeline.

use crate::ids::{Fingerprint, PipelineName};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

const FINGERPRINT_DELIMITER: &str = "<|>";
const MASKED_PASSWORD: &str = "******";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    Git,
    Hg,
    Dependency,
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialKind::Git => write!(f, "git"),
            MaterialKind::Hg => write!(f, "hg"),
            MaterialKind::Dependency => write!(f, "dependency"),
        }
    }
}

/// A resolved material. Immutable once built.
///
/// Only kinds with a synchronization planner are accepted; other `type` tags
/// fail to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Material {
    Git(GitMaterial),
    Hg(HgMaterial),
    Dependency(DependencyMaterial),
}

impl Material {
    pub fn kind(&self) -> MaterialKind {
        match self {
            Material::Git(_) => MaterialKind::Git,
            Material::Hg(_) => MaterialKind::Hg,
            Material::Dependency(_) => MaterialKind::Dependency,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Material::Git(m) => m.fingerprint(),
            Material::Hg(m) => m.fingerprint(),
            Material::Dependency(m) => m.fingerprint(),
        }
    }

    /// Destination folder relative to the job's working directory.
    pub fn folder(&self) -> Option<&str> {
        match self {
            Material::Git(m) => m.folder.as_deref(),
            Material::Hg(m) => m.folder.as_deref(),
            Material::Dependency(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Material::Git(m) => m.name.as_deref(),
            Material::Hg(m) => m.name.as_deref(),
            Material::Dependency(m) => Some(m.pipeline.as_str()),
        }
    }

    /// Human-readable form with credentials masked.
    pub fn display_name(&self) -> String {
        match self {
            Material::Git(m) => m.url.for_display(),
            Material::Hg(m) => m.url.for_display(),
            Material::Dependency(m) => format!("{} [{}]", m.pipeline, m.stage),
        }
    }
}

/// A URL that may carry credentials. Never printed unmasked.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UrlArgument(String);

impl UrlArgument {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// The raw value, for use as a command argument only.
    pub fn for_command_line(&self) -> &str {
        &self.0
    }

    pub fn for_display(&self) -> String {
        let password = Url::parse(&self.0)
            .ok()
            .and_then(|url| url.password().map(str::to_string));
        match password {
            Some(password) if !password.is_empty() => self.0.replacen(
                &format!(":{password}@"),
                &format!(":{MASKED_PASSWORD}@"),
                1,
            ),
            _ => self.0.clone(),
        }
    }
}

impl fmt::Debug for UrlArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UrlArgument").field(&self.for_display()).finish()
    }
}

impl fmt::Display for UrlArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.for_display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GitMaterial {
    pub url: UrlArgument,
    #[serde(default = "default_git_branch")]
    pub branch: String,
    #[serde(default)]
    pub shallow_clone: bool,
    #[serde(default)]
    pub submodule_folder: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Paths ignored when detecting modifications.
    #[serde(default)]
    pub filter: Vec<String>,
}

fn default_git_branch() -> String {
    "master".to_string()
}

impl GitMaterial {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: UrlArgument::new(url),
            branch: default_git_branch(),
            shallow_clone: false,
            submodule_folder: None,
            folder: None,
            name: None,
            filter: vec![],
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_shallow_clone(mut self, shallow: bool) -> Self {
        self.shallow_clone = shallow;
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let mut parts = vec![
            "type=GitMaterial".to_string(),
            format!("url={}", self.url.for_command_line()),
            format!("branch={}", self.branch),
        ];
        if let Some(ref folder) = self.submodule_folder {
            parts.push(format!("submoduleFolder={folder}"));
        }
        digest(&parts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HgMaterial {
    /// Repository URL, optionally suffixed with `##branch`.
    pub url: UrlArgument,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub filter: Vec<String>,
}

impl HgMaterial {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: UrlArgument::new(url),
            branch: None,
            folder: None,
            name: None,
            filter: vec![],
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Branch from the explicit field, then the `##branch` URL suffix, then `default`.
    pub fn branch(&self) -> String {
        if let Some(ref branch) = self.branch {
            return branch.clone();
        }
        match self.url.for_command_line().split_once("##") {
            Some((_, branch)) if !branch.is_empty() => branch.to_string(),
            _ => "default".to_string(),
        }
    }

    /// Repository URL without the branch suffix.
    pub fn repository_url(&self) -> UrlArgument {
        let raw = self.url.for_command_line();
        let url = raw.split_once("##").map(|(url, _)| url).unwrap_or(raw);
        UrlArgument::new(url)
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let mut parts = vec![
            "type=HgMaterial".to_string(),
            format!("url={}", self.url.for_command_line()),
        ];
        if let Some(ref branch) = self.branch {
            parts.push(format!("branch={branch}"));
        }
        digest(&parts)
    }
}

/// Output of another pipeline's stage used as an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DependencyMaterial {
    pub pipeline: PipelineName,
    pub stage: String,
}

impl DependencyMaterial {
    pub fn new(pipeline: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            pipeline: PipelineName::new(pipeline),
            stage: stage.into(),
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        digest(&[
            "type=DependencyMaterial".to_string(),
            format!("pipelineName={}", self.pipeline.key()),
            format!("stageName={}", self.stage.to_ascii_lowercase()),
        ])
    }
}

fn digest(parts: &[String]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(parts.join(FINGERPRINT_DELIMITER).as_bytes());
    Fingerprint::new(format!("{:x}", hasher.finalize()))
}
