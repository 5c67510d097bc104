//! The value stream map: pipelines and materials linked by dependency edges.

use oxide_core::ids::{Fingerprint, PipelineName};
use oxide_core::material::{Material, MaterialKind};
use oxide_core::revision::MaterialRevision;
use oxide_core::run::StageResult;
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

pub type NodeId = NodeIndex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Pipeline,
    Material {
        kind: MaterialKind,
        /// Names pipelines give this material.
        material_names: BTreeSet<String>,
    },
    /// Layout filler between nodes more than one level apart.
    Dummy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    #[default]
    Normal,
    Warning,
    Deleted,
}

/// Outcome of the latest attempt of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub name: String,
    pub counter: u32,
    pub result: StageResult,
}

/// A concrete pipeline run reaching a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRevision {
    pub pipeline: PipelineName,
    pub counter: u32,
    pub label: String,
    pub stages: Vec<StageOutcome>,
}

impl PipelineRevision {
    pub fn new(pipeline: PipelineName, counter: u32, label: impl Into<String>) -> Self {
        Self {
            pipeline,
            counter,
            label: label.into(),
            stages: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeRevision {
    Pipeline(PipelineRevision),
    Material(MaterialRevision),
}

impl NodeRevision {
    /// Revision identity used to compare what reached a node.
    pub fn latest(&self) -> Option<String> {
        match self {
            NodeRevision::Pipeline(p) => Some(format!("{}/{}", p.pipeline.key(), p.counter)),
            NodeRevision::Material(m) => m.latest_revision().map(|r| r.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Lowercased pipeline name, material fingerprint or dummy id.
    pub key: String,
    pub name: String,
    pub kind: NodeKind,
    pub level: i32,
    pub revisions: Vec<NodeRevision>,
    pub view: ViewType,
    pub message: Option<String>,
}

impl Node {
    fn new(key: String, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            key,
            name: name.into(),
            kind,
            level: 0,
            revisions: vec![],
            view: ViewType::Normal,
            message: None,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.kind == NodeKind::Dummy
    }

    pub fn is_pipeline(&self) -> bool {
        self.kind == NodeKind::Pipeline
    }

    pub fn pipeline_revisions(&self) -> impl Iterator<Item = &PipelineRevision> {
        self.revisions.iter().filter_map(|r| match r {
            NodeRevision::Pipeline(p) => Some(p),
            NodeRevision::Material(_) => None,
        })
    }

    pub(crate) fn add_revision(&mut self, revision: NodeRevision) {
        if !self.revisions.contains(&revision) {
            self.revisions.push(revision);
        }
    }
}

/// Lineage graph of one pipeline run or one material revision.
///
/// Edges point from upstream to downstream. Nodes are never removed, so a
/// [`NodeId`] stays valid for the lifetime of the map.
#[derive(Debug, Clone)]
pub struct ValueStreamMap {
    pub(crate) graph: DiGraph<Node, ()>,
    index: HashMap<String, NodeId>,
    current_pipeline: Option<NodeId>,
    current_material: Option<NodeId>,
    dummies: usize,
}

impl ValueStreamMap {
    /// Map centred on a pipeline run.
    pub fn for_pipeline(name: &PipelineName, revision: Option<PipelineRevision>) -> Self {
        let mut map = Self::empty();
        let id = map.pipeline_node(name);
        if let Some(revision) = revision {
            map.graph[id].add_revision(NodeRevision::Pipeline(revision));
        }
        map.current_pipeline = Some(id);
        map
    }

    /// Map centred on a material revision.
    pub fn for_material(material: &Material, revision: Option<MaterialRevision>) -> Self {
        let mut map = Self::empty();
        let id = map.material_node(material);
        if let Some(revision) = revision {
            map.graph[id].add_revision(NodeRevision::Material(revision));
        }
        map.current_material = Some(id);
        map
    }

    fn empty() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            current_pipeline: None,
            current_material: None,
            dummies: 0,
        }
    }

    pub fn current_pipeline(&self) -> Option<NodeId> {
        self.current_pipeline
    }

    pub fn current_material(&self) -> Option<NodeId> {
        self.current_material
    }

    /// The node the map is centred on.
    pub fn current(&self) -> Option<NodeId> {
        self.current_pipeline.or(self.current_material)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.graph[id]
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    pub fn find_pipeline(&self, name: &PipelineName) -> Option<NodeId> {
        self.index.get(&name.key()).copied()
    }

    pub fn find_material(&self, fingerprint: &Fingerprint) -> Option<NodeId> {
        self.index.get(fingerprint.as_str()).copied()
    }

    /// Look a node up by key: pipeline name (any case) or fingerprint.
    pub fn find_node(&self, key: &str) -> Option<NodeId> {
        self.index
            .get(key)
            .or_else(|| self.index.get(&key.to_ascii_lowercase()))
            .copied()
    }

    /// Parents in insertion order.
    pub fn parents(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Children in insertion order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: NodeId, direction: Direction) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.graph.neighbors_directed(id, direction).collect();
        ids.sort();
        ids
    }

    /// Nodes without parents.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.node_ids()
            .filter(|&id| {
                self.graph
                    .neighbors_directed(id, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    /// Add (or reuse) an upstream pipeline of `child`.
    pub fn add_upstream_node(
        &mut self,
        name: &PipelineName,
        revision: Option<PipelineRevision>,
        child: NodeId,
    ) -> NodeId {
        let id = self.pipeline_node(name);
        if let Some(revision) = revision {
            self.graph[id].add_revision(NodeRevision::Pipeline(revision));
        }
        self.connect(id, child);
        id
    }

    /// Add (or reuse) an upstream material of `child`.
    pub fn add_upstream_material_node(
        &mut self,
        material: &Material,
        child: NodeId,
        revision: Option<MaterialRevision>,
    ) -> NodeId {
        let id = self.material_node(material);
        if let Some(revision) = revision {
            self.graph[id].add_revision(NodeRevision::Material(revision));
        }
        self.connect(id, child);
        id
    }

    /// Add (or reuse) a downstream pipeline of `parent`.
    pub fn add_downstream_node(&mut self, name: &PipelineName, parent: NodeId) -> NodeId {
        let id = self.pipeline_node(name);
        self.connect(parent, id);
        id
    }

    pub fn mark_deleted(&mut self, id: NodeId) {
        let node = &mut self.graph[id];
        node.view = ViewType::Deleted;
        node.message = Some("Pipeline has been deleted.".to_string());
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Flag the current pipeline when one of its parents reached it through
    /// more than one distinct latest revision.
    pub fn add_warning_if_built_from_incompatible_revisions(&mut self) {
        let Some(current) = self.current_pipeline else {
            return;
        };

        let incompatible = self.parents(current).into_iter().find(|&parent| {
            let latest: BTreeSet<String> = self.graph[parent]
                .revisions
                .iter()
                .filter_map(NodeRevision::latest)
                .collect();
            latest.len() > 1
        });

        if let Some(parent) = incompatible {
            let message = format!(
                "Built from more than one revision of {}.",
                self.graph[parent].name
            );
            let node = &mut self.graph[current];
            node.view = ViewType::Warning;
            node.message = Some(message);
        }
    }

    pub(crate) fn add_dummy(&mut self, level: i32) -> NodeId {
        self.dummies += 1;
        let key = format!("dummy-{}", self.dummies);
        let mut node = Node::new(key.clone(), "", NodeKind::Dummy);
        node.level = level;
        let id = self.graph.add_node(node);
        self.index.insert(key, id);
        id
    }

    pub(crate) fn connect(&mut self, parent: NodeId, child: NodeId) {
        if self.graph.find_edge(parent, child).is_none() {
            self.graph.add_edge(parent, child, ());
        }
    }

    pub(crate) fn disconnect(&mut self, parent: NodeId, child: NodeId) {
        if let Some(edge) = self.graph.find_edge(parent, child) {
            self.graph.remove_edge(edge);
        }
    }

    fn pipeline_node(&mut self, name: &PipelineName) -> NodeId {
        let key = name.key();
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self
            .graph
            .add_node(Node::new(key.clone(), name.as_str(), NodeKind::Pipeline));
        self.index.insert(key, id);
        id
    }

    fn material_node(&mut self, material: &Material) -> NodeId {
        let key = material.fingerprint().as_str().to_string();
        let id = match self.index.get(&key) {
            Some(&id) => id,
            None => {
                let kind = NodeKind::Material {
                    kind: material.kind(),
                    material_names: BTreeSet::new(),
                };
                let id = self
                    .graph
                    .add_node(Node::new(key.clone(), material.display_name(), kind));
                self.index.insert(key, id);
                id
            }
        };
        if let (Some(name), NodeKind::Material { material_names, .. }) =
            (material.name(), &mut self.graph[id].kind)
        {
            material_names.insert(name.to_string());
        }
        id
    }
}
