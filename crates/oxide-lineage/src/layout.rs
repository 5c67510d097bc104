//! Level assignment and dummy nodes for rendering.

use oxide_core::{Error, Result};
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::visit::Dfs;
use petgraph::visit::Reversed;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use crate::graph::{NodeId, NodeKind, NodeRevision, ValueStreamMap, ViewType};

/// Owned, levelled view of a laid out map.
#[derive(Debug, Clone, Serialize)]
pub struct PresentationModel {
    pub current_pipeline: Option<String>,
    pub current_material: Option<String>,
    /// Lowest level first.
    pub levels: Vec<Vec<PresentedNode>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresentedNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub level: i32,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub revisions: Vec<NodeRevision>,
    pub view: ViewType,
    pub message: Option<String>,
}

impl ValueStreamMap {
    /// Assign levels, then split every edge spanning more than one level.
    pub fn layout(&mut self) -> Result<()> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            Error::CyclicDependency(self.node(cycle.node_id()).name.clone())
        })?;
        self.assign_levels(&order);
        self.insert_dummy_nodes();
        Ok(())
    }

    /// Current node at 0, upstream at one less than its lowest child,
    /// downstream at one more than its highest parent.
    fn assign_levels(&mut self, order: &[NodeId]) {
        let Some(current) = self.current() else {
            return;
        };
        let upstream = self.reachable(current, Direction::Incoming);
        let downstream = self.reachable(current, Direction::Outgoing);
        let mut levels: HashMap<NodeId, i32> = HashMap::from([(current, 0)]);

        for &id in order.iter().rev().filter(|id| upstream.contains(id)) {
            let level = self
                .children(id)
                .iter()
                .filter_map(|child| levels.get(child))
                .min()
                .map_or(0, |lowest| lowest - 1);
            levels.insert(id, level);
        }

        for &id in order.iter().filter(|id| downstream.contains(id)) {
            let level = self
                .parents(id)
                .iter()
                .filter(|parent| **parent == current || downstream.contains(parent))
                .filter_map(|parent| levels.get(parent))
                .max()
                .map_or(0, |highest| highest + 1);
            levels.insert(id, level);
        }

        for (id, level) in levels {
            self.node_mut(id).level = level;
        }
    }

    /// Nodes reachable from `start` in `direction`, excluding `start`.
    fn reachable(&self, start: NodeId, direction: Direction) -> HashSet<NodeId> {
        let mut found = HashSet::new();
        match direction {
            Direction::Outgoing => {
                let mut dfs = Dfs::new(&self.graph, start);
                while let Some(id) = dfs.next(&self.graph) {
                    found.insert(id);
                }
            }
            Direction::Incoming => {
                let reversed = Reversed(&self.graph);
                let mut dfs = Dfs::new(reversed, start);
                while let Some(id) = dfs.next(reversed) {
                    found.insert(id);
                }
            }
        }
        found.remove(&start);
        found
    }

    /// Depth first from the roots. A gap is closed one level at a time by
    /// continuing the walk from each inserted dummy.
    fn insert_dummy_nodes(&mut self) {
        let mut visited = HashSet::new();
        let mut stack: Vec<NodeId> = self.root_nodes().into_iter().rev().collect();
        let mut inserted = 0;

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let level = self.node(id).level;
            for child in self.children(id).into_iter().rev() {
                if self.node(child).level - level > 1 {
                    let dummy = self.add_dummy(level + 1);
                    self.disconnect(id, child);
                    self.connect(id, dummy);
                    self.connect(dummy, child);
                    inserted += 1;
                    stack.push(dummy);
                } else {
                    stack.push(child);
                }
            }
        }

        if inserted > 0 {
            debug!(dummies = inserted, "Inserted dummy nodes");
        }
    }

    /// Node ids grouped by level, lowest level first, insertion order within a level.
    pub fn nodes_at_each_level(&self) -> Vec<Vec<NodeId>> {
        let mut levels: BTreeMap<i32, Vec<NodeId>> = BTreeMap::new();
        for id in self.node_ids() {
            levels.entry(self.node(id).level).or_default().push(id);
        }
        levels.into_values().collect()
    }

    pub fn presentation_model(&self) -> PresentationModel {
        let key = |id: NodeId| self.node(id).key.clone();
        let levels = self
            .nodes_at_each_level()
            .into_iter()
            .map(|ids| {
                ids.into_iter()
                    .map(|id| {
                        let node = self.node(id);
                        PresentedNode {
                            id: node.key.clone(),
                            name: node.name.clone(),
                            kind: node.kind.clone(),
                            level: node.level,
                            parents: self.parents(id).into_iter().map(key).collect(),
                            children: self.children(id).into_iter().map(key).collect(),
                            revisions: node.revisions.clone(),
                            view: node.view,
                            message: node.message.clone(),
                        }
                    })
                    .collect()
            })
            .collect();

        PresentationModel {
            current_pipeline: self.current_pipeline().map(key),
            current_material: self.current_material().map(key),
            levels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_core::ids::PipelineName;
    use oxide_core::material::{GitMaterial, HgMaterial, Material};
    use pretty_assertions::assert_eq;

    fn name(s: &str) -> PipelineName {
        PipelineName::new(s)
    }

    /// Real node names per level, and dummy count per level.
    fn shape(map: &ValueStreamMap) -> Vec<(Vec<String>, usize)> {
        map.nodes_at_each_level()
            .into_iter()
            .map(|ids| {
                let dummies = ids.iter().filter(|&&id| map.node(id).is_dummy()).count();
                let names = ids
                    .into_iter()
                    .filter(|&id| !map.node(id).is_dummy())
                    .map(|id| map.node(id).name.clone())
                    .collect();
                (names, dummies)
            })
            .collect()
    }

    fn level(names: &[&str], dummies: usize) -> (Vec<String>, usize) {
        (names.iter().map(|s| s.to_string()).collect(), dummies)
    }

    fn assert_edges_span_one_level(map: &ValueStreamMap) {
        for id in map.node_ids() {
            for child in map.children(id) {
                assert_eq!(map.node(child).level - map.node(id).level, 1);
            }
        }
    }

    #[test]
    fn test_single_pipeline_is_one_level() {
        let mut map = ValueStreamMap::for_pipeline(&name("P1"), None);
        map.layout().unwrap();
        assert_eq!(shape(&map), vec![level(&["P1"], 0)]);
    }

    #[test]
    fn test_upstream_material_sits_one_level_lower() {
        let mut map = ValueStreamMap::for_pipeline(&name("P1"), None);
        let current = map.current().unwrap();
        let git = map.add_upstream_material_node(
            &Material::Git(GitMaterial::new("git")),
            current,
            None,
        );
        map.layout().unwrap();

        assert_eq!(map.node(git).level, -1);
        assert_eq!(shape(&map), vec![level(&["git"], 0), level(&["P1"], 0)]);
    }

    #[test]
    fn test_levels_are_sorted() {
        let mut map = ValueStreamMap::for_pipeline(&name("P1"), None);
        let current = map.current().unwrap();
        let d1 = map.add_upstream_node(&name("d1"), None, current);
        let d2 = map.add_upstream_node(&name("d2"), None, current);
        map.add_upstream_node(&name("d3"), None, d1);
        map.add_upstream_node(&name("d3"), None, d2);
        map.layout().unwrap();

        assert_eq!(
            shape(&map),
            vec![level(&["d3"], 0), level(&["d1", "d2"], 0), level(&["P1"], 0)]
        );
    }

    #[test]
    fn test_downstream_triangle_gets_a_dummy() {
        //  +------> p2 ---> p3
        //  p1                ^
        //  +-----------------+
        let mut map = ValueStreamMap::for_pipeline(&name("p1"), None);
        let p1 = map.current().unwrap();
        map.add_downstream_node(&name("p3"), p1);
        map.layout().unwrap();
        assert_eq!(shape(&map), vec![level(&["p1"], 0), level(&["p3"], 0)]);

        let p2 = map.add_downstream_node(&name("p2"), p1);
        map.add_downstream_node(&name("p3"), p2);
        map.layout().unwrap();

        assert_eq!(
            shape(&map),
            vec![level(&["p1"], 0), level(&["p2"], 1), level(&["p3"], 0)]
        );
        assert_edges_span_one_level(&map);
    }

    #[test]
    fn test_full_value_stream_layout() {
        //  git-trunk  git-plugins-->plugins ---->acceptance---->deploy-go03---> publish --->deploy-go01
        //          \             /                 ^ ^   \                                    ^
        //           \          /                   | |    +-->deploy-go02---------------------+
        //  hg-trunk--->cruise +--------------------+ |
        //    +---------------------------------------+
        let git_trunk = Material::Git(GitMaterial::new("git-trunk"));
        let hg_trunk = Material::Hg(HgMaterial::new("hg-trunk"));

        let mut map = ValueStreamMap::for_pipeline(&name("acceptance"), None);
        let acceptance = map.current().unwrap();
        let plugins = map.add_upstream_node(&name("plugins"), None, acceptance);
        map.add_upstream_node(&name("git-plugins"), None, plugins);
        let cruise = map.add_upstream_node(&name("cruise"), None, plugins);
        map.add_upstream_material_node(&git_trunk, cruise, None);
        map.add_upstream_material_node(&hg_trunk, cruise, None);
        map.add_upstream_node(&name("cruise"), None, acceptance);
        map.add_upstream_material_node(&hg_trunk, acceptance, None);

        let go03 = map.add_downstream_node(&name("deploy-go03"), acceptance);
        let publish = map.add_downstream_node(&name("publish"), go03);
        map.add_downstream_node(&name("deploy-go01"), publish);
        let go02 = map.add_downstream_node(&name("deploy-go02"), acceptance);
        map.add_downstream_node(&name("deploy-go01"), go02);

        assert_eq!(map.root_nodes().len(), 3);
        map.layout().unwrap();

        assert_eq!(
            shape(&map),
            vec![
                level(&["git-trunk", "hg-trunk"], 0),
                level(&["git-plugins", "cruise"], 1),
                level(&["plugins"], 2),
                level(&["acceptance"], 0),
                level(&["deploy-go03", "deploy-go02"], 0),
                level(&["publish"], 1),
                level(&["deploy-go01"], 0),
            ]
        );
        assert_edges_span_one_level(&map);
    }

    #[test]
    fn test_three_level_gap_gets_two_dummies() {
        let mut map = ValueStreamMap::for_pipeline(&name("p0"), None);
        let p0 = map.current().unwrap();
        let a = map.add_downstream_node(&name("a"), p0);
        let b = map.add_downstream_node(&name("b"), a);
        let c = map.add_downstream_node(&name("c"), b);
        map.add_downstream_node(&name("c"), p0);
        map.layout().unwrap();

        assert_eq!(map.node(c).level, 3);
        let dummies: Vec<i32> = map
            .node_ids()
            .filter(|&id| map.node(id).is_dummy())
            .map(|id| map.node(id).level)
            .collect();
        assert_eq!(dummies, vec![1, 2]);
        assert!(!map.children(p0).contains(&c));
        assert_edges_span_one_level(&map);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let mut map = ValueStreamMap::for_pipeline(&name("p0"), None);
        let p0 = map.current().unwrap();
        let a = map.add_downstream_node(&name("a"), p0);
        let b = map.add_downstream_node(&name("b"), a);
        map.add_downstream_node(&name("b"), p0);
        map.layout().unwrap();
        let first = shape(&map);
        map.layout().unwrap();

        assert_eq!(shape(&map), first);
        assert_eq!(map.node(b).level, 2);
    }

    #[test]
    fn test_layout_rejects_cycles() {
        let mut map = ValueStreamMap::for_pipeline(&name("a"), None);
        let a = map.current().unwrap();
        let b = map.add_downstream_node(&name("b"), a);
        map.add_downstream_node(&name("a"), b);

        assert!(matches!(map.layout(), Err(Error::CyclicDependency(_))));
    }

    #[test]
    fn test_presentation_model_uses_keys() {
        let mut map = ValueStreamMap::for_pipeline(&name("Build"), None);
        let current = map.current().unwrap();
        map.add_downstream_node(&name("Deploy"), current);
        map.layout().unwrap();

        let model = map.presentation_model();
        assert_eq!(model.current_pipeline.as_deref(), Some("build"));
        assert_eq!(model.levels.len(), 2);
        assert_eq!(model.levels[0][0].children, vec!["deploy"]);
        assert_eq!(model.levels[1][0].name, "Deploy");

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["levels"][1][0]["kind"]["type"], "pipeline");
    }
}
