use std::collections::{BTreeMap, HashMap};

use arbor_protocol::NodeId;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};

use crate::relation::RelationRef;

/// Directed multigraph over tree nodes, governor to dependent; one ordered
/// pair may carry several relation labels.
#[derive(Debug, Clone, Default)]
pub struct DependencyMultiGraph {
    graph: Graph<NodeId, RelationRef, Directed>,
    index_map: HashMap<NodeId, NodeIndex>,
}

impl DependencyMultiGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn vertex(&mut self, node: NodeId) -> NodeIndex {
        let graph = &mut self.graph;
        *self
            .index_map
            .entry(node)
            .or_insert_with(|| graph.add_node(node))
    }

    /// Adds a labeled edge; a label already on the pair is not repeated.
    pub fn add(&mut self, governor: NodeId, dependent: NodeId, relation: RelationRef) {
        let from = self.vertex(governor);
        let to = self.vertex(dependent);
        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|e| *e.weight() == relation);
        if !exists {
            self.graph.add_edge(from, to, relation);
        }
    }

    pub fn contains_edge(&self, governor: NodeId, dependent: NodeId) -> bool {
        match (self.index_map.get(&governor), self.index_map.get(&dependent)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Distinct governors of `dependent`.
    pub fn parents(&self, dependent: NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.index_map.get(&dependent) else {
            return Vec::new();
        };
        let mut out: Vec<NodeId> = Vec::new();
        for e in self.graph.edges_directed(idx, Direction::Incoming) {
            let gov = self.graph[e.source()];
            if !out.contains(&gov) {
                out.push(gov);
            }
        }
        out
    }

    pub fn has_parent(&self, dependent: NodeId) -> bool {
        !self.parents(dependent).is_empty()
    }

    /// True if a directed path leads from `from` to `to`.
    pub fn has_path(&self, from: NodeId, to: NodeId) -> bool {
        match (self.index_map.get(&from), self.index_map.get(&to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every (governor, dependent) pair with its labels, ordered by node ids;
    /// labels are sorted by name.
    pub fn edge_groups(&self) -> Vec<(NodeId, NodeId, Vec<RelationRef>)> {
        let mut groups: BTreeMap<(NodeId, NodeId), Vec<RelationRef>> = BTreeMap::new();
        for e in self.graph.edge_references() {
            let key = (self.graph[e.source()], self.graph[e.target()]);
            groups.entry(key).or_default().push(e.weight().clone());
        }
        groups
            .into_iter()
            .map(|((gov, dep), mut labels)| {
                labels.sort();
                (gov, dep, labels)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::{dependent, root};

    #[test]
    fn test_labels_are_not_repeated() {
        let mut g = DependencyMultiGraph::new();
        g.add(NodeId(1), NodeId(2), dependent());
        g.add(NodeId(1), NodeId(2), dependent());
        g.add(NodeId(1), NodeId(2), root());
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.parents(NodeId(2)), vec![NodeId(1)]);
        assert!(g.contains_edge(NodeId(1), NodeId(2)));
        assert!(!g.contains_edge(NodeId(2), NodeId(1)));

        let groups = g.edge_groups();
        assert_eq!(groups.len(), 1);
        let names: Vec<String> = groups[0].2.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, vec!["dep", "root"]);
    }

    #[test]
    fn test_paths() {
        let mut g = DependencyMultiGraph::new();
        g.add(NodeId(1), NodeId(2), dependent());
        g.add(NodeId(2), NodeId(3), dependent());
        assert!(g.has_path(NodeId(1), NodeId(3)));
        assert!(!g.has_path(NodeId(3), NodeId(1)));
        assert!(!g.has_path(NodeId(1), NodeId(9)));
        assert!(!g.has_parent(NodeId(1)));
        assert!(g.has_parent(NodeId(3)));
    }
}
