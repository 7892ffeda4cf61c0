//! Index-keyed relationship graph
//!
//! Nodes are person indices into the organized result list. Edges are stored
//! once and referenced from both endpoints' adjacency lists.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::classify::RelationshipCategory;
use super::indicators::RelationshipIndicator;
use crate::candidate::name_key;

/// Undirected link between two persons. `person_a_index < person_b_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub person_a: String,
    pub person_b: String,
    pub person_a_index: usize,
    pub person_b_index: usize,
    pub indicators: BTreeSet<RelationshipIndicator>,
    pub strength: f64,
    pub category: RelationshipCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_a: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_b: Option<u32>,
}

impl RelationshipEdge {
    /// The endpoint opposite `node`, if `node` is on this edge
    pub fn other(&self, node: usize) -> Option<usize> {
        if node == self.person_a_index {
            Some(self.person_b_index)
        } else if node == self.person_b_index {
            Some(self.person_a_index)
        } else {
            None
        }
    }
}

/// A person reached from a traversal start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Associate {
    pub index: usize,
    pub name: String,
    pub depth: usize,
}

/// Relationships grouped for output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipsOutput {
    pub categories: BTreeMap<RelationshipCategory, Vec<RelationshipEdge>>,
    pub total_edges: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipGraph {
    nodes: Vec<String>,
    edges: Vec<RelationshipEdge>,
    /// Per node: indices into `edges`
    adjacency: Vec<Vec<usize>>,
}

impl RelationshipGraph {
    pub fn new(nodes: Vec<String>) -> Self {
        let adjacency = vec![Vec::new(); nodes.len()];
        Self {
            nodes,
            edges: Vec::new(),
            adjacency,
        }
    }

    pub fn add_edge(&mut self, edge: RelationshipEdge) {
        let idx = self.edges.len();
        self.adjacency[edge.person_a_index].push(idx);
        self.adjacency[edge.person_b_index].push(idx);
        self.edges.push(edge);
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RelationshipEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// First node whose name matches case- and whitespace-insensitively
    pub fn find_node(&self, name: &str) -> Option<usize> {
        let key = name_key(name);
        self.nodes.iter().position(|n| name_key(n) == key)
    }

    /// Adjacent nodes in edge order
    pub fn neighbors(&self, node: usize) -> Vec<usize> {
        self.adjacency
            .get(node)
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|&e| self.edges[e].other(node))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency.get(node).map_or(0, Vec::len)
    }

    /// Edges touching `node`
    pub fn edges_of(&self, node: usize) -> Vec<&RelationshipEdge> {
        self.adjacency
            .get(node)
            .map(|edges| edges.iter().map(|&e| &self.edges[e]).collect())
            .unwrap_or_default()
    }

    pub fn edges_by_category(&self, category: RelationshipCategory) -> Vec<&RelationshipEdge> {
        self.edges
            .iter()
            .filter(|e| e.category == category)
            .collect()
    }

    /// Breadth-first walk from `start`, returning every node reachable within
    /// `max_depth` hops with its hop count. The start node is excluded.
    pub fn associates_at_depth(&self, start: usize, max_depth: usize) -> Vec<Associate> {
        if start >= self.nodes.len() || max_depth == 0 {
            return Vec::new();
        }

        let mut seen = vec![false; self.nodes.len()];
        seen[start] = true;
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut found = Vec::new();

        while let Some((node, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            for next in self.neighbors(node) {
                if seen[next] {
                    continue;
                }
                seen[next] = true;
                found.push(Associate {
                    index: next,
                    name: self.nodes[next].clone(),
                    depth: depth + 1,
                });
                queue.push_back((next, depth + 1));
            }
        }
        found
    }

    /// Group edges by category, keeping edge order within each group
    pub fn to_output(&self) -> RelationshipsOutput {
        let mut categories: BTreeMap<RelationshipCategory, Vec<RelationshipEdge>> =
            BTreeMap::new();
        for edge in &self.edges {
            categories.entry(edge.category).or_default().push(edge.clone());
        }
        RelationshipsOutput {
            categories,
            total_edges: self.edges.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edge(a: usize, b: usize, category: RelationshipCategory) -> RelationshipEdge {
        RelationshipEdge {
            person_a: format!("P{}", a),
            person_b: format!("P{}", b),
            person_a_index: a,
            person_b_index: b,
            indicators: BTreeSet::from([RelationshipIndicator::SamePhone]),
            strength: 0.25,
            category,
            age_a: None,
            age_b: None,
        }
    }

    /// P0 - P1 - P2 - P3, P0 - P4, P5 isolated
    fn chain() -> RelationshipGraph {
        let mut graph = RelationshipGraph::new((0..6).map(|i| format!("P{}", i)).collect());
        graph.add_edge(edge(0, 1, RelationshipCategory::CloseContact));
        graph.add_edge(edge(1, 2, RelationshipCategory::Roommate));
        graph.add_edge(edge(2, 3, RelationshipCategory::CloseContact));
        graph.add_edge(edge(0, 4, RelationshipCategory::PossibleFriend));
        graph
    }

    #[test]
    fn neighbors_and_degree() {
        let graph = chain();
        assert_eq!(graph.neighbors(0), vec![1, 4]);
        assert_eq!(graph.neighbors(1), vec![0, 2]);
        assert_eq!(graph.degree(5), 0);
        assert_eq!(graph.degree(99), 0);
        assert_eq!(graph.find_node(" p3 "), Some(3));
        assert_eq!(graph.find_node("nobody"), None);
    }

    #[test]
    fn bfs_respects_depth() {
        let graph = chain();
        let depth_of = |max: usize| -> Vec<(usize, usize)> {
            graph
                .associates_at_depth(0, max)
                .into_iter()
                .map(|a| (a.index, a.depth))
                .collect()
        };
        assert_eq!(depth_of(1), vec![(1, 1), (4, 1)]);
        assert_eq!(depth_of(2), vec![(1, 1), (4, 1), (2, 2)]);
        assert_eq!(depth_of(10), vec![(1, 1), (4, 1), (2, 2), (3, 3)]);
        assert!(graph.associates_at_depth(0, 0).is_empty());
        assert!(graph.associates_at_depth(5, 3).is_empty());
    }

    #[test]
    fn output_groups_by_category() {
        let graph = chain();
        let output = graph.to_output();
        assert_eq!(output.total_edges, 4);
        assert_eq!(output.categories[&RelationshipCategory::CloseContact].len(), 2);
        assert_eq!(graph.edges_by_category(RelationshipCategory::Roommate).len(), 1);

        let json = serde_json::to_value(&output).unwrap();
        assert!(json["categories"]["possible_friend"].is_array());
    }
}
