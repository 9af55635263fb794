use std::collections::VecDeque;

use ahash::AHashMap;
use slotmap::{SecondaryMap, SlotMap};

// ------------------------------------------------------------------ //
// ----- SampleNode
slotmap::new_key_type! {
    pub struct SampleId;
}

/// A sample of the relatedness graph.
/// - `label`    : sample identifier
/// - `column`   : 0-based VCF column index of the sample
/// - `call_rate`: fraction of non-missing calls of the sample
#[derive(Debug, Clone)]
pub struct SampleNode {
    pub id       : SampleId,
    pub label    : String,
    pub column   : usize,
    pub call_rate: f64,
    neighbours   : Vec<(SampleId, f64)>,
}

impl SampleNode {
    /// Adjacent samples, along with the coefficient of the edge leading to them.
    pub fn neighbours(&self) -> impl Iterator<Item = &(SampleId, f64)> {
        self.neighbours.iter()
    }

    /// Strongest coefficient over all the edges of this node.
    #[must_use]
    pub fn strongest_edge(&self) -> Option<f64> {
        self.neighbours.iter().map(|(_, coefficient)| *coefficient).reduce(f64::max)
    }

    #[must_use]
    pub fn is_isolated(&self) -> bool {
        self.neighbours.is_empty()
    }
}

// ------------------------------------------------------------------ //
// ----- RelatednessGraph

/// Undirected graph of samples, where every edge joins two samples related above a given threshold.
/// Nodes live in an arena, and are iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RelatednessGraph {
    nodes : SlotMap<SampleId, SampleNode>,
    order : Vec<SampleId>,
    labels: AHashMap<String, SampleId>,
    edges : usize,
}

impl RelatednessGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample, or return the id of the sample already carrying this label.
    pub fn add_sample(&mut self, label: &str, column: usize, call_rate: f64) -> SampleId {
        if let Some(id) = self.labels.get(label) {
            return *id
        }
        let id = self.nodes.insert_with_key(|id| SampleNode {
            id, label: label.to_string(), column, call_rate, neighbours: Vec::new()
        });
        self.order.push(id);
        self.labels.insert(label.to_string(), id);
        id
    }

    /// Join two samples. Self-loops and unknown ids are rejected (returns `false`).
    pub fn add_edge(&mut self, a: SampleId, b: SampleId, coefficient: f64) -> bool {
        if a == b || !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            return false
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(node) = self.nodes.get_mut(from) {
                node.neighbours.push((to, coefficient));
            }
        }
        self.edges += 1;
        true
    }

    #[must_use]
    pub fn get(&self, id: SampleId) -> Option<&SampleNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn id(&self, label: &str) -> Option<SampleId> {
        self.labels.get(label).copied()
    }

    /// Nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &SampleNode> {
        self.order.iter().filter_map(|id| self.nodes.get(*id))
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn n_edges(&self) -> usize {
        self.edges
    }

    /// Connected components, found through a breadth-first search started from every
    /// unvisited node in insertion order. Nodes of a component are listed in visiting order.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<SampleId>> {
        let mut visited: SecondaryMap<SampleId, ()> = SecondaryMap::with_capacity(self.nodes.len());
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for start in &self.order {
            if visited.insert(*start, ()).is_some() {
                continue
            }
            let mut component = Vec::new();
            queue.push_back(*start);
            while let Some(id) = queue.pop_front() {
                component.push(id);
                let Some(node) = self.nodes.get(id) else { continue };
                for (neighbour, _) in node.neighbours() {
                    if visited.insert(*neighbour, ()).is_none() {
                        queue.push_back(*neighbour);
                    }
                }
            }
            components.push(component);
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(graph: &RelatednessGraph, component: &[SampleId]) -> Vec<String> {
        component.iter().filter_map(|id| graph.get(*id)).map(|node| node.label.clone()).collect()
    }

    #[test]
    fn add_sample_is_idempotent() {
        let mut graph = RelatednessGraph::new();
        let a = graph.add_sample("NA12878", 0, 0.9);
        let again = graph.add_sample("NA12878", 3, 0.1);
        assert_eq!(a, again);
        assert_eq!(graph.n_nodes(), 1);
        assert_eq!(graph.get(a).map(|node| node.column), Some(0));
    }

    #[test]
    fn reject_self_loops() {
        let mut graph = RelatednessGraph::new();
        let a = graph.add_sample("A", 0, 1.0);
        assert!(!graph.add_edge(a, a, 1.0));
        assert_eq!(graph.n_edges(), 0);
    }

    #[test]
    fn components() {
        let mut graph = RelatednessGraph::new();
        let ids: Vec<SampleId> = ["A", "B", "C", "D", "E", "F"].iter().enumerate()
            .map(|(i, label)| graph.add_sample(label, i, 1.0))
            .collect();
        // A - C - E   B   D - F
        graph.add_edge(ids[0], ids[2], 0.5);
        graph.add_edge(ids[4], ids[2], 0.6);
        graph.add_edge(ids[3], ids[5], 0.9);

        let components = graph.components();
        let got: Vec<Vec<String>> = components.iter().map(|c| labels(&graph, c)).collect();
        assert_eq!(got, vec![vec!["A", "C", "E"], vec!["B"], vec!["D", "F"]]);
        assert_eq!(graph.n_edges(), 3);

        let c = graph.get(ids[2]).expect("C exists");
        assert_eq!(c.strongest_edge(), Some(0.6));
        assert!(graph.get(ids[1]).is_some_and(SampleNode::is_isolated));
    }
}
