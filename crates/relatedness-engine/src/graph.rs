use crate::topology::GraphTopology;
use std::collections::{HashMap, VecDeque};

/// Outcome of inserting an edge into a [`ConceptGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    Added,
    /// The ordered pair already had an edge; the existing label was kept.
    Duplicate,
    /// Source or destination is not a node (e.g. an inactive concept).
    MissingEndpoint,
}

/// A directed concept graph with interned concept ids and relation labels.
///
/// Nodes are addressed internally by dense `u32` indices assigned in
/// insertion order; the public API speaks concept id strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptGraph {
    pub(crate) topology: GraphTopology,
    pub(crate) ids: Vec<String>,
    pub(crate) index: HashMap<String, u32>,
    pub(crate) labels: Vec<String>,
    pub(crate) label_index: HashMap<String, u32>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a concept node, returning its index. Idempotent.
    pub fn add_concept(&mut self, concept_id: &str) -> u32 {
        if let Some(&idx) = self.index.get(concept_id) {
            return idx;
        }
        let idx = self.topology.add_node();
        self.ids.push(concept_id.to_string());
        self.index.insert(concept_id.to_string(), idx);
        idx
    }

    /// Adds `source -> destination` labelled with `relation_type`.
    /// Both endpoints must already be nodes.
    pub fn add_edge(&mut self, source: &str, destination: &str, relation_type: &str) -> EdgeInsert {
        let (Some(src), Some(dst)) = (self.node(source), self.node(destination)) else {
            return EdgeInsert::MissingEndpoint;
        };
        if self.topology.contains_edge(src, dst) {
            return EdgeInsert::Duplicate;
        }
        let label = self.intern_label(relation_type);
        self.topology.add_edge(src, dst, label);
        EdgeInsert::Added
    }

    fn intern_label(&mut self, relation_type: &str) -> u32 {
        if let Some(&id) = self.label_index.get(relation_type) {
            return id;
        }
        let id = self.labels.len() as u32;
        self.labels.push(relation_type.to_string());
        self.label_index.insert(relation_type.to_string(), id);
        id
    }

    pub fn node(&self, concept_id: &str) -> Option<u32> {
        self.index.get(concept_id).copied()
    }

    pub fn concept_id(&self, node: u32) -> Option<&str> {
        self.ids.get(node as usize).map(String::as_str)
    }

    pub fn contains(&self, concept_id: &str) -> bool {
        self.index.contains_key(concept_id)
    }

    pub fn node_count(&self) -> usize {
        self.topology.num_nodes()
    }

    pub fn edge_count(&self) -> usize {
        self.topology.num_edges()
    }

    /// Direct targets of `node` (parents in the IS-A graph).
    pub fn parents(&self, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.topology.successors(node).map(|(target, _)| target)
    }

    /// Direct sources pointing at `node` (children in the IS-A graph).
    pub fn children(&self, node: u32) -> impl Iterator<Item = u32> + '_ {
        self.topology.predecessors(node)
    }

    pub fn has_edge(&self, source: &str, destination: &str) -> bool {
        match (self.node(source), self.node(destination)) {
            (Some(src), Some(dst)) => self.topology.contains_edge(src, dst),
            _ => false,
        }
    }

    /// Relation type id labelling `source -> destination`.
    pub fn edge_label(&self, source: &str, destination: &str) -> Option<&str> {
        let src = self.node(source)?;
        let dst = self.node(destination)?;
        self.topology
            .successors(src)
            .find(|&(target, _)| target == dst)
            .and_then(|(_, label)| self.labels.get(label as usize))
            .map(String::as_str)
    }

    pub fn concept_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.ids.iter().map(String::as_str)
    }

    /// All edges as `(source, destination, relation_type)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &str)> + '_ {
        self.topology.out.iter().enumerate().flat_map(move |(src, targets)| {
            targets.iter().map(move |&(dst, label)| {
                (
                    self.ids[src].as_str(),
                    self.ids[dst as usize].as_str(),
                    self.labels[label as usize].as_str(),
                )
            })
        })
    }

    pub fn relation_types(&self) -> &[String] {
        &self.labels
    }

    /// Kahn's algorithm over outgoing edges; true when no cycle exists.
    pub fn is_acyclic(&self) -> bool {
        let n = self.node_count();
        let mut pending: Vec<usize> = (0..n as u32).map(|v| self.children(v).count()).collect();
        let mut queue: VecDeque<u32> = (0..n as u32).filter(|&v| pending[v as usize] == 0).collect();
        let mut visited = 0usize;

        while let Some(node) = queue.pop_front() {
            visited += 1;
            for parent in self.parents(node) {
                let count = &mut pending[parent as usize];
                *count -= 1;
                if *count == 0 {
                    queue.push_back(parent);
                }
            }
        }

        visited == n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_pairs_keep_first_label() {
        let mut graph = ConceptGraph::new();
        graph.add_concept("100");
        graph.add_concept("200");

        assert_eq!(graph.add_edge("100", "200", "116680003"), EdgeInsert::Added);
        assert_eq!(graph.add_edge("100", "200", "363698007"), EdgeInsert::Duplicate);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_label("100", "200"), Some("116680003"));
    }

    #[test]
    fn edges_need_both_endpoints() {
        let mut graph = ConceptGraph::new();
        graph.add_concept("100");
        assert_eq!(graph.add_edge("100", "999", "116680003"), EdgeInsert::MissingEndpoint);
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.contains("999"));
    }

    #[test]
    fn detects_cycles() {
        let mut graph = ConceptGraph::new();
        for id in ["1", "2", "3"] {
            graph.add_concept(id);
        }
        graph.add_edge("1", "2", "116680003");
        graph.add_edge("2", "3", "116680003");
        assert!(graph.is_acyclic());

        graph.add_edge("3", "1", "116680003");
        assert!(!graph.is_acyclic());
    }

    #[test]
    fn children_mirror_parents() {
        let mut graph = ConceptGraph::new();
        let child = graph.add_concept("10");
        let parent = graph.add_concept("20");
        graph.add_edge("10", "20", "116680003");

        assert_eq!(graph.parents(child).collect::<Vec<_>>(), vec![parent]);
        assert_eq!(graph.children(parent).collect::<Vec<_>>(), vec![child]);
        assert_eq!(
            graph.edges().collect::<Vec<_>>(),
            vec![("10", "20", "116680003")]
        );
    }
}
