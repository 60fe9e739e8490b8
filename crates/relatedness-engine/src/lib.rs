pub mod topology {
    use serde::{Deserialize, Serialize};

    /// Concept graph topology represented as adjacency lists in both
    /// directions. Outgoing lists follow child -> parent (or focus ->
    /// attribute value) edges; incoming lists are kept for descendant walks.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct GraphTopology {
        /// Adjacency list: NodeID -> Vec<(TargetID, RelationTypeID)>
        pub out: Vec<Vec<(u32, u32)>>,
        /// Reverse adjacency list: NodeID -> Vec<SourceID>
        pub inc: Vec<Vec<u32>>,
    }

    impl GraphTopology {
        pub fn new() -> Self {
            Self {
                out: Vec::new(),
                inc: Vec::new(),
            }
        }

        pub fn num_nodes(&self) -> usize {
            self.out.len()
        }

        pub fn num_edges(&self) -> usize {
            self.out.iter().map(|targets| targets.len()).sum()
        }

        /// Targets of a node's outgoing edges with their relation type.
        pub fn successors(&self, node_id: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
            self.out
                .get(node_id as usize)
                .into_iter()
                .flatten()
                .copied()
        }

        /// Sources of a node's incoming edges.
        pub fn predecessors(&self, node_id: u32) -> impl Iterator<Item = u32> + '_ {
            self.inc
                .get(node_id as usize)
                .into_iter()
                .flatten()
                .copied()
        }

        pub fn add_node(&mut self) -> u32 {
            let id = self.out.len() as u32;
            self.out.push(Vec::new());
            self.inc.push(Vec::new());
            id
        }

        pub fn contains_edge(&self, src: u32, dst: u32) -> bool {
            self.successors(src).any(|(target, _)| target == dst)
        }

        /// Adds `src -> dst`. Returns false when either endpoint is unknown or
        /// the ordered pair already has an edge (the first label is kept).
        pub fn add_edge(&mut self, src: u32, dst: u32, relation_type: u32) -> bool {
            if src as usize >= self.out.len() || dst as usize >= self.out.len() {
                return false;
            }
            if self.contains_edge(src, dst) {
                return false;
            }
            self.out[src as usize].push((dst, relation_type));
            self.inc[dst as usize].push(src);
            true
        }
    }
}

pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod lca;
pub mod matrix;
pub mod measures;
pub mod persistence;
pub mod service;
pub mod taxonomy;

#[cfg(test)]
mod test_fixtures;

pub use config::EngineConfig;
pub use error::{RelatednessError, Result};
pub use graph::ConceptGraph;
pub use lca::{AncestorCache, LcaResolver, PathLength};
pub use measures::Measure;
pub use persistence::GraphVariant;
pub use service::{OntologyGraphs, OntologyService};
pub use taxonomy::TaxonomyIndex;
