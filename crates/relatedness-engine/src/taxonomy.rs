//! Per-release depth and information-content index over the IS-A graph.
//!
//! Information content is intrinsic (structure-based):
//! `IC(c) = -ln(descendants(c) / descendants(root))`, where descendant counts
//! include the concept itself. Only concepts below the root receive a depth
//! or IC value.

use crate::error::{RelatednessError, Result};
use crate::graph::ConceptGraph;
use rayon::prelude::*;
use std::collections::{HashSet, VecDeque};
use tracing::info;

#[derive(Debug, Clone)]
pub struct TaxonomyIndex {
    root: u32,
    depths: Vec<Option<u32>>,
    max_depth: u32,
    descendants: Vec<u32>,
    information_content: Vec<Option<f64>>,
}

impl TaxonomyIndex {
    pub fn build(graph: &ConceptGraph, root_concept: &str) -> Result<Self> {
        let root = graph
            .node(root_concept)
            .ok_or_else(|| RelatednessError::UnknownConcept(root_concept.to_string()))?;

        let depths = shallowest_depths(graph, root);
        let max_depth = depths.iter().flatten().copied().max().unwrap_or(0);
        let descendants = descendant_counts(graph, &depths);
        let total = descendants[root as usize] as f64;

        let information_content = depths
            .iter()
            .zip(&descendants)
            .map(|(depth, &count)| depth.map(|_| (total / count as f64).ln()))
            .collect();

        let below_root = depths.iter().filter(|d| d.is_some()).count();
        info!(
            concepts = below_root,
            max_depth,
            outside_root = graph.node_count() - below_root,
            "taxonomy index built"
        );

        Ok(Self {
            root,
            depths,
            max_depth,
            descendants,
            information_content,
        })
    }

    pub fn root(&self) -> u32 {
        self.root
    }

    /// Minimum hop count from the root; `None` outside the root's hierarchy.
    pub fn depth(&self, node: u32) -> Option<u32> {
        self.depths.get(node as usize).copied().flatten()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn information_content(&self, node: u32) -> Option<f64> {
        self.information_content.get(node as usize).copied().flatten()
    }

    /// Reflexive descendant count.
    pub fn descendant_count(&self, node: u32) -> u32 {
        self.descendants.get(node as usize).copied().unwrap_or(0)
    }

    /// Number of concepts below (and including) the root.
    pub fn total_concepts(&self) -> u32 {
        self.descendant_count(self.root)
    }
}

/// BFS from the root along incoming (child) edges.
fn shallowest_depths(graph: &ConceptGraph, root: u32) -> Vec<Option<u32>> {
    let mut depths = vec![None; graph.node_count()];
    let mut queue = VecDeque::new();
    depths[root as usize] = Some(0);
    queue.push_back(root);

    while let Some(node) = queue.pop_front() {
        let next = depths[node as usize].unwrap_or(0) + 1;
        for child in graph.children(node) {
            if depths[child as usize].is_none() {
                depths[child as usize] = Some(next);
                queue.push_back(child);
            }
        }
    }

    depths
}

/// Counts, for every node, how many concepts below the root have it as a
/// reflexive ancestor.
fn descendant_counts(graph: &ConceptGraph, depths: &[Option<u32>]) -> Vec<u32> {
    let n = graph.node_count();
    (0..n as u32)
        .into_par_iter()
        .filter(|&node| depths[node as usize].is_some())
        .fold(
            || vec![0u32; n],
            |mut counts, node| {
                let mut seen = HashSet::from([node]);
                let mut stack = vec![node];
                while let Some(current) = stack.pop() {
                    counts[current as usize] += 1;
                    for parent in graph.parents(current) {
                        if seen.insert(parent) {
                            stack.push(parent);
                        }
                    }
                }
                counts
            },
        )
        .reduce(
            || vec![0u32; n],
            |mut acc, part| {
                acc.iter_mut().zip(part).for_each(|(a, b)| *a += b);
                acc
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;

    fn index() -> (crate::service::OntologyGraphs, TaxonomyIndex) {
        let graphs = toy_graphs();
        let index = TaxonomyIndex::build(&graphs.isa, R).unwrap();
        (graphs, index)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn depth_uses_shallowest_parent() {
        let (graphs, index) = index();
        let depth = |id| index.depth(graphs.isa.node(id).unwrap());

        assert_eq!(depth(R), Some(0));
        assert_eq!(depth(A), Some(1));
        assert_eq!(depth(E), Some(3));
        // F is-a B (depth 1) and is-a C (depth 2).
        assert_eq!(depth(F), Some(2));
        assert_eq!(depth(X), None);
        assert_eq!(index.max_depth(), 3);
    }

    #[test]
    fn information_content_from_descendants() {
        let (graphs, index) = index();
        let ic = |id| index.information_content(graphs.isa.node(id).unwrap());

        assert_eq!(index.total_concepts(), 9);
        assert_eq!(ic(R), Some(0.0));
        assert!(close(ic(A).unwrap(), (9.0f64 / 6.0).ln()));
        assert!(close(ic(C).unwrap(), 3.0f64.ln()));
        assert!(close(ic(E).unwrap(), 9.0f64.ln()));
        assert_eq!(ic(X), None);
    }

    #[test]
    fn multi_parent_descendants_are_counted_once() {
        let (graphs, index) = index();
        let count = |id| index.descendant_count(graphs.isa.node(id).unwrap());

        // A reaches F through C only once even though F also has parent B.
        assert_eq!(count(A), 6);
        assert_eq!(count(B), 2);
        assert_eq!(count(C), 3);
    }

    #[test]
    fn unknown_root_is_rejected() {
        let graphs = toy_graphs();
        assert!(matches!(
            TaxonomyIndex::build(&graphs.isa, "1"),
            Err(RelatednessError::UnknownConcept(_))
        ));
    }
}
