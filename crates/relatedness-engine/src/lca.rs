//! Lowest-common-ancestor search over concept graphs.
//!
//! Distances are hop counts through a common ancestor: for concepts `a` and
//! `b`, the minimum over all shared ancestors `x` of `hops(a, x) + hops(b, x)`.
//! Multiple parents are handled by breadth-first search, so every ancestor is
//! recorded with its shortest hop count.

use crate::graph::ConceptGraph;
use dashmap::DashMap;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ancestor node -> minimum hop count from the origin (origin itself at 0).
pub type AncestorMap = HashMap<u32, u32>;

/// Length of the shortest path through a common ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathLength {
    Hops(u32),
    /// No common ancestor, or a concept is absent from the graph.
    Unreachable,
}

impl PathLength {
    pub fn hops(&self) -> Option<u32> {
        match self {
            PathLength::Hops(h) => Some(*h),
            PathLength::Unreachable => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, PathLength::Hops(_))
    }

    /// Hop count as a float, or `penalty` when unreachable.
    pub fn or_penalty(self, penalty: f64) -> f64 {
        match self {
            PathLength::Hops(h) => h as f64,
            PathLength::Unreachable => penalty,
        }
    }

    fn from_option(hops: Option<u32>) -> Self {
        hops.map_or(PathLength::Unreachable, PathLength::Hops)
    }
}

/// A common ancestor achieving the minimum hop sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lca {
    pub node: u32,
    pub hops_a: u32,
    pub hops_b: u32,
}

impl Lca {
    pub fn distance(&self) -> u32 {
        self.hops_a + self.hops_b
    }
}

/// Sizes of the reflexive ancestor sets of two concepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AncestorOverlap {
    pub shared: usize,
    pub union: usize,
}

impl AncestorOverlap {
    pub fn symmetric_difference(&self) -> usize {
        self.union - self.shared
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memoized ancestor maps keyed by origin node.
///
/// Safe to share between threads. Keys are node indices of one specific
/// graph; use one cache per graph.
#[derive(Debug, Default)]
pub struct AncestorCache {
    entries: DashMap<u32, Arc<AncestorMap>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AncestorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&self, node: u32, compute: F) -> Arc<AncestorMap>
    where
        F: FnOnce() -> AncestorMap,
    {
        if let Some(entry) = self.entries.get(&node) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(entry.value());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = Arc::new(compute());
        // Another thread may have raced us here; keep whichever landed first.
        Arc::clone(self.entries.entry(node).or_insert(computed).value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

/// Breadth-first walk along outgoing edges recording minimum hop counts.
pub fn compute_ancestors(graph: &ConceptGraph, start: u32) -> AncestorMap {
    let mut hops = AncestorMap::new();
    let mut queue = VecDeque::new();
    hops.insert(start, 0);
    queue.push_back((start, 0u32));

    while let Some((node, dist)) = queue.pop_front() {
        for parent in graph.parents(node) {
            if let Entry::Vacant(slot) = hops.entry(parent) {
                slot.insert(dist + 1);
                queue.push_back((parent, dist + 1));
            }
        }
    }

    hops
}

/// LCA-based distance queries against one graph and its cache.
#[derive(Clone, Copy)]
pub struct LcaResolver<'a> {
    graph: &'a ConceptGraph,
    cache: &'a AncestorCache,
}

impl<'a> LcaResolver<'a> {
    pub fn new(graph: &'a ConceptGraph, cache: &'a AncestorCache) -> Self {
        Self { graph, cache }
    }

    pub fn graph(&self) -> &'a ConceptGraph {
        self.graph
    }

    pub fn ancestors(&self, node: u32) -> Arc<AncestorMap> {
        self.cache
            .get_or_compute(node, || compute_ancestors(self.graph, node))
    }

    /// Distance by concept id. Absent concepts are unreachable.
    pub fn distance(&self, a: &str, b: &str) -> PathLength {
        match (self.graph.node(a), self.graph.node(b)) {
            (Some(a), Some(b)) => self.distance_nodes(a, b),
            _ => PathLength::Unreachable,
        }
    }

    /// Minimum of both search directions. Each directed search already
    /// minimizes over every shared ancestor, so the reverse search only runs
    /// when the forward one finds none.
    pub fn distance_nodes(&self, a: u32, b: u32) -> PathLength {
        if a == b {
            return PathLength::Hops(0);
        }
        PathLength::from_option(
            self.directed_distance(a, b)
                .or_else(|| self.directed_distance(b, a)),
        )
    }

    /// Uses the cached ancestor map of `origin` and scans upward from
    /// `target` level by level, stopping once the level reaches the best sum.
    pub fn directed_distance(&self, origin: u32, target: u32) -> Option<u32> {
        let origin_ancestors = self.ancestors(origin);
        let mut best: Option<u32> = None;
        let mut seen = HashSet::from([target]);
        let mut frontier = vec![target];
        let mut level = 0u32;

        while !frontier.is_empty() {
            if best.is_some_and(|b| b <= level) {
                break;
            }
            for node in &frontier {
                if let Some(&hops) = origin_ancestors.get(node) {
                    let sum = hops + level;
                    best = Some(best.map_or(sum, |b| b.min(sum)));
                }
            }

            let mut next = Vec::new();
            for &node in &frontier {
                for parent in self.graph.parents(node) {
                    if seen.insert(parent) {
                        next.push(parent);
                    }
                }
            }
            frontier = next;
            level += 1;
        }

        best
    }

    /// Every common ancestor achieving the minimum hop sum, ordered by node.
    pub fn lowest_common_ancestors(&self, a: u32, b: u32) -> Vec<Lca> {
        let ancestors_a = self.ancestors(a);
        let ancestors_b = self.ancestors(b);
        let (small, large, swapped) = if ancestors_a.len() <= ancestors_b.len() {
            (&ancestors_a, &ancestors_b, false)
        } else {
            (&ancestors_b, &ancestors_a, true)
        };

        let mut best = u32::MAX;
        let mut found: Vec<Lca> = Vec::new();
        for (&node, &h_small) in small.iter() {
            let Some(&h_large) = large.get(&node) else {
                continue;
            };
            let (hops_a, hops_b) = if swapped {
                (h_large, h_small)
            } else {
                (h_small, h_large)
            };
            let sum = hops_a + hops_b;
            if sum < best {
                best = sum;
                found.clear();
            }
            if sum == best {
                found.push(Lca {
                    node,
                    hops_a,
                    hops_b,
                });
            }
        }

        found.sort_by_key(|lca| lca.node);
        found
    }

    pub fn ancestor_overlap(&self, a: u32, b: u32) -> AncestorOverlap {
        let ancestors_a = self.ancestors(a);
        let ancestors_b = self.ancestors(b);
        let shared = ancestors_a
            .keys()
            .filter(|node| ancestors_b.contains_key(node))
            .count();
        AncestorOverlap {
            shared,
            union: ancestors_a.len() + ancestors_b.len() - shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{toy_graphs, A, C, E, F, G, R, X};

    fn node(graph: &ConceptGraph, id: &str) -> u32 {
        graph.node(id).unwrap()
    }

    #[test]
    fn hand_computed_hop_sums() {
        let graphs = toy_graphs();
        let cache = AncestorCache::new();
        let resolver = LcaResolver::new(&graphs.isa, &cache);

        assert_eq!(resolver.distance(E, F), PathLength::Hops(2));
        assert_eq!(resolver.distance(E, G), PathLength::Hops(4));
        assert_eq!(resolver.distance(R, E), PathLength::Hops(3));
        assert_eq!(resolver.distance(E, E), PathLength::Hops(0));
    }

    #[test]
    fn lca_prefers_minimum_hop_sum() {
        let graphs = toy_graphs();
        let cache = AncestorCache::new();
        let resolver = LcaResolver::new(&graphs.isa, &cache);
        let isa = &graphs.isa;

        let lcas = resolver.lowest_common_ancestors(node(isa, E), node(isa, F));
        assert_eq!(lcas.len(), 1);
        assert_eq!(lcas[0].node, node(isa, C));
        assert_eq!((lcas[0].hops_a, lcas[0].hops_b), (1, 1));

        let lcas = resolver.lowest_common_ancestors(node(isa, E), node(isa, G));
        assert_eq!(lcas[0].node, node(isa, A));
        assert_eq!(lcas[0].distance(), 4);
    }

    #[test]
    fn unreachable_and_unknown_are_not_zero() {
        let graphs = toy_graphs();
        let cache = AncestorCache::new();
        let resolver = LcaResolver::new(&graphs.isa, &cache);

        assert_eq!(resolver.distance(X, E), PathLength::Unreachable);
        assert_eq!(resolver.distance("123456", E), PathLength::Unreachable);
        assert_eq!(PathLength::Unreachable.or_penalty(50.0), 50.0);
    }

    #[test]
    fn relation_graph_shortcuts_through_attributes() {
        let graphs = toy_graphs();
        let cache = AncestorCache::new();
        let resolver = LcaResolver::new(&graphs.rel, &cache);

        // E and G share the attribute value H one hop away from each.
        assert_eq!(resolver.distance(E, G), PathLength::Hops(2));
    }

    #[test]
    fn both_directions_agree() {
        let graphs = toy_graphs();
        let cache = AncestorCache::new();
        let ids: Vec<&str> = graphs.isa.concept_ids().collect();
        for graph in [&graphs.isa, &graphs.rel] {
            cache.clear();
            let resolver = LcaResolver::new(graph, &cache);
            for a in &ids {
                for b in &ids {
                    assert_eq!(resolver.distance(a, b), resolver.distance(b, a), "{a} {b}");
                }
            }
        }
    }

    #[test]
    fn origins_are_cached() {
        let graphs = toy_graphs();
        let cache = AncestorCache::new();
        let resolver = LcaResolver::new(&graphs.isa, &cache);

        // A reachable pair needs only the forward origin's map.
        resolver.distance(E, F);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.len(), 1);

        resolver.distance(E, F);
        resolver.distance(E, G);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);

        // Unreachable pairs search both directions.
        resolver.distance(X, E);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn directed_searches_agree_on_shared_ancestors() {
        let graphs = toy_graphs();
        let cache = AncestorCache::new();
        let resolver = LcaResolver::new(&graphs.isa, &cache);
        let n = graphs.isa.node_count() as u32;

        for a in 0..n {
            for b in 0..n {
                assert_eq!(resolver.directed_distance(a, b), resolver.directed_distance(b, a));
            }
        }
    }

    #[test]
    fn overlap_counts_reflexive_ancestors() {
        let graphs = toy_graphs();
        let cache = AncestorCache::new();
        let resolver = LcaResolver::new(&graphs.isa, &cache);
        let isa = &graphs.isa;

        let overlap = resolver.ancestor_overlap(node(isa, E), node(isa, F));
        assert_eq!(overlap.shared, 3);
        assert_eq!(overlap.union, 6);
        assert_eq!(overlap.symmetric_difference(), 3);
    }
}
