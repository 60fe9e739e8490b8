//! Taxonomic and information-content relatedness measures.
//!
//! Every measure is evaluated on the IS-A graph. Where several common
//! ancestors tie on hop sum, depth-based measures use the deepest one and
//! IC-based measures the most informative one.

use crate::error::{RelatednessError, Result};
use crate::graph::ConceptGraph;
use crate::lca::{Lca, LcaResolver, PathLength};
use crate::taxonomy::TaxonomyIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    WuPalmer,
    LeacockChodorow,
    Resnik,
    Lin,
    JiangConrath,
    BatetSanchezValls,
    ChoiKim,
}

/// Whether larger values mean closer (similarity) or farther (dissimilarity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    Similarity,
    Dissimilarity,
}

impl Measure {
    pub const ALL: [Measure; 7] = [
        Measure::WuPalmer,
        Measure::LeacockChodorow,
        Measure::Resnik,
        Measure::Lin,
        Measure::JiangConrath,
        Measure::BatetSanchezValls,
        Measure::ChoiKim,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Measure::WuPalmer => "WuPalmer",
            Measure::LeacockChodorow => "LeacockChodorow",
            Measure::Resnik => "Resnik",
            Measure::Lin => "Lin",
            Measure::JiangConrath => "JiangConrathDissimilarity",
            Measure::BatetSanchezValls => "BatetSanchezValls",
            Measure::ChoiKim => "ChoiKim",
        }
    }

    pub fn kind(&self) -> MeasureKind {
        match self {
            Measure::WuPalmer | Measure::LeacockChodorow | Measure::Resnik | Measure::Lin => {
                MeasureKind::Similarity
            }
            Measure::JiangConrath | Measure::BatetSanchezValls | Measure::ChoiKim => {
                MeasureKind::Dissimilarity
            }
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = RelatednessError;

    /// Case-insensitive; `-`, `_` and spaces are ignored.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' ' | '–'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "wupalmer" => Ok(Measure::WuPalmer),
            "leacockchodorow" => Ok(Measure::LeacockChodorow),
            "resnik" => Ok(Measure::Resnik),
            "lin" => Ok(Measure::Lin),
            "jiangconrath" | "jiangconrathdissimilarity" => Ok(Measure::JiangConrath),
            "batetsanchezvalls" => Ok(Measure::BatetSanchezValls),
            "choikim" => Ok(Measure::ChoiKim),
            _ => Err(RelatednessError::UnsupportedMeasure(s.to_string())),
        }
    }
}

/// Everything a measure needs: the IS-A graph, its index and resolver.
pub struct MeasureContext<'a> {
    graph: &'a ConceptGraph,
    index: &'a TaxonomyIndex,
    resolver: LcaResolver<'a>,
}

impl<'a> MeasureContext<'a> {
    pub fn new(index: &'a TaxonomyIndex, resolver: LcaResolver<'a>) -> Self {
        Self {
            graph: resolver.graph(),
            index,
            resolver,
        }
    }

    pub fn compute(&self, measure: Measure, a: u32, b: u32) -> Result<f64> {
        match measure {
            Measure::WuPalmer => self.wu_palmer(a, b),
            Measure::LeacockChodorow => self.leacock_chodorow(a, b),
            Measure::Resnik => self.resnik(a, b),
            Measure::Lin => self.lin(a, b),
            Measure::JiangConrath => self.jiang_conrath(a, b),
            Measure::BatetSanchezValls => self.batet_sanchez_valls(a, b),
            Measure::ChoiKim => self.choi_kim(a, b),
        }
    }

    fn id(&self, node: u32) -> String {
        self.graph.concept_id(node).unwrap_or_default().to_string()
    }

    fn unreachable(&self, a: u32, b: u32) -> RelatednessError {
        RelatednessError::Unreachable {
            a: self.id(a),
            b: self.id(b),
        }
    }

    fn depth(&self, node: u32) -> Result<u32> {
        self.index
            .depth(node)
            .ok_or_else(|| RelatednessError::NotInHierarchy(self.id(node)))
    }

    fn ic(&self, node: u32) -> Result<f64> {
        self.index
            .information_content(node)
            .ok_or_else(|| RelatednessError::NotInHierarchy(self.id(node)))
    }

    /// Minimum-hop-sum LCA, ties broken by the largest `key`.
    fn lca_by<K, F>(&self, a: u32, b: u32, key: F) -> Result<Lca>
    where
        K: PartialOrd,
        F: Fn(u32) -> K,
    {
        let mut best: Option<(Lca, K)> = None;
        for lca in self.resolver.lowest_common_ancestors(a, b) {
            let k = key(lca.node);
            if best.as_ref().map_or(true, |(_, best_k)| k > *best_k) {
                best = Some((lca, k));
            }
        }
        best.map(|(lca, _)| lca).ok_or_else(|| self.unreachable(a, b))
    }

    fn deepest_lca(&self, a: u32, b: u32) -> Result<Lca> {
        self.lca_by(a, b, |node| self.index.depth(node))
    }

    fn most_informative_lca(&self, a: u32, b: u32) -> Result<Lca> {
        // Option<f64>: None sorts below any IC value.
        self.lca_by(a, b, |node| self.index.information_content(node))
    }

    /// `2·N3 / (N1 + N2 + 2·N3)` with `N3 = depth(lca) + 1` (nodes from the
    /// root to the LCA) and `N1`, `N2` the hops from each concept to that LCA.
    ///
    /// Depths of `a` and `b` are taken along the LCA path rather than their
    /// own shallowest paths: with multiple parents a concept can be shallower
    /// than its LCA, which would push the ratio above 1.
    pub fn wu_palmer(&self, a: u32, b: u32) -> Result<f64> {
        self.depth(a)?;
        self.depth(b)?;
        if a == b {
            return Ok(1.0);
        }
        let lca = self.deepest_lca(a, b)?;
        let n3 = (self.depth(lca.node)? + 1) as f64;
        Ok(2.0 * n3 / (lca.distance() as f64 + 2.0 * n3))
    }

    /// `-ln((len + 1) / (2·maxDepth))`
    pub fn leacock_chodorow(&self, a: u32, b: u32) -> Result<f64> {
        let max_depth = self.index.max_depth();
        if max_depth == 0 {
            return Err(RelatednessError::UndefinedMeasure {
                measure: "LeacockChodorow",
                a: self.id(a),
                b: self.id(b),
                reason: "taxonomy has zero depth",
            });
        }
        let length = match self.resolver.distance_nodes(a, b) {
            PathLength::Hops(h) => h,
            PathLength::Unreachable => return Err(self.unreachable(a, b)),
        };
        Ok(-((length + 1) as f64 / (2 * max_depth) as f64).ln())
    }

    /// `IC(lca)`
    pub fn resnik(&self, a: u32, b: u32) -> Result<f64> {
        let lca = self.most_informative_lca(a, b)?;
        self.ic(lca.node)
    }

    /// `2·IC(lca) / (IC(a) + IC(b))`; undefined when both ICs are zero.
    pub fn lin(&self, a: u32, b: u32) -> Result<f64> {
        let denominator = self.ic(a)? + self.ic(b)?;
        let lca = self.most_informative_lca(a, b)?;
        if denominator == 0.0 {
            return Err(RelatednessError::UndefinedMeasure {
                measure: "Lin",
                a: self.id(a),
                b: self.id(b),
                reason: "both concepts have zero information content",
            });
        }
        Ok(2.0 * self.ic(lca.node)? / denominator)
    }

    /// `IC(a) + IC(b) - 2·IC(lca)`
    pub fn jiang_conrath(&self, a: u32, b: u32) -> Result<f64> {
        let (ic_a, ic_b) = (self.ic(a)?, self.ic(b)?);
        let lca = self.most_informative_lca(a, b)?;
        Ok((ic_a + ic_b - 2.0 * self.ic(lca.node)?).max(0.0))
    }

    /// `log2((|T(a) Δ T(b)| + |T(a) ∩ T(b)|) / |T(a) ∩ T(b)|)` over reflexive
    /// ancestor sets.
    pub fn batet_sanchez_valls(&self, a: u32, b: u32) -> Result<f64> {
        let overlap = self.resolver.ancestor_overlap(a, b);
        if overlap.shared == 0 {
            return Err(self.unreachable(a, b));
        }
        let shared = overlap.shared as f64;
        Ok(((overlap.symmetric_difference() as f64 + shared) / shared).log2())
    }

    /// Hierarchy-concept-tree distance of Choi & Kim, "Topic distillation
    /// using hierarchy concept tree" (SIGIR 2003):
    ///
    /// `ln((L + 1 + N1) / (L + 1)) + ln((L + 1 + N2) / (L + 1))`
    ///
    /// with `L = depth(lca)` and `N1`, `N2` the hops from each concept to the
    /// deepest LCA. Each branch costs the log ratio of the concept's depth to
    /// the LCA's depth (counted in nodes) along the LCA path, so the same hop
    /// count below a shallow ancestor costs more than below a deep one.
    pub fn choi_kim(&self, a: u32, b: u32) -> Result<f64> {
        self.depth(a)?;
        self.depth(b)?;
        if a == b {
            return Ok(0.0);
        }
        let lca = self.deepest_lca(a, b)?;
        let lca_nodes = (self.depth(lca.node)? + 1) as f64;

        let branch = |hops: u32| ((lca_nodes + hops as f64) / lca_nodes).ln();
        Ok(branch(lca.hops_a) + branch(lca.hops_b))
    }
}
