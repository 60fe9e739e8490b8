use crate::config::EngineConfig;
use crate::error::{RelatednessError, Result};
use crate::graph::ConceptGraph;
use crate::lca::{AncestorCache, CacheStats, LcaResolver, PathLength};
use crate::measures::{Measure, MeasureContext};
use crate::persistence::{load_graph, save_graph, ArtifactKey, GraphVariant};
use crate::taxonomy::TaxonomyIndex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The two graphs of one terminology release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OntologyGraphs {
    pub isa: ConceptGraph,
    pub rel: ConceptGraph,
}

impl OntologyGraphs {
    pub fn graph(&self, variant: GraphVariant) -> &ConceptGraph {
        match variant {
            GraphVariant::IsA => &self.isa,
            GraphVariant::Relation => &self.rel,
        }
    }

    pub fn load(dir: &Path, release: &str) -> Result<Self> {
        Ok(Self {
            isa: load_graph(dir, &ArtifactKey::new(release, GraphVariant::IsA))?,
            rel: load_graph(dir, &ArtifactKey::new(release, GraphVariant::Relation))?,
        })
    }

    pub fn save(&self, dir: &Path, release: &str) -> Result<Vec<PathBuf>> {
        GraphVariant::ALL
            .iter()
            .map(|&variant| save_graph(self.graph(variant), dir, &ArtifactKey::new(release, variant)))
            .collect()
    }
}

/// Read-only relatedness queries over a loaded release.
///
/// Graphs and the taxonomy index never change after construction; the
/// per-graph ancestor caches are concurrent maps, so one service can be
/// shared across threads.
pub struct OntologyService {
    config: EngineConfig,
    graphs: OntologyGraphs,
    taxonomy: TaxonomyIndex,
    isa_cache: AncestorCache,
    rel_cache: AncestorCache,
}

impl OntologyService {
    pub fn new(graphs: OntologyGraphs, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        if !graphs.rel.contains(&config.root_concept) {
            debug!(root = %config.root_concept, "root concept absent from relation graph");
        }
        let taxonomy = TaxonomyIndex::build(&graphs.isa, &config.root_concept)?;
        info!(
            root = %config.root_concept,
            isa_nodes = graphs.isa.node_count(),
            isa_edges = graphs.isa.edge_count(),
            rel_edges = graphs.rel.edge_count(),
            "ontology service ready"
        );

        Ok(Self {
            config,
            graphs,
            taxonomy,
            isa_cache: AncestorCache::new(),
            rel_cache: AncestorCache::new(),
        })
    }

    /// Load the configured release from `storage_path`.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let release = config.release.clone().ok_or_else(|| {
            RelatednessError::InvalidConfig("no release configured (set SCT_RELEASE)".to_string())
        })?;
        let graphs = OntologyGraphs::load(Path::new(&config.storage_path), &release)?;
        Self::new(graphs, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graphs(&self) -> &OntologyGraphs {
        &self.graphs
    }

    pub fn taxonomy(&self) -> &TaxonomyIndex {
        &self.taxonomy
    }

    pub fn resolver(&self, variant: GraphVariant) -> LcaResolver<'_> {
        match variant {
            GraphVariant::IsA => LcaResolver::new(&self.graphs.isa, &self.isa_cache),
            GraphVariant::Relation => LcaResolver::new(&self.graphs.rel, &self.rel_cache),
        }
    }

    fn node(&self, variant: GraphVariant, concept: &str) -> Result<u32> {
        self.graphs
            .graph(variant)
            .node(concept)
            .ok_or_else(|| RelatednessError::UnknownConcept(concept.to_string()))
    }

    pub fn relatedness(&self, measure: Measure, a: &str, b: &str) -> Result<f64> {
        let (a, b) = (self.node(GraphVariant::IsA, a)?, self.node(GraphVariant::IsA, b)?);
        MeasureContext::new(&self.taxonomy, self.resolver(GraphVariant::IsA)).compute(measure, a, b)
    }

    /// Dispatch by measure name, e.g. `"WuPalmer"` or `"JiangConrathDissimilarity"`.
    pub fn relatedness_by_name(&self, measure: &str, a: &str, b: &str) -> Result<f64> {
        self.relatedness(measure.parse()?, a, b)
    }

    /// Hop distance through the nearest common ancestor.
    pub fn shortest_path_length(&self, variant: GraphVariant, a: &str, b: &str) -> Result<PathLength> {
        let (a, b) = (self.node(variant, a)?, self.node(variant, b)?);
        Ok(self.resolver(variant).distance_nodes(a, b))
    }

    /// Path distance with unknown concepts and unreachable pairs replaced by
    /// the configured penalty.
    pub fn distance_or_penalty(&self, variant: GraphVariant, a: &str, b: &str) -> f64 {
        match self.shortest_path_length(variant, a, b) {
            Ok(length) => length.or_penalty(self.config.unreachable_penalty),
            Err(e) => {
                debug!(a, b, error = %e, "distance replaced by penalty");
                self.config.unreachable_penalty
            }
        }
    }

    pub fn lowest_common_ancestors(&self, a: &str, b: &str) -> Result<Vec<String>> {
        let (na, nb) = (self.node(GraphVariant::IsA, a)?, self.node(GraphVariant::IsA, b)?);
        let lcas = self.resolver(GraphVariant::IsA).lowest_common_ancestors(na, nb);
        if lcas.is_empty() {
            return Err(RelatednessError::Unreachable {
                a: a.to_string(),
                b: b.to_string(),
            });
        }
        Ok(lcas
            .iter()
            .filter_map(|lca| self.graphs.isa.concept_id(lca.node))
            .map(str::to_string)
            .collect())
    }

    pub fn depth(&self, concept: &str) -> Result<u32> {
        let node = self.node(GraphVariant::IsA, concept)?;
        self.taxonomy
            .depth(node)
            .ok_or_else(|| RelatednessError::NotInHierarchy(concept.to_string()))
    }

    pub fn max_depth(&self) -> u32 {
        self.taxonomy.max_depth()
    }

    pub fn information_content(&self, concept: &str) -> Result<f64> {
        let node = self.node(GraphVariant::IsA, concept)?;
        self.taxonomy
            .information_content(node)
            .ok_or_else(|| RelatednessError::NotInHierarchy(concept.to_string()))
    }

    pub fn cache_stats(&self, variant: GraphVariant) -> CacheStats {
        match variant {
            GraphVariant::IsA => self.isa_cache.stats(),
            GraphVariant::Relation => self.rel_cache.stats(),
        }
    }

    pub fn clear_caches(&self) {
        self.isa_cache.clear();
        self.rel_cache.clear();
    }
}
