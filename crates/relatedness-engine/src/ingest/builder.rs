use super::snapshot::{ConceptRow, RelationshipRow};
use crate::graph::{ConceptGraph, EdgeInsert};
use crate::persistence::GraphVariant;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Counters collected while building one graph variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub variant: String,
    pub nodes: usize,
    pub edges: usize,
    pub inactive_concepts: usize,
    pub inactive_relationships: usize,
    /// Active relationships excluded by the variant's type filter.
    pub filtered_relationships: usize,
    pub duplicate_edges: usize,
    /// Active relationships whose source or destination is not an active concept.
    pub dangling_edges: usize,
    pub malformed_rows: usize,
    pub acyclic: bool,
}

/// Builds concept graphs from parsed snapshot rows.
pub struct GraphBuilder {
    variant: GraphVariant,
}

impl GraphBuilder {
    pub fn new(variant: GraphVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> GraphVariant {
        self.variant
    }

    fn admits(&self, row: &RelationshipRow) -> bool {
        match self.variant {
            GraphVariant::IsA => row.is_subsumption(),
            GraphVariant::Relation => true,
        }
    }

    pub fn build(
        &self,
        concepts: &[ConceptRow],
        relationships: &[RelationshipRow],
    ) -> (ConceptGraph, BuildReport) {
        let mut graph = ConceptGraph::new();
        let mut report = BuildReport {
            variant: self.variant.to_string(),
            ..Default::default()
        };

        for concept in concepts {
            if concept.active {
                graph.add_concept(&concept.id);
            } else {
                report.inactive_concepts += 1;
            }
        }

        for row in relationships {
            if !row.active {
                report.inactive_relationships += 1;
                continue;
            }
            if !self.admits(row) {
                report.filtered_relationships += 1;
                continue;
            }
            match graph.add_edge(&row.source_id, &row.destination_id, &row.type_id) {
                EdgeInsert::Added => {}
                EdgeInsert::Duplicate => report.duplicate_edges += 1,
                EdgeInsert::MissingEndpoint => report.dangling_edges += 1,
            }
        }

        report.nodes = graph.node_count();
        report.edges = graph.edge_count();
        report.acyclic = graph.is_acyclic();

        if !report.acyclic {
            if self.variant == GraphVariant::IsA {
                warn!("is-a graph contains a cycle; depth and LCA results may be unreliable");
            } else {
                info!("relation graph contains cycles");
            }
        }
        if report.dangling_edges > 0 {
            warn!(
                variant = %self.variant,
                count = report.dangling_edges,
                "active relationships reference inactive or unknown concepts"
            );
        }
        info!(
            variant = %self.variant,
            nodes = report.nodes,
            edges = report.edges,
            duplicates = report.duplicate_edges,
            "graph built"
        );

        (graph, report)
    }
}
