use crate::error::{RelatednessError, Result};
use crate::graph::ConceptGraph;
use crate::persistence::{save_graph, ArtifactKey, GraphVariant};
use crate::service::OntologyGraphs;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod builder;
pub mod snapshot;

use builder::{BuildReport, GraphBuilder};
use snapshot::{ConceptRow, ConceptTable, RelationshipRow, RelationshipTable, SnapshotReader};

const CONCEPT_PREFIX: &str = "sct2_Concept_Snapshot";
const RELATIONSHIP_PREFIX: &str = "sct2_Relationship_Snapshot";

/// Concept and Relationship snapshot tables of one release directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFiles {
    pub release: String,
    pub concepts: PathBuf,
    pub relationships: PathBuf,
}

impl SnapshotFiles {
    /// Locate the RF2 snapshot tables in `dir`. Concrete-value relationship
    /// files are ignored.
    pub fn discover(dir: &Path) -> Result<Self> {
        let mut concepts = None;
        let mut relationships = None;

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(CONCEPT_PREFIX) {
                concepts = Some(path.clone());
            } else if name.starts_with(RELATIONSHIP_PREFIX) {
                relationships = Some(path.clone());
            }
        }

        let missing = |table| RelatednessError::MissingSnapshot {
            table,
            dir: dir.display().to_string(),
        };
        let concepts = concepts.ok_or_else(|| missing("Concept"))?;
        let relationships = relationships.ok_or_else(|| missing("Relationship"))?;
        let release = release_id(&concepts).unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            release,
            concepts,
            relationships,
        })
    }
}

/// `sct2_Concept_Snapshot_INT_20230430.txt` -> `20230430`
pub fn release_id(path: &Path) -> Option<String> {
    let name = path.file_stem()?.to_str()?;
    let date = Regex::new(r"_(\d{8})$").ok()?;
    if let Some(caps) = date.captures(name) {
        return Some(caps[1].to_string());
    }
    name.rsplit('_').next().filter(|s| !s.is_empty()).map(str::to_string)
}

/// Result of building and persisting a release.
#[derive(Debug, Clone)]
pub struct ReleaseBuild {
    pub release: String,
    pub reports: Vec<BuildReport>,
    pub artifacts: Vec<PathBuf>,
}

/// Offline batch step: snapshot tables -> persisted graphs.
pub struct IngestionEngine {
    storage_path: PathBuf,
    reader: SnapshotReader,
}

impl IngestionEngine {
    pub fn new(storage_path: &Path) -> Self {
        Self {
            storage_path: storage_path.to_path_buf(),
            reader: SnapshotReader::new(),
        }
    }

    pub fn build_release(&self, release_dir: &Path) -> Result<ReleaseBuild> {
        let files = SnapshotFiles::discover(release_dir)?;
        info!(release = %files.release, concepts = %files.concepts.display(), "building release");

        let concepts = self.reader.read_file::<ConceptTable>(&files.concepts)?;
        let relationships = self.reader.read_file::<RelationshipTable>(&files.relationships)?;
        let malformed = concepts.malformed + relationships.malformed;

        let mut reports = Vec::new();
        let mut artifacts = Vec::new();
        for variant in GraphVariant::ALL {
            let (graph, mut report) =
                GraphBuilder::new(variant).build(&concepts.rows, &relationships.rows);
            report.malformed_rows = malformed;
            let key = ArtifactKey::new(&files.release, variant);
            artifacts.push(save_graph(&graph, &self.storage_path, &key)?);
            reports.push(report);
        }

        Ok(ReleaseBuild {
            release: files.release,
            reports,
            artifacts,
        })
    }
}

/// Build both graphs in memory from already-parsed rows.
pub fn build_graphs(concepts: &[ConceptRow], relationships: &[RelationshipRow]) -> OntologyGraphs {
    let build = |variant| -> ConceptGraph { GraphBuilder::new(variant).build(concepts, relationships).0 };
    OntologyGraphs {
        isa: build(GraphVariant::IsA),
        rel: build(GraphVariant::Relation),
    }
}

/// Build both graphs in memory from snapshot table contents.
pub fn build_graphs_from_str(concepts: &str, relationships: &str) -> Result<OntologyGraphs> {
    let reader = SnapshotReader::new();
    let concepts = reader.read_str::<ConceptTable>(concepts)?;
    let relationships = reader.read_str::<RelationshipTable>(relationships)?;
    Ok(build_graphs(&concepts.rows, &relationships.rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_id_from_file_name() {
        assert_eq!(
            release_id(Path::new("data/sct2_Concept_Snapshot_INT_20230430.txt")).as_deref(),
            Some("20230430")
        );
        assert_eq!(
            release_id(Path::new("sct2_Concept_Snapshot_LOCAL.txt")).as_deref(),
            Some("LOCAL")
        );
    }

    #[test]
    fn discover_requires_both_tables() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("sct2_Concept_Snapshot_INT_20250401.txt"), "")?;
        assert!(matches!(
            SnapshotFiles::discover(dir.path()),
            Err(RelatednessError::MissingSnapshot { table: "Relationship", .. })
        ));

        fs::write(dir.path().join("sct2_Relationship_Snapshot_INT_20250401.txt"), "")?;
        fs::write(
            dir.path().join("sct2_RelationshipConcreteValues_Snapshot_INT_20250401.txt"),
            "",
        )?;
        let files = SnapshotFiles::discover(dir.path())?;
        assert_eq!(files.release, "20250401");
        assert!(files
            .relationships
            .ends_with("sct2_Relationship_Snapshot_INT_20250401.txt"));
        Ok(())
    }
}
