use crate::error::{RelatednessError, Result};
use crate::graph::ConceptGraph;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Which of the two per-release graphs an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphVariant {
    /// Subsumption edges only.
    IsA,
    /// Every active relationship type.
    Relation,
}

impl GraphVariant {
    pub const ALL: [GraphVariant; 2] = [GraphVariant::IsA, GraphVariant::Relation];

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphVariant::IsA => "is-a",
            GraphVariant::Relation => "rel",
        }
    }
}

impl fmt::Display for GraphVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphVariant {
    type Err = RelatednessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "is-a" | "isa" | "sim" => Ok(GraphVariant::IsA),
            "rel" | "relation" => Ok(GraphVariant::Relation),
            other => Err(RelatednessError::InvalidConfig(format!(
                "unknown graph variant: {}",
                other
            ))),
        }
    }
}

/// Location of an artifact: one file per (release, variant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    pub release: String,
    pub variant: GraphVariant,
}

impl ArtifactKey {
    pub fn new(release: &str, variant: GraphVariant) -> Self {
        Self {
            release: release.to_string(),
            variant,
        }
    }

    pub fn file_name(&self) -> String {
        format!("snomed-{}_dag_{}.bin", self.release, self.variant)
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

/// Serialized form of a [`ConceptGraph`].
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub release: String,
    pub variant: GraphVariant,
    pub built_at: String,
    pub nodes: Vec<String>,             // index -> concept id
    pub relation_types: Vec<String>,    // label id -> relation type id
    pub edges: Vec<(u32, u32, u32)>,    // (source, destination, label id)
}

impl GraphSnapshot {
    pub fn from_graph(graph: &ConceptGraph, key: &ArtifactKey) -> Self {
        let edges = graph
            .topology
            .out
            .iter()
            .enumerate()
            .flat_map(|(src, targets)| {
                targets
                    .iter()
                    .map(move |&(dst, label)| (src as u32, dst, label))
            })
            .collect();

        Self {
            release: key.release.clone(),
            variant: key.variant,
            built_at: chrono::Utc::now().to_rfc3339(),
            nodes: graph.ids.clone(),
            relation_types: graph.labels.clone(),
            edges,
        }
    }

    pub fn into_graph(self) -> ConceptGraph {
        let mut graph = ConceptGraph::new();
        for id in &self.nodes {
            graph.add_concept(id);
        }
        for label in self.relation_types {
            let id = graph.labels.len() as u32;
            graph.label_index.insert(label.clone(), id);
            graph.labels.push(label);
        }

        let label_count = graph.labels.len() as u32;
        let mut rejected = 0usize;
        for (src, dst, label) in self.edges {
            if label >= label_count || !graph.topology.add_edge(src, dst, label) {
                rejected += 1;
            }
        }
        if rejected > 0 {
            warn!(rejected, "artifact contained out-of-range or duplicate edges");
        }
        graph
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(&self.release, self.variant)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        save_bincode(path, self)?;
        info!(path = %path.display(), nodes = self.nodes.len(), edges = self.edges.len(), "graph saved");
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let snapshot: GraphSnapshot = load_bincode(path)?;
        info!(
            path = %path.display(),
            release = %snapshot.release,
            variant = %snapshot.variant,
            built_at = %snapshot.built_at,
            "graph loaded"
        );
        Ok(snapshot)
    }
}

/// Persist `graph` under `dir`, returning the written path.
pub fn save_graph(graph: &ConceptGraph, dir: &Path, key: &ArtifactKey) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = key.path_in(dir);
    GraphSnapshot::from_graph(graph, key).save_to_file(&path)?;
    Ok(path)
}

pub fn load_graph(dir: &Path, key: &ArtifactKey) -> Result<ConceptGraph> {
    let snapshot = GraphSnapshot::load_from_file(&key.path_in(dir))?;
    if snapshot.key() != *key {
        return Err(RelatednessError::InvalidConfig(format!(
            "artifact {} holds release {} variant {}",
            key.file_name(),
            snapshot.release,
            snapshot.variant
        )));
    }
    Ok(snapshot.into_graph())
}

pub fn save_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = bincode::serialize(value)?;
    fs::write(path, data)?;
    Ok(())
}

pub fn load_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path)?;
    Ok(bincode::deserialize(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_follow_release_convention() {
        let key = ArtifactKey::new("20230430", GraphVariant::IsA);
        assert_eq!(key.file_name(), "snomed-20230430_dag_is-a.bin");
        assert_eq!(
            ArtifactKey::new("20230430", GraphVariant::Relation).file_name(),
            "snomed-20230430_dag_rel.bin"
        );
    }

    #[test]
    fn snapshot_restores_graph() -> Result<()> {
        let mut graph = ConceptGraph::new();
        for id in ["1", "2", "3"] {
            graph.add_concept(id);
        }
        graph.add_edge("1", "2", "116680003");
        graph.add_edge("1", "3", "363698007");
        graph.add_edge("3", "2", "116680003");

        let dir = tempfile::tempdir()?;
        let key = ArtifactKey::new("test", GraphVariant::Relation);
        save_graph(&graph, dir.path(), &key)?;
        let restored = load_graph(dir.path(), &key)?;

        assert_eq!(restored, graph);
        Ok(())
    }

    #[test]
    fn mismatched_key_is_rejected() -> Result<()> {
        let graph = ConceptGraph::new();
        let dir = tempfile::tempdir()?;
        let key = ArtifactKey::new("a", GraphVariant::IsA);
        let path = save_graph(&graph, dir.path(), &key)?;
        fs::copy(&path, dir.path().join("snomed-b_dag_is-a.bin"))?;

        let err = load_graph(dir.path(), &ArtifactKey::new("b", GraphVariant::IsA));
        assert!(matches!(err, Err(RelatednessError::InvalidConfig(_))));
        Ok(())
    }

    #[test]
    fn variant_names_parse() -> Result<()> {
        assert_eq!("is-a".parse::<GraphVariant>()?, GraphVariant::IsA);
        assert_eq!("REL".parse::<GraphVariant>()?, GraphVariant::Relation);
        assert!("tree".parse::<GraphVariant>().is_err());
        Ok(())
    }
}
