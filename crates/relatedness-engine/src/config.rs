//! Engine configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! environment variables.

use crate::error::{RelatednessError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// SNOMED CT root concept ("SNOMED CT Concept").
pub const SNOMED_ROOT: &str = "138875005";

/// Penalty used in place of a distance that cannot be computed.
pub const DEFAULT_UNREACHABLE_PENALTY: f64 = 50.0;

const DEFAULT_STORAGE_PATH: &str = "data/graphs";
const DEFAULT_PROGRESS_INTERVAL: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Concept id of the universal root of the IS-A hierarchy.
    pub root_concept: String,
    /// Value substituted for unreachable or unknown pairs in matrix builds.
    pub unreachable_penalty: f64,
    /// Directory holding persisted graph artifacts.
    pub storage_path: String,
    /// Terminology release to load (e.g. "20230430").
    pub release: Option<String>,
    /// Number of matrix rows between progress log lines.
    pub progress_interval: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_concept: SNOMED_ROOT.to_string(),
            unreachable_penalty: DEFAULT_UNREACHABLE_PENALTY,
            storage_path: DEFAULT_STORAGE_PATH.to_string(),
            release: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing keys keep their defaults. Not
    /// validated, so environment overrides can still correct it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Defaults, then the optional file, then environment variables,
    /// validated once at the end.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Apply `SCT_*` / `GRAPH_STORAGE_PATH` environment overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(root) = std::env::var("SCT_ROOT_CONCEPT") {
            self.root_concept = root;
        }
        if let Ok(raw) = std::env::var("SCT_UNREACHABLE_PENALTY") {
            self.unreachable_penalty = raw.trim().parse().map_err(|_| {
                RelatednessError::InvalidConfig(format!(
                    "SCT_UNREACHABLE_PENALTY is not a number: {}",
                    raw
                ))
            })?;
        }
        if let Ok(path) = std::env::var("GRAPH_STORAGE_PATH") {
            self.storage_path = path;
        }
        if let Ok(release) = std::env::var("SCT_RELEASE") {
            self.release = Some(release);
        }
        if let Ok(raw) = std::env::var("SCT_PROGRESS_INTERVAL") {
            self.progress_interval = raw.trim().parse().map_err(|_| {
                RelatednessError::InvalidConfig(format!(
                    "SCT_PROGRESS_INTERVAL is not a positive integer: {}",
                    raw
                ))
            })?;
        }
        Ok(self)
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.root_concept = root.to_string();
        self
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.unreachable_penalty = penalty;
        self
    }

    pub fn with_release(mut self, release: &str) -> Self {
        self.release = Some(release.to_string());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.root_concept.is_empty() || !self.root_concept.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(RelatednessError::InvalidConfig(format!(
                "root concept must be a numeric concept id, got {:?}",
                self.root_concept
            )));
        }
        if !self.unreachable_penalty.is_finite() || self.unreachable_penalty < 0.0 {
            return Err(RelatednessError::InvalidConfig(format!(
                "unreachable penalty must be a finite non-negative number, got {}",
                self.unreachable_penalty
            )));
        }
        if self.progress_interval == 0 {
            return Err(RelatednessError::InvalidConfig(
                "progress interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
