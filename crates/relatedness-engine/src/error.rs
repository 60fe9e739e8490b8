//! Error types for graph construction and relatedness queries.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, RelatednessError>;

#[derive(Error, Debug)]
pub enum RelatednessError {
    // ========== Query Errors ==========
    /// Measure name did not match any known measure.
    #[error("Unsupported measure: {0}")]
    UnsupportedMeasure(String),

    /// Concept id is not a node of the loaded graph.
    #[error("Unknown concept: {0}")]
    UnknownConcept(String),

    /// The two concepts share no ancestor in the queried graph.
    #[error("No common ancestor between {a} and {b}")]
    Unreachable { a: String, b: String },

    /// Concept exists but is not reachable from the configured root.
    #[error("Concept {0} is not below the root concept")]
    NotInHierarchy(String),

    /// A measure formula is undefined for the given inputs (zero denominator).
    #[error("{measure} is undefined for {a} and {b}: {reason}")]
    UndefinedMeasure {
        measure: &'static str,
        a: String,
        b: String,
        reason: &'static str,
    },

    // ========== Configuration Errors ==========
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========== Build / Storage Errors ==========
    /// A release directory lacks one of the required snapshot tables.
    #[error("Missing {table} snapshot in {dir}")]
    MissingSnapshot { table: &'static str, dir: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RelatednessError {
    /// Whether a matrix builder may replace this failure with the penalty value.
    pub fn is_substitutable(&self) -> bool {
        matches!(
            self,
            Self::UnknownConcept(_)
                | Self::Unreachable { .. }
                | Self::NotInHierarchy(_)
                | Self::UndefinedMeasure { .. }
        )
    }
}
