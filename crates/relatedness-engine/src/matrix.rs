//! All-pairs distance and relatedness matrices for a concept list.

use crate::error::{RelatednessError, Result};
use crate::measures::Measure;
use crate::persistence::GraphVariant;
use crate::service::OntologyService;
use ndarray::Array2;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Clean a concept id coming from spreadsheet tooling: trims whitespace and
/// float artefacts (`"123456.0"`); rejects blanks, `nan`, and non-SCTIDs.
pub fn normalize_concept_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    let is_sctid = (6..=18).contains(&trimmed.len()) && trimmed.bytes().all(|b| b.is_ascii_digit());
    is_sctid.then(|| trimmed.to_string())
}

/// Normalized, de-duplicated and sorted concept ids.
pub fn normalize_concept_ids<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .filter_map(normalize_concept_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatrixSummary {
    /// Number of computed (non-substituted) entries.
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Symmetric N×N matrix over a sorted concept list.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    label: String,
    concepts: Vec<String>,
    positions: HashMap<String, usize>,
    values: Array2<f64>,
    substituted: Array2<bool>,
}

impl DistanceMatrix {
    /// Shortest-path distances over the given graph.
    pub fn build(service: &OntologyService, concepts: &[String], variant: GraphVariant) -> Self {
        Self::build_with(service, concepts, &format!("distance:{}", variant), |a, b| {
            service
                .shortest_path_length(variant, a, b)?
                .hops()
                .map(f64::from)
                .ok_or_else(|| RelatednessError::Unreachable {
                    a: a.to_string(),
                    b: b.to_string(),
                })
        })
    }

    pub fn build_relatedness(service: &OntologyService, measure: Measure, concepts: &[String]) -> Self {
        Self::build_with(service, concepts, measure.name(), |a, b| {
            service.relatedness(measure, a, b)
        })
    }

    /// Evaluate `compute` for every unordered pair (diagonal included) in
    /// parallel rows. Failed pairs get the configured penalty.
    pub fn build_with<F>(service: &OntologyService, concepts: &[String], label: &str, compute: F) -> Self
    where
        F: Fn(&str, &str) -> Result<f64> + Sync,
    {
        let concepts: Vec<String> = concepts
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let n = concepts.len();
        let penalty = service.config().unreachable_penalty;
        let interval = service.config().progress_interval.max(1);
        let completed = AtomicUsize::new(0);

        info!(label, concepts = n, pairs = n * (n + 1) / 2, "building matrix");

        let rows: Vec<Vec<(f64, bool)>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let row = (i..n)
                    .map(|j| match compute(&concepts[i], &concepts[j]) {
                        Ok(value) => (value, false),
                        Err(e) => {
                            if e.is_substitutable() {
                                debug!(a = %concepts[i], b = %concepts[j], error = %e, "substituting penalty");
                            } else {
                                warn!(a = %concepts[i], b = %concepts[j], error = %e, "substituting penalty");
                            }
                            (penalty, true)
                        }
                    })
                    .collect();

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % interval == 0 || done == n {
                    info!(
                        label,
                        rows = done,
                        total = n,
                        percent = format!("{:.1}", done as f64 * 100.0 / n as f64),
                        "matrix progress"
                    );
                }
                row
            })
            .collect();

        let mut values = Array2::<f64>::zeros((n, n));
        let mut substituted = Array2::<bool>::from_elem((n, n), false);
        for (i, row) in rows.into_iter().enumerate() {
            for (offset, (value, failed)) in row.into_iter().enumerate() {
                let j = i + offset;
                values[[i, j]] = value;
                values[[j, i]] = value;
                substituted[[i, j]] = failed;
                substituted[[j, i]] = failed;
            }
        }

        let matrix = Self::from_parts(label, concepts, values, substituted);
        info!(label, substituted = matrix.substituted_count(), "matrix complete");
        matrix
    }

    fn from_parts(label: &str, concepts: Vec<String>, values: Array2<f64>, substituted: Array2<bool>) -> Self {
        let positions = concepts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self {
            label: label.to_string(),
            concepts,
            positions,
            values,
            substituted,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn concepts(&self) -> &[String] {
        &self.concepts
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = *self.positions.get(a)?;
        let j = *self.positions.get(b)?;
        Some(self.values[[i, j]])
    }

    pub fn is_substituted(&self, a: &str, b: &str) -> Option<bool> {
        let i = *self.positions.get(a)?;
        let j = *self.positions.get(b)?;
        Some(self.substituted[[i, j]])
    }

    /// Ordered pairs whose value is the penalty rather than a computed result.
    pub fn substituted_count(&self) -> usize {
        self.substituted.iter().filter(|&&s| s).count()
    }

    /// Statistics over computed entries; `None` when every entry was substituted.
    pub fn summary(&self) -> Option<MatrixSummary> {
        let mut computed: Vec<f64> = self
            .values
            .iter()
            .zip(self.substituted.iter())
            .filter(|(v, &s)| !s && v.is_finite())
            .map(|(&v, _)| v)
            .collect();
        if computed.is_empty() {
            return None;
        }
        computed.sort_by(|a, b| a.total_cmp(b));

        let count = computed.len();
        let median = if count % 2 == 1 {
            computed[count / 2]
        } else {
            (computed[count / 2 - 1] + computed[count / 2]) / 2.0
        };
        Some(MatrixSummary {
            count,
            mean: computed.iter().sum::<f64>() / count as f64,
            median,
            min: computed[0],
            max: computed[count - 1],
        })
    }

    /// CSV with a header of concept ids and one labelled row per concept.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec![String::new()];
        header.extend(self.concepts.iter().cloned());
        wtr.write_record(&header)?;

        for (i, concept) in self.concepts.iter().enumerate() {
            let mut record = vec![concept.clone()];
            record.extend(self.values.row(i).iter().map(|v| v.to_string()));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: &Path) -> Result<()> {
        self.write_csv(std::fs::File::create(path)?)?;
        info!(path = %path.display(), label = %self.label, "matrix exported");
        Ok(())
    }

    /// Read a matrix written by [`write_csv`](Self::write_csv). Empty,
    /// non-numeric or infinite cells are replaced by `penalty` and marked
    /// substituted.
    pub fn read_csv<R: Read>(reader: R, label: &str, penalty: f64) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let concepts: Vec<String> = rdr.headers()?.iter().skip(1).map(str::to_string).collect();
        let n = concepts.len();
        let mut values = Array2::<f64>::from_elem((n, n), penalty);
        let mut substituted = Array2::<bool>::from_elem((n, n), true);

        let mut rows = 0usize;
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            if i >= n || record.get(0) != Some(concepts[i].as_str()) {
                return Err(RelatednessError::InvalidConfig(format!(
                    "matrix row {} does not match header order",
                    i + 1
                )));
            }
            for (j, cell) in record.iter().skip(1).take(n).enumerate() {
                if let Ok(value) = cell.trim().parse::<f64>() {
                    if value.is_finite() {
                        values[[i, j]] = value;
                        substituted[[i, j]] = false;
                    }
                }
            }
            rows += 1;
        }
        if rows != n {
            return Err(RelatednessError::InvalidConfig(format!(
                "matrix has {} rows for {} columns",
                rows, n
            )));
        }

        Ok(Self::from_parts(label, concepts, values, substituted))
    }
}

/// Overlap between concepts a caller needs and concepts a matrix provides.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCoverage {
    pub in_both: Vec<String>,
    pub only_required: Vec<String>,
    pub only_available: Vec<String>,
}

impl MatrixCoverage {
    pub fn compare(required: &[String], available: &[String]) -> Self {
        let required: BTreeSet<&String> = required.iter().collect();
        let available: BTreeSet<&String> = available.iter().collect();
        Self {
            in_both: required.intersection(&available).map(|s| s.to_string()).collect(),
            only_required: required.difference(&available).map(|s| s.to_string()).collect(),
            only_available: available.difference(&required).map(|s| s.to_string()).collect(),
        }
    }

    /// Fraction of required concepts that are available (1.0 when none are required).
    pub fn ratio(&self) -> f64 {
        let required = self.in_both.len() + self.only_required.len();
        if required == 0 {
            1.0
        } else {
            self.in_both.len() as f64 / required as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.only_required.is_empty()
    }
}
