use crate::error::Result;
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Relation type id of the SNOMED CT subsumption ("is a") relationship.
pub const IS_A: &str = "116680003";

/// A positional, tab-delimited RF2 snapshot table.
pub trait SnapshotTable {
    type Row;
    const NAME: &'static str;
    /// Exact number of fields in a well-formed row.
    const FIELDS: usize;

    fn from_record(record: &StringRecord) -> Self::Row;
}

/// `id effectiveTime active moduleId definitionStatusId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRow {
    pub id: String,
    pub active: bool,
}

pub struct ConceptTable;

impl SnapshotTable for ConceptTable {
    type Row = ConceptRow;
    const NAME: &'static str = "Concept";
    const FIELDS: usize = 5;

    fn from_record(record: &StringRecord) -> ConceptRow {
        ConceptRow {
            id: record[0].trim().to_string(),
            active: record[2].trim() == "1",
        }
    }
}

/// `id effectiveTime active moduleId sourceId destinationId relationshipGroup
/// typeId characteristicTypeId modifierId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRow {
    pub active: bool,
    pub source_id: String,
    pub destination_id: String,
    pub type_id: String,
}

impl RelationshipRow {
    pub fn is_subsumption(&self) -> bool {
        self.type_id == IS_A
    }
}

pub struct RelationshipTable;

impl SnapshotTable for RelationshipTable {
    type Row = RelationshipRow;
    const NAME: &'static str = "Relationship";
    const FIELDS: usize = 10;

    fn from_record(record: &StringRecord) -> RelationshipRow {
        RelationshipRow {
            active: record[2].trim() == "1",
            source_id: record[4].trim().to_string(),
            destination_id: record[5].trim().to_string(),
            type_id: record[7].trim().to_string(),
        }
    }
}

/// Rows read from one table plus the number of rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRows<T> {
    pub rows: Vec<T>,
    pub malformed: usize,
}

pub struct SnapshotReader {
    pub delimiter: u8,
}

impl Default for SnapshotReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotReader {
    pub fn new() -> Self {
        Self { delimiter: b'\t' }
    }

    pub fn read_file<T: SnapshotTable>(&self, path: &Path) -> Result<SnapshotRows<T::Row>> {
        let file = File::open(path)?;
        self.read::<T, _>(std::io::BufReader::new(file))
    }

    pub fn read_str<T: SnapshotTable>(&self, content: &str) -> Result<SnapshotRows<T::Row>> {
        self.read::<T, _>(content.as_bytes())
    }

    /// Reads every row of a table. Rows with the wrong field count or
    /// undecodable bytes are counted and skipped; only I/O failures abort.
    pub fn read<T: SnapshotTable, R: Read>(&self, reader: R) -> Result<SnapshotRows<T::Row>> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut out = SnapshotRows {
            rows: Vec::new(),
            malformed: 0,
        };

        for (line, result) in rdr.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    debug!(table = T::NAME, line, error = %e, "skipping undecodable row");
                    out.malformed += 1;
                    continue;
                }
            };

            if record.len() != T::FIELDS {
                // A single empty field is what a blank line decodes to.
                if !(record.len() == 1 && record[0].trim().is_empty()) {
                    debug!(table = T::NAME, line, fields = record.len(), "skipping malformed row");
                    out.malformed += 1;
                }
                continue;
            }

            if line == 0 && record[0].trim_start_matches('\u{feff}').trim() == "id" {
                continue;
            }

            out.rows.push(T::from_record(&record));
        }

        Ok(out)
    }
}
