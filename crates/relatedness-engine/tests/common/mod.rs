//! A miniature RF2 release written to disk for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const ROOT: &str = "138875005";
pub const FINDING: &str = "404684003";
pub const BODY_STRUCTURE: &str = "123037004";
pub const DISORDER: &str = "64572001";
pub const FRACTURE: &str = "125605004";
pub const FEMUR_FRACTURE: &str = "71620000";
pub const BONE: &str = "272673000";
pub const ORPHAN: &str = "999999001";
pub const RETIRED: &str = "1234567";

pub const RELEASE: &str = "20230430";

const IS_A: &str = "116680003";
const FINDING_SITE: &str = "363698007";

pub fn concept_table() -> String {
    let mut out = String::from("id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n");
    for id in [ROOT, FINDING, BODY_STRUCTURE, DISORDER, FRACTURE, FEMUR_FRACTURE, BONE, ORPHAN] {
        out.push_str(&format!("{id}\t{RELEASE}\t1\t900000000000207008\t900000000000074008\n"));
    }
    out.push_str(&format!("{RETIRED}\t{RELEASE}\t0\t900000000000207008\t900000000000074008\n"));
    out
}

pub fn relationship_table() -> String {
    let rows = [
        ("1", FINDING, ROOT, IS_A),
        ("1", BODY_STRUCTURE, ROOT, IS_A),
        ("1", DISORDER, FINDING, IS_A),
        ("1", FRACTURE, DISORDER, IS_A),
        ("1", FEMUR_FRACTURE, FRACTURE, IS_A),
        ("1", BONE, BODY_STRUCTURE, IS_A),
        ("1", FRACTURE, BONE, FINDING_SITE),
        ("1", RETIRED, DISORDER, IS_A),
        ("0", FEMUR_FRACTURE, BONE, IS_A),
    ];
    let mut out = String::from(
        "id\teffectiveTime\tactive\tmoduleId\tsourceId\tdestinationId\trelationshipGroup\ttypeId\tcharacteristicTypeId\tmodifierId\n",
    );
    for (n, (active, source, destination, type_id)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{}\t{RELEASE}\t{active}\t900000000000207008\t{source}\t{destination}\t0\t{type_id}\t900000000000011006\t900000000000451002\n",
            n + 1
        ));
    }
    out
}

/// The release plus a direct `FRACTURE is-a ROOT`, making FRACTURE (depth 1)
/// shallower than its other parent DISORDER (depth 2).
pub fn shortcut_relationship_table() -> String {
    let mut out = relationship_table();
    out.push_str(&format!(
        "100\t{RELEASE}\t1\t900000000000207008\t{FRACTURE}\t{ROOT}\t0\t{IS_A}\t900000000000011006\t900000000000451002\n"
    ));
    out
}

/// Writes snapshot tables with RF2 file names into `dir`.
pub fn write_release(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("sct2_Concept_Snapshot_INT_{RELEASE}.txt")), concept_table()).unwrap();
    fs::write(
        dir.join(format!("sct2_Relationship_Snapshot_INT_{RELEASE}.txt")),
        relationship_table(),
    )
    .unwrap();
    // Must not be mistaken for the relationship table.
    fs::write(
        dir.join(format!("sct2_RelationshipConcreteValues_Snapshot_INT_{RELEASE}.txt")),
        "id\n",
    )
    .unwrap();
}
