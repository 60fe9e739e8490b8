//! Toy release shared by unit tests.
//!
//! ```text
//!              R
//!          /   |   \
//!         A    B    H        E -> H, G -> H are attribute edges
//!        / \   |             (relation graph only)
//!       C   D  |
//!       | \ |  |             X: active, no relationships
//!       E  F+--+ (F is-a C and is-a B)
//!          G (is-a D)
//! ```

use crate::ingest::build_graphs_from_str;
use crate::service::OntologyGraphs;

pub const R: &str = "138875005";
pub const A: &str = "100005";
pub const B: &str = "200008";
pub const C: &str = "300004";
pub const D: &str = "400007";
pub const E: &str = "500001";
pub const F: &str = "600003";
pub const G: &str = "700006";
pub const H: &str = "800009";
pub const X: &str = "900002";
pub const INACTIVE: &str = "999001";

const FINDING_SITE: &str = "363698007";
const MORPHOLOGY: &str = "116676008";
const IS_A: &str = "116680003";

fn concepts(active: &[&str], inactive: &[&str]) -> String {
    let mut out = String::from("id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n");
    for (ids, flag) in [(active, 1), (inactive, 0)] {
        for id in ids {
            out.push_str(&format!("{id}\t20230430\t{flag}\t900000000000207008\t900000000000074008\n"));
        }
    }
    out
}

fn relationships(rows: &[(&str, &str, &str, &str)]) -> String {
    let mut out = String::from(
        "id\teffectiveTime\tactive\tmoduleId\tsourceId\tdestinationId\trelationshipGroup\ttypeId\tcharacteristicTypeId\tmodifierId\n",
    );
    for (n, (active, source, destination, type_id)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{}\t20230430\t{active}\t900000000000207008\t{source}\t{destination}\t0\t{type_id}\t900000000000011006\t900000000000451002\n",
            n + 1
        ));
    }
    out
}

pub fn concept_table() -> String {
    concepts(&[R, A, B, C, D, E, F, G, H, X], &[INACTIVE])
}

pub fn relationship_table() -> String {
    relationships(&[
        ("1", A, R, IS_A),
        ("1", B, R, IS_A),
        ("1", H, R, IS_A),
        ("1", C, A, IS_A),
        ("1", D, A, IS_A),
        ("1", E, C, IS_A),
        ("1", F, B, IS_A),
        ("1", F, C, IS_A),
        ("1", G, D, IS_A),
        ("1", E, H, FINDING_SITE),
        ("1", G, H, MORPHOLOGY),
        ("0", C, B, IS_A),
        ("1", INACTIVE, A, IS_A),
    ])
}

pub fn toy_graphs() -> OntologyGraphs {
    build_graphs_from_str(&concept_table(), &relationship_table()).expect("toy snapshot parses")
}

/// `R <- A <- C <- F` plus a direct `F is-a R`: F (depth 1) is shallower
/// than its parent C (depth 2).
pub fn shortcut_graphs() -> OntologyGraphs {
    let rows = [
        ("1", A, R, IS_A),
        ("1", C, A, IS_A),
        ("1", F, C, IS_A),
        ("1", F, R, IS_A),
    ];
    build_graphs_from_str(&concepts(&[R, A, C, F], &[]), &relationships(&rows))
        .expect("shortcut snapshot parses")
}
