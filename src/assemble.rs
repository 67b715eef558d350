//! Final report assembly.
//!
//! Pure alignment: master keys join with the per-environment diff columns,
//! the usage attribution strings, the added lists, and the merged extras.
//! Keys without attribution get a blank, never an error.
use crate::diff::DiffStatus;
use crate::snapshot::{Extras, KeyCollision, Snapshot};
use crate::usage::{Area, LogStats, UsageIndex};
use serde::Serialize;

/// One row of the inventory table: a master key, its status per compared
/// environment (aligned with `InventoryReport::environments`), and last-use
/// attribution for both areas.
#[derive(Debug, Serialize)]
pub struct InventoryRow {
    pub key: String,
    pub statuses: Vec<String>,
    pub last_used_closing: String,
    pub last_used_production: String,
}

/// Reports found in one environment but absent from master. Ragged:
/// independent of the inventory row count.
#[derive(Debug, Serialize)]
pub struct AddedReports {
    pub environment: String,
    pub keys: Vec<String>,
}

/// Outcome of one environment comparison.
#[derive(Debug, Serialize)]
pub struct EnvironmentOutcome {
    pub environment: String,
    pub compared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run accounting surfaced alongside the tables.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub master_reports: usize,
    pub environments: Vec<EnvironmentOutcome>,
    pub log: LogStats,
    pub key_collisions: Vec<KeyCollision>,
}

/// The complete report document: the three logical tables plus the run
/// summary. This is the handoff to whatever serializes the final workbook.
#[derive(Debug, Serialize)]
pub struct InventoryReport {
    /// Environment names, in the order the status columns are laid out.
    pub environments: Vec<String>,
    pub inventory: Vec<InventoryRow>,
    pub added: Vec<AddedReports>,
    pub extras: Extras,
    pub summary: RunSummary,
}

/// Diff results for one compared environment, handed to the assembler.
pub struct EnvironmentDiff {
    pub name: String,
    pub statuses: Vec<DiffStatus>,
    pub added: Vec<String>,
}

/// Join everything on report key into the final report document.
pub fn assemble(
    master: &Snapshot,
    diffs: &[EnvironmentDiff],
    usage: &UsageIndex,
    extras: Extras,
    summary: RunSummary,
) -> InventoryReport {
    let inventory = master
        .keys()
        .iter()
        .enumerate()
        .map(|(row, key)| InventoryRow {
            key: key.clone(),
            statuses: diffs
                .iter()
                .map(|diff| diff.statuses[row].to_string())
                .collect(),
            last_used_closing: usage.display_for(Area::Closing, key).to_string(),
            last_used_production: usage.display_for(Area::Production, key).to_string(),
        })
        .collect();

    InventoryReport {
        environments: diffs.iter().map(|diff| diff.name.clone()).collect(),
        inventory,
        added: diffs
            .iter()
            .map(|diff| AddedReports {
                environment: diff.name.clone(),
                keys: diff.added.clone(),
            })
            .collect(),
        extras,
        summary,
    }
}

#[cfg(test)]
#[path = "assemble_tests.rs"]
mod tests;
