//! Per-environment reconciliation against the master inventory.
use crate::snapshot::Snapshot;
use std::collections::BTreeSet;
use std::fmt;

/// Classification of one master key within a secondary environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffStatus {
    InSync,
    Missing,
    WrongDate,
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiffStatus::InSync => "",
            DiffStatus::Missing => "Missing",
            DiffStatus::WrongDate => "Wrong Date",
        })
    }
}

/// Compare formatted modification dates.
///
/// Deliberately a string comparison: both snapshots format dates with the
/// same formatter, and two artifacts are in sync exactly when the formatted
/// values are identical. This is the single seam to replace if the
/// comparison ever needs calendar awareness.
fn dates_match(master: &str, secondary: &str) -> bool {
    master == secondary
}

/// Diff one secondary environment against the master snapshot.
///
/// The returned statuses align positionally with the master's canonical key
/// order. The added list holds the keys present only in the secondary
/// environment, deduplicated and sorted ascending.
pub fn diff_environment(master: &Snapshot, secondary: &Snapshot) -> (Vec<DiffStatus>, Vec<String>) {
    let statuses = master
        .keys()
        .iter()
        .map(|key| {
            let master_date = master.date(key).unwrap_or_default();
            match secondary.date(key) {
                None => DiffStatus::Missing,
                Some(date) if !dates_match(master_date, date) => DiffStatus::WrongDate,
                Some(_) => DiffStatus::InSync,
            }
        })
        .collect();

    let added: Vec<String> = secondary
        .keys()
        .iter()
        .filter(|key| !master.contains(key))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    (statuses, added)
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
