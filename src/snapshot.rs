//! Environment tree scanning.
//!
//! An environment root holds one level of category folders; each category
//! folder holds report artifacts. Only those two levels are ever inspected:
//! a subdirectory inside a category folder is reported as an extra folder,
//! never descended into.
use crate::key::{report_key, REPORT_EXT, SIDECAR_EXT};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Inventory of one environment: report key -> formatted modification date.
///
/// Key order is the committed canonical ordering: first-discovered order
/// under a name-sorted walk. Scanning an unchanged tree twice yields an
/// identical snapshot, including order.
#[derive(Debug, Default)]
pub struct Snapshot {
    order: Vec<String>,
    dates: HashMap<String, String>,
}

impl Snapshot {
    /// Insert a key, detecting collisions instead of silently overwriting.
    ///
    /// Returns the previously stored date when the key was already present;
    /// the new date wins either way.
    pub(crate) fn insert(&mut self, key: String, date: String) -> Option<String> {
        match self.dates.insert(key.clone(), date) {
            Some(previous) => Some(previous),
            None => {
                self.order.push(key);
                None
            }
        }
    }

    /// Keys in canonical order.
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    /// Formatted modification date stored for a key.
    pub fn date(&self, key: &str) -> Option<&str> {
        self.dates.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.dates.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A key that collapsed onto an already-present snapshot entry.
#[derive(Debug, Serialize)]
pub struct KeyCollision {
    pub key: String,
    /// Path of the artifact whose insert collided (the one that won).
    pub path: String,
}

/// Files and folders discovered during walks that fall outside the expected
/// report-file shape.
#[derive(Debug, Default, Serialize)]
pub struct Extras {
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

impl Extras {
    pub fn merge(&mut self, other: Extras) {
        self.folders.extend(other.folders);
        self.files.extend(other.files);
    }
}

/// Everything one walk produces. Extras and collisions are local to the
/// scan; the orchestrator merges them across environments.
#[derive(Debug, Default)]
pub struct EnvironmentScan {
    pub snapshot: Snapshot,
    pub extras: Extras,
    pub collisions: Vec<KeyCollision>,
}

/// Scan one environment root into a snapshot plus side-lists.
///
/// Immediate children that are directories are walked one level deeper
/// unless their name contains any entry of `excluded_folders` as a
/// substring; files at the root are ignored. An unreadable root or category
/// directory fails the whole scan rather than producing a partial snapshot.
pub fn scan_environment(root: &Path, excluded_folders: &[String]) -> Result<EnvironmentScan> {
    let mut scan = EnvironmentScan::default();
    for entry in sorted_entries(root)? {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_excluded(&name, excluded_folders) {
            continue;
        }
        scan_category(&name, &path, &mut scan)?;
    }
    Ok(scan)
}

fn scan_category(folder: &str, path: &Path, scan: &mut EnvironmentScan) -> Result<()> {
    for entry in sorted_entries(path)? {
        let entry_path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry_path.is_dir() {
            scan.extras.folders.push(entry_path.display().to_string());
        } else if name.ends_with(REPORT_EXT) {
            let date = modified_date(&entry_path)?;
            let key = report_key(folder, &name);
            if scan.snapshot.insert(key.clone(), date).is_some() {
                scan.collisions.push(KeyCollision {
                    key,
                    path: entry_path.display().to_string(),
                });
            }
        } else if !name.ends_with(SIDECAR_EXT) {
            scan.extras.files.push(entry_path.display().to_string());
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("read directory {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("list directory {}", dir.display()))?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

fn is_excluded(name: &str, excluded_folders: &[String]) -> bool {
    excluded_folders
        .iter()
        .any(|needle| name.contains(needle.as_str()))
}

fn modified_date(path: &Path) -> Result<String> {
    let metadata = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let modified = metadata
        .modified()
        .with_context(|| format!("read modification time of {}", path.display()))?;
    Ok(format_date(modified))
}

/// Format a filesystem timestamp as the `MM/DD/YYYY` string stored in
/// snapshots and compared across environments.
pub(crate) fn format_date(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format("%m/%d/%Y").to_string()
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
