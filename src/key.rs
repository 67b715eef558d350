//! Canonical report key derivation.
//!
//! A report key is folder-scoped, not path-scoped: the folder label's first
//! `-` segment (uppercased, with the literal `REPORTS` removed) joined with
//! the artifact's file stem. Two artifacts sharing a category prefix and a
//! base filename collapse to the same key.

/// File extension of report artifacts.
pub const REPORT_EXT: &str = ".rpt";
/// Extension of the database side-files that accompany reports.
pub const SIDECAR_EXT: &str = ".db";

/// Derive the canonical key for a report artifact.
///
/// Total for any input: a label without `-` is treated as a single segment,
/// and malformed input degrades to a best-effort key rather than failing.
pub fn report_key(folder_label: &str, artifact_name: &str) -> String {
    let category = folder_label
        .split('-')
        .next()
        .unwrap_or(folder_label)
        .to_uppercase()
        .replace("REPORTS", "");
    let stem = artifact_name
        .strip_suffix(REPORT_EXT)
        .unwrap_or(artifact_name);
    format!("{} - {}", category.trim(), stem)
}
