use super::{format_date, scan_environment};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(path, contents.as_bytes()).expect("write file");
}

fn no_exclusions() -> Vec<String> {
    Vec::new()
}

#[test]
fn reports_are_keyed_and_dated() {
    let root = TempDir::new().expect("create temp root");
    let report = root.path().join("Sales - DEV/Invoice.rpt");
    write_file(&report, "rpt");

    let scan = scan_environment(root.path(), &no_exclusions()).expect("scan environment");
    assert_eq!(scan.snapshot.keys(), ["SALES - Invoice"]);

    let modified = fs::metadata(&report)
        .expect("stat report")
        .modified()
        .expect("read mtime");
    assert_eq!(
        scan.snapshot.date("SALES - Invoice"),
        Some(format_date(modified).as_str())
    );
}

#[test]
fn non_report_files_and_nested_folders_are_extras() {
    let root = TempDir::new().expect("create temp root");
    write_file(&root.path().join("Sales - DEV/Invoice.rpt"), "rpt");
    write_file(&root.path().join("Sales - DEV/Invoice.db"), "db");
    write_file(&root.path().join("Sales - DEV/notes.txt"), "notes");
    fs::create_dir_all(root.path().join("Sales - DEV/archive")).expect("create nested dir");

    let scan = scan_environment(root.path(), &no_exclusions()).expect("scan environment");
    assert_eq!(scan.snapshot.len(), 1);
    assert_eq!(scan.extras.files.len(), 1, "only notes.txt is extra");
    assert!(scan.extras.files[0].ends_with("notes.txt"));
    assert_eq!(scan.extras.folders.len(), 1);
    assert!(scan.extras.folders[0].ends_with("archive"));
}

#[test]
fn nested_folders_are_not_descended_into() {
    let root = TempDir::new().expect("create temp root");
    write_file(&root.path().join("Sales - DEV/archive/Old.rpt"), "rpt");

    let scan = scan_environment(root.path(), &no_exclusions()).expect("scan environment");
    assert!(scan.snapshot.is_empty(), "reports below depth two are unseen");
    assert_eq!(scan.extras.folders.len(), 1);
}

#[test]
fn excluded_folders_match_by_substring() {
    let root = TempDir::new().expect("create temp root");
    write_file(&root.path().join("Testing stuff/Hidden.rpt"), "rpt");
    write_file(&root.path().join("Sales - DEV/Invoice.rpt"), "rpt");

    let excluded = vec!["Testing".to_string()];
    let scan = scan_environment(root.path(), &excluded).expect("scan environment");
    assert_eq!(scan.snapshot.keys(), ["SALES - Invoice"]);
    assert!(scan.extras.files.is_empty());
}

#[test]
fn files_at_the_root_are_ignored() {
    let root = TempDir::new().expect("create temp root");
    write_file(&root.path().join("readme.md"), "stray");
    write_file(&root.path().join("Sales - DEV/Invoice.rpt"), "rpt");

    let scan = scan_environment(root.path(), &no_exclusions()).expect("scan environment");
    assert_eq!(scan.snapshot.len(), 1);
    assert!(scan.extras.files.is_empty());
}

#[test]
fn scanning_twice_is_idempotent() {
    let root = TempDir::new().expect("create temp root");
    write_file(&root.path().join("Sales - DEV/Invoice.rpt"), "rpt");
    write_file(&root.path().join("Ops - DEV/Runbook.rpt"), "rpt");
    write_file(&root.path().join("Billing - DEV/Cycle.rpt"), "rpt");

    let first = scan_environment(root.path(), &no_exclusions()).expect("first scan");
    let second = scan_environment(root.path(), &no_exclusions()).expect("second scan");
    assert_eq!(first.snapshot.keys(), second.snapshot.keys());
    for key in first.snapshot.keys() {
        assert_eq!(first.snapshot.date(key), second.snapshot.date(key));
    }
}

#[test]
fn colliding_keys_are_reported_and_last_seen_wins() {
    let root = TempDir::new().expect("create temp root");
    // Both category folders normalize to SALES, so the two artifacts share
    // one key.
    write_file(&root.path().join("Sales - DEV/Invoice.rpt"), "rpt");
    write_file(&root.path().join("Sales - QA/Invoice.rpt"), "rpt");

    let scan = scan_environment(root.path(), &no_exclusions()).expect("scan environment");
    assert_eq!(scan.snapshot.len(), 1);
    assert_eq!(scan.collisions.len(), 1);
    assert_eq!(scan.collisions[0].key, "SALES - Invoice");
    assert!(scan.collisions[0].path.ends_with("Invoice.rpt"));
}

#[test]
fn missing_root_is_an_error() {
    let root = TempDir::new().expect("create temp root");
    let missing = root.path().join("does-not-exist");
    assert!(scan_environment(&missing, &no_exclusions()).is_err());
}
