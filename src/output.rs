//! Report publishing.
//!
//! The document is staged next to its destination and renamed into place so
//! a failed run never leaves a truncated report behind.
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serialize a report document to pretty JSON and publish it at `path`.
pub fn write_report_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize report JSON")?;

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("report path {} has no file name", path.display()))?;
    let tmp_path = parent
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{file_name}.tmp"));
    fs::write(&tmp_path, text.as_bytes())
        .with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("publish {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_report_json;
    use serde::Serialize;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Serialize)]
    struct Doc {
        name: String,
    }

    #[test]
    fn publishes_into_created_parent_without_tmp_residue() {
        let root = TempDir::new().expect("create temp root");
        let out = root.path().join("reports/inventory.json");
        let doc = Doc {
            name: "inventory".to_string(),
        };

        write_report_json(&out, &doc).expect("publish report");

        let text = fs::read_to_string(&out).expect("read report");
        assert!(text.contains("\"name\": \"inventory\""));

        let residue: Vec<_> = fs::read_dir(out.parent().expect("parent"))
            .expect("list parent")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(residue.is_empty());
    }
}
