//! Run configuration.
//!
//! All inputs come from a versioned JSON file: the master root, the named
//! secondary environments, the usage-log path, and the exclusion lists.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for the run config file.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// One secondary environment to compare against the master tree.
#[derive(Debug, Serialize, Deserialize)]
pub struct SecondaryEnv {
    /// Display name used for the report columns.
    pub name: String,
    pub root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub schema_version: u32,
    pub master_root: PathBuf,
    pub environments: Vec<SecondaryEnv>,
    pub usage_log: PathBuf,
    /// Folder-name substrings skipped during walks and matched exactly as
    /// the log's report folder.
    #[serde(default)]
    pub excluded_folders: Vec<String>,
    /// User ids dropped from log processing, matched case-insensitively.
    #[serde(default)]
    pub excluded_users: Vec<String>,
}

/// Build the stub written by `init`; paths are left blank to fill in.
pub fn default_config() -> RunConfig {
    RunConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        master_root: PathBuf::new(),
        environments: vec![SecondaryEnv {
            name: "DEV".to_string(),
            root: PathBuf::new(),
        }],
        usage_log: PathBuf::new(),
        excluded_folders: Vec::new(),
        excluded_users: Vec::new(),
    }
}

/// Load the run config from `path`.
pub fn load_config(path: &Path) -> Result<RunConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: RunConfig = serde_json::from_slice(&bytes).context("parse run config JSON")?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(path: &Path, config: &RunConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize run config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate config schema and the user-provided paths and names.
pub fn validate_config(config: &RunConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported run config schema_version {}",
            config.schema_version
        ));
    }
    if config.master_root.as_os_str().is_empty() {
        return Err(anyhow!("master_root must be non-empty"));
    }
    if config.usage_log.as_os_str().is_empty() {
        return Err(anyhow!("usage_log must be non-empty"));
    }
    let mut seen = BTreeSet::new();
    for env in &config.environments {
        if env.name.trim().is_empty() {
            return Err(anyhow!("environment names must be non-empty"));
        }
        if env.root.as_os_str().is_empty() {
            return Err(anyhow!(
                "environment {:?} must have a non-empty root",
                env.name
            ));
        }
        if !seen.insert(env.name.as_str()) {
            return Err(anyhow!("duplicate environment name {:?}", env.name));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
