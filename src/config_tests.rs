use super::{
    default_config, load_config, validate_config, write_config, RunConfig, SecondaryEnv,
    CONFIG_SCHEMA_VERSION,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn valid_config() -> RunConfig {
    RunConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        master_root: PathBuf::from("/srv/reports/Production"),
        environments: vec![
            SecondaryEnv {
                name: "Closing".to_string(),
                root: PathBuf::from("/srv/reports/Closing"),
            },
            SecondaryEnv {
                name: "DEV".to_string(),
                root: PathBuf::from("/srv/reports/DEV"),
            },
        ],
        usage_log: PathBuf::from("/srv/reports/use_log.txt"),
        excluded_folders: vec!["Testing".to_string()],
        excluded_users: vec!["uzz9999".to_string()],
    }
}

#[test]
fn stub_round_trips_through_load() {
    let root = TempDir::new().expect("create temp root");
    let path = root.path().join("recon.json");

    write_config(&path, &default_config()).expect("write stub");
    let loaded = load_config(&path).expect("load stub");
    assert_eq!(loaded.schema_version, CONFIG_SCHEMA_VERSION);
    assert_eq!(loaded.environments.len(), 1);
}

#[test]
fn valid_config_passes_validation() {
    assert!(validate_config(&valid_config()).is_ok());
}

#[test]
fn stub_needs_paths_filled_in() {
    assert!(validate_config(&default_config()).is_err());
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let mut config = valid_config();
    config.schema_version = 99;
    assert!(validate_config(&config).is_err());
}

#[test]
fn duplicate_environment_names_are_rejected() {
    let mut config = valid_config();
    config.environments.push(SecondaryEnv {
        name: "DEV".to_string(),
        root: PathBuf::from("/srv/reports/DEV2"),
    });
    assert!(validate_config(&config).is_err());
}

#[test]
fn empty_environment_root_is_rejected() {
    let mut config = valid_config();
    config.environments[0].root = PathBuf::new();
    assert!(validate_config(&config).is_err());
}

#[test]
fn exclusion_lists_default_to_empty() {
    let root = TempDir::new().expect("create temp root");
    let path = root.path().join("recon.json");
    std::fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "master_root": "/srv/reports/Production",
            "environments": [],
            "usage_log": "/srv/reports/use_log.txt"
        }"#,
    )
    .expect("write config");

    let loaded = load_config(&path).expect("load config");
    assert!(loaded.excluded_folders.is_empty());
    assert!(loaded.excluded_users.is_empty());
}

#[test]
fn missing_config_is_an_error() {
    let root = TempDir::new().expect("create temp root");
    assert!(load_config(&root.path().join("absent.json")).is_err());
}
