use std::fs;

use tempfile::TempDir;
use tote_config::{ConfigDiscovery, ConfigError, validate_fs};

#[test]
fn discovers_toml_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("tote.toml");
    fs::write(&config_path, "[entries]\nmain = \"index.js\"\n").unwrap();

    let discovery = ConfigDiscovery::new(dir.path());
    assert_eq!(discovery.find().unwrap(), config_path);

    let config = discovery.load().unwrap();
    assert_eq!(config.entries["main"].paths(), vec!["index.js"]);
}

#[test]
fn toml_takes_precedence_over_package_json() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tote.toml"), "public_path = \"/toml/\"\n").unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{ "tote": { "public_path": "/pkg/" } }"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    assert_eq!(config.public_path, "/toml/");
}

#[test]
fn loads_from_package_json_field() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{
            "name": "site",
            "tote": {
                "entries": { "main": "index.js", "analytics": "analytics.ts" }
            }
        }"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    let names: Vec<_> = config.entries.keys().cloned().collect();
    assert_eq!(names, vec!["main", "analytics"]);
}

#[test]
fn fs_validation_reports_missing_entry_source() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/index.js"), "console.log(1)").unwrap();
    fs::write(
        dir.path().join("tote.toml"),
        "[entries]\nmain = \"index.js\"\nanalytics = \"analytics.ts\"\n",
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    let err = validate_fs(&config, dir.path()).unwrap_err();
    match err {
        ConfigError::EntrySourceNotFound { entry, path } => {
            assert_eq!(entry, "analytics");
            assert!(path.ends_with("src/analytics.ts"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
