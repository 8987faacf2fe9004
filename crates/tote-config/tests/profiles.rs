//! Tests for configuration profiles and layered loading.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tote_config::{
    AssetKind, BuildMode, ConfigDiscovery, ConfigOverrides, TestPattern, load,
};

fn write_config(dir: &TempDir, body: &str) {
    fs::write(dir.path().join("tote.toml"), body).expect("write config");
}

#[test]
fn profile_overrides_optimization_options() {
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[optimization]
minimize = false
split_chunks = true

[profiles.production.optimization]
minimize = true
split_chunks = false
"#,
    );

    let config = ConfigDiscovery::new(dir.path())
        .load_with_mode(BuildMode::Production)
        .expect("load with profile");

    assert!(config.optimization.minimize);
    assert!(!config.optimization.split_chunks);
    assert_eq!(config.optimization.hash_length, 20);
}

#[test]
fn profile_overrides_dev_options() {
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[dev]
host = "localhost"
port = 3000

[profiles.development.dev]
port = 8080
open = false
compress = false
"#,
    );

    let config = ConfigDiscovery::new(dir.path())
        .load_with_mode(BuildMode::Development)
        .expect("load with profile");

    assert_eq!(config.dev.host, "localhost");
    assert_eq!(config.dev.port, 8080);
    assert!(!config.dev.open);
    assert!(config.dev.history_api_fallback);
    assert!(!config.dev.compress);
}

#[test]
fn dev_compression_defaults_on() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, "[dev]\nport = 3000\n");

    let config = ConfigDiscovery::new(dir.path())
        .load_with_mode(BuildMode::Development)
        .expect("load");

    assert!(config.dev.compress);
}

#[test]
fn load_layers_file_over_defaults() {
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
public_path = "/static/"

[entries]
main = ["polyfill.js", "index.js"]
"#,
    );

    let config = load(dir.path(), None, &ConfigOverrides::default()).expect("load");

    assert_eq!(config.public_path, "/static/");
    assert_eq!(config.context, PathBuf::from("src"));
    assert_eq!(config.entries["main"].paths(), vec!["polyfill.js", "index.js"]);
    // default rules survive when the file declares none
    assert_eq!(config.rules.last().map(|r| &r.test), Some(&TestPattern::Any));
}

#[test]
fn file_rules_replace_default_rules() {
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[[rules]]
name = "scripts"
test = { extensions = ["js"] }
kind = "script"
use = [{ transform = "script" }]
"#,
    );

    let config = load(dir.path(), None, &ConfigOverrides::default()).expect("load");

    assert_eq!(config.rules.len(), 1);
    assert_eq!(config.rules[0].kind, AssetKind::Script);
}

#[test]
fn cli_overrides_win_and_select_profile() {
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
mode = "development"
output_root = "build"

[profiles.production]
public_path = "/cdn/"
"#,
    );

    let overrides = ConfigOverrides {
        mode: Some(BuildMode::Production),
        port: Some(4000),
        ..Default::default()
    };
    let config = load(dir.path(), None, &overrides).expect("load");

    assert_eq!(config.mode, BuildMode::Production);
    assert_eq!(config.public_path, "/cdn/");
    assert_eq!(config.output_root, PathBuf::from("build"));
    assert_eq!(config.dev.port, 4000);
}

#[test]
fn explicit_config_path_is_used() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("site.toml"), "public_path = \"/site/\"\n").expect("write");

    let config = load(
        dir.path(),
        Some(std::path::Path::new("site.toml")),
        &ConfigOverrides::default(),
    )
    .expect("load");

    assert_eq!(config.public_path, "/site/");
}

#[test]
fn invalid_toml_reports_hint() {
    let dir = TempDir::new().expect("tempdir");
    write_config(&dir, "public_path = [unclosed");

    let err = load(dir.path(), None, &ConfigOverrides::default()).unwrap_err();
    assert!(err.hint().unwrap_or_default().contains("TOML"));
}

#[test]
fn load_keeps_entry_declaration_order() {
    let dir = TempDir::new().expect("tempdir");
    write_config(
        &dir,
        r#"
[entries]
zeta = "z.js"
main = "index.js"
analytics = "analytics.ts"
"#,
    );

    let config = load(dir.path(), None, &ConfigOverrides::default()).expect("load");
    let names: Vec<_> = config.entries.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["zeta", "main", "analytics"]);
}
