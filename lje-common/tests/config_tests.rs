//! Configuration loading and root folder resolution
//!
//! Tests that touch LJE_ROOT_FOLDER are marked #[serial] so they never race
//! on the process environment.

use lje_common::config::{default_root_folder, resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_default_root_folder_is_named_for_the_app() {
    let root = default_root_folder();
    assert!(!root.as_os_str().is_empty());
    assert!(root.to_string_lossy().contains("laserjuke"));
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = TomlConfig::load_or_default(Some(&dir.path().join("absent.toml")));
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_invalid_config_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "port = [not toml").unwrap();
    assert_eq!(TomlConfig::load_or_default(Some(&path)), TomlConfig::default());
}

#[test]
fn test_config_file_values_loaded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
root_folder = "/srv/jukebox"
lists_dir = "custom_lists"
session_idle_minutes = 15

[logging]
level = "warn"
file = "/var/log/lje.log"
"#,
    )
    .unwrap();

    let config = TomlConfig::load_or_default(Some(&path));
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/jukebox")));
    assert_eq!(config.session_idle_minutes, 15);
    assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/lje.log")));
    assert_eq!(config.port, 5790);

    let sources = config.data_sources(Path::new("/srv/jukebox"));
    assert_eq!(sources.lists_dir, PathBuf::from("/srv/jukebox/custom_lists"));
}

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/lje-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/lje-toml")),
        ..TomlConfig::default()
    };

    let root = resolve_root_folder(Some(Path::new("/tmp/lje-cli")), &config);
    assert_eq!(root, PathBuf::from("/tmp/lje-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/lje-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/lje-toml")),
        ..TomlConfig::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/lje-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/lje-toml")),
        ..TomlConfig::default()
    };
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/lje-toml"));
    assert_eq!(resolve_root_folder(None, &TomlConfig::default()), default_root_folder());
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    env::set_var(ROOT_FOLDER_ENV, "  ");
    assert_eq!(resolve_root_folder(None, &TomlConfig::default()), default_root_folder());
    env::remove_var(ROOT_FOLDER_ENV);
}
