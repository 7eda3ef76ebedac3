//! Configuration loading and graceful degradation
//!
//! Tests that manipulate RECITAL_CONFIG are marked #[serial] so they do not
//! race each other on the process environment.

use recital_common::config::{
    load_config, resolve_config_path, write_toml_config, TomlConfig, CONFIG_ENV_VAR,
};
use recital_common::{Error, ProgramFormat};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_var_used_without_cli_arg() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/recital-env.toml");

    let path = resolve_config_path(None);
    assert_eq!(path, Some(PathBuf::from("/tmp/recital-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_arg_beats_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/recital-env.toml");

    let path = resolve_config_path(Some(Path::new("/tmp/recital-cli.toml")));
    assert_eq!(path, Some(PathBuf::from("/tmp/recital-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let path = resolve_config_path(None);
    assert_ne!(path, Some(PathBuf::from("   ")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("absent.toml");

    let config = load_config(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_no_file_uses_defaults() {
    let config = load_config(None).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_load_file_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        [api]
        current_program_url = "http://stage.local/api/current-program"

        [program]
        source = "http://stage.local/api/sequences"
        format = "sequences"

        [display]
        poll_interval_ms = 8000

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(
        config.api.current_program_url,
        "http://stage.local/api/current-program"
    );
    assert_eq!(config.program.format, ProgramFormat::Sequences);
    assert_eq!(config.display.poll_interval_ms, 8000);
    assert_eq!(config.display.notice_duration_ms, 3000);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[api\nuse_api = maybe").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_invalid_values_are_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[display]\npoll_interval_ms = 0\n").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("poll_interval_ms"));
}

#[test]
fn test_write_then_load_preserves_settings() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("recital").join("config.toml");

    let mut config = TomlConfig::default();
    config.api.use_api = false;
    config.cache_path = Some(PathBuf::from("/var/tmp/recital-cache.json"));
    config.display.poll_interval_ms = 8000;

    write_toml_config(&config, &path).unwrap();
    assert!(path.exists());
    assert!(!temp_dir.path().join("recital").join("config.toml.tmp").exists());

    let loaded = load_config(Some(&path)).unwrap();
    assert_eq!(loaded, config);
}
