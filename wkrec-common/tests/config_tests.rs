//! Configuration resolution tests
//!
//! Covers:
//! - CLI path beats the WKREC_CONFIG environment variable
//! - Missing config files fall back to defaults without failing
//! - Malformed config files are reported as errors
//! - WKREC_* field overrides
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.

use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;
use wkrec_common::config::{
    load_config, resolve_config_path, TomlConfig, BIND_ENV_VAR, CONFIG_ENV_VAR,
    DATABASE_URL_ENV_VAR,
};

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(BIND_ENV_VAR);
    env::remove_var(DATABASE_URL_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_path_has_priority_over_env() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/wkrec-env.toml");

    let cli = std::path::PathBuf::from("/tmp/wkrec-cli.toml");
    let resolved = resolve_config_path(Some(&cli), "wkrec-se");
    assert_eq!(resolved, Some(cli));

    clear_env();
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/wkrec-env.toml");

    let resolved = resolve_config_path(None, "wkrec-se");
    assert_eq!(resolved, Some(std::path::PathBuf::from("/tmp/wkrec-env.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.toml");

    let config = load_config(Some(&missing), "wkrec-se").expect("defaults expected");
    assert_eq!(config.upstream.entity_batch_limit, 50);
    assert_eq!(config.server.bind_addr, TomlConfig::default().server.bind_addr);
}

#[test]
#[serial]
fn test_file_values_loaded() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wkrec-se.toml");
    fs::write(
        &path,
        r#"
        description_allowed_domains = ["www.wikidata.org"]

        [server]
        bind_addr = "0.0.0.0:8080"

        [upstream]
        entity_batch_limit = 25

        [article.translation_models]
        uz = ["en"]
        "#,
    )
    .unwrap();

    let config = load_config(Some(&path), "wkrec-se").unwrap();
    assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
    assert_eq!(config.upstream.entity_batch_limit, 25);
    assert_eq!(config.description_allowed_domains, vec!["www.wikidata.org"]);
    assert!(config.article.translation_models.contains_key("uz"));
}

#[test]
#[serial]
fn test_malformed_file_is_error() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.toml");
    fs::write(&path, "[server\nbind_addr = ").unwrap();

    assert!(load_config(Some(&path), "wkrec-se").is_err());
}

#[test]
#[serial]
fn test_env_overrides_apply_after_file() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("wkrec-se.toml");
    fs::write(&path, "[server]\nbind_addr = \"127.0.0.1:1\"\n").unwrap();

    env::set_var(BIND_ENV_VAR, "127.0.0.1:9999");
    env::set_var(DATABASE_URL_ENV_VAR, "sqlite::memory:");

    let config = load_config(Some(&path), "wkrec-se").unwrap();
    assert_eq!(config.server.bind_addr, "127.0.0.1:9999");
    assert_eq!(config.store.database_url, "sqlite::memory:");

    clear_env();
}
