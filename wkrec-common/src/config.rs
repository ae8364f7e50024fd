//! Configuration loading and resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `WKREC_CONFIG` environment variable
//! 3. Per-user / system TOML config file
//! 4. Compiled defaults (fallback, with a warning)
//!
//! After the file is loaded, individual `WKREC_*` environment variables
//! override the matching fields.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "WKREC_CONFIG";
/// Environment variable overriding `server.bind_addr`
pub const BIND_ENV_VAR: &str = "WKREC_BIND";
/// Environment variable overriding `store.database_url`
pub const DATABASE_URL_ENV_VAR: &str = "WKREC_DATABASE_URL";

/// Complete service configuration as read from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub store: StoreConfig,
    pub article: ArticleConfig,
    /// Domains served by the caption endpoints
    pub caption_allowed_domains: Vec<String>,
    /// Domains served by the description endpoints
    pub description_allowed_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:6927".to_string(),
        }
    }
}

/// Settings for the wiki content and structured-data APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL scheme used to reach `{domain}{api_path}`
    pub scheme: String,
    pub api_path: String,
    pub user_agent: String,
    /// Per-request timeout; a hung call ends as a transient failure
    pub timeout_secs: u64,
    pub requests_per_second: u32,
    /// Extra attempts for transient failures
    pub retries: u32,
    pub retry_delay_ms: u64,
    /// Maximum ids per `wbgetentities` / protection request
    pub entity_batch_limit: usize,
    /// Wiki queried for the language-variant table
    pub meta_domain: String,
    /// Structured-data wiki (entities, protection)
    pub structured_data_domain: String,
    /// Project suffix for content wikis (`{lang}.{project}`)
    pub content_project: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            api_path: "/w/api.php".to_string(),
            user_agent: format!("wkrec/{} (suggested edits recommendations)", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            requests_per_second: 50,
            retries: 1,
            retry_delay_ms: 200,
            entity_batch_limit: 50,
            meta_domain: "meta.wikimedia.org".to_string(),
            structured_data_domain: "www.wikidata.org".to_string(),
            content_project: "wikipedia.org".to_string(),
        }
    }
}

/// Ranking store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Extra attempts after a failed ranking query
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://recommendations.db".to_string(),
            max_connections: 10,
            retries: 2,
            retry_delay_ms: 100,
        }
    }
}

/// Article recommendation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleConfig {
    /// Target language -> source languages with a trained model
    pub translation_models: BTreeMap<String, Vec<String>>,
    /// Page size of the popularity query
    pub mostviewed_limit: u32,
    /// Page size of the similarity query
    pub morelike_limit: u32,
}

impl Default for ArticleConfig {
    fn default() -> Self {
        Self {
            translation_models: BTreeMap::new(),
            mostviewed_limit: 500,
            morelike_limit: 500,
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config: TomlConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.upstream.entity_batch_limit == 0 {
            return Err(Error::Config("upstream.entity_batch_limit must be > 0".to_string()));
        }
        if self.upstream.requests_per_second == 0 {
            return Err(Error::Config("upstream.requests_per_second must be > 0".to_string()));
        }
        if self.store.max_connections == 0 {
            return Err(Error::Config("store.max_connections must be > 0".to_string()));
        }
        Ok(())
    }

    /// Apply `WKREC_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(bind) = std::env::var(BIND_ENV_VAR) {
            info!("Bind address overridden by {}", BIND_ENV_VAR);
            self.server.bind_addr = bind;
        }
        if let Ok(url) = std::env::var(DATABASE_URL_ENV_VAR) {
            info!("Database URL overridden by {}", DATABASE_URL_ENV_VAR);
            self.store.database_url = url;
        }
    }
}

/// Locate the config file for a module
///
/// Returns `None` when no candidate exists; callers fall back to defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: User config, then system config
    let file_name = format!("{}.toml", module_name);
    let user_config = dirs::config_dir().map(|d| d.join("wkrec").join(&file_name));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc/wkrec").join(&file_name);
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Resolve, load and override the module configuration
///
/// A missing config file is not fatal: defaults are used and a warning is
/// logged. A config file that exists but does not parse is an error.
pub fn load_config(cli_arg: Option<&Path>, module_name: &str) -> Result<TomlConfig> {
    let mut config = match resolve_config_path(cli_arg, module_name) {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            TomlConfig::load(&path)?
        }
        Some(path) => {
            warn!("Config file {} not found, using defaults", path.display());
            TomlConfig::default()
        }
        None => {
            warn!("No config file found for {}, using defaults", module_name);
            TomlConfig::default()
        }
    };

    config.apply_env_overrides();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.upstream.entity_batch_limit, 50);
        assert_eq!(config.store.retries, 2);
        assert_eq!(config.article.mostviewed_limit, 500);
        assert!(config.article.translation_models.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            caption_allowed_domains = ["commons.wikimedia.org"]

            [store]
            retries = 5

            [article.translation_models]
            uz = ["en", "ru"]
            "#,
        )
        .unwrap();

        assert_eq!(config.store.retries, 5);
        assert_eq!(config.store.max_connections, 10);
        assert_eq!(config.caption_allowed_domains, vec!["commons.wikimedia.org"]);
        assert_eq!(
            config.article.translation_models.get("uz"),
            Some(&vec!["en".to_string(), "ru".to_string()])
        );
        assert_eq!(config.upstream.meta_domain, "meta.wikimedia.org");
    }

    #[test]
    fn test_validate_rejects_zero_batch_limit() {
        let mut config = TomlConfig::default();
        config.upstream.entity_batch_limit = 0;
        assert!(config.validate().is_err());
    }
}
