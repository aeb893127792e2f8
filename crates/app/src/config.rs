use accounts_helper_core::AmountFormat;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Usage count given to a newly taught payee mapping.
    pub seed_usage_count: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            seed_usage_count: accounts_helper_import::matcher::DEFAULT_SEED_USAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Defaults to `ledger.db` in the platform data directory.
    pub database_path: Option<PathBuf>,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub format: AmountFormat,
    pub matcher: MatcherConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: "info".to_string(),
            format: AmountFormat::default(),
            matcher: MatcherConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "accountshelper", "AccountsHelper")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn default_database_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join("ledger.db"))
}
