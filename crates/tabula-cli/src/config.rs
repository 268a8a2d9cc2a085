//! Configuration file support for the CLI.
//!
//! Loads and saves CLI configuration from TOML files. Client settings live
//! under a `[client]` table.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tabula_common::ClientConfig;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default output format.
    #[serde(default = "default_format")]
    pub output_format: String,

    /// Row cap for `scan` when `--limit` is not given. Negative means all rows.
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    /// Fixture file loaded into the in-memory store.
    #[serde(default)]
    pub fixture: Option<PathBuf>,

    /// Client settings.
    #[serde(default)]
    pub client: ClientConfig,
}

fn default_format() -> String {
    "table".to_string()
}

fn default_limit() -> i64 {
    -1
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            output_format: default_format(),
            default_limit: default_limit(),
            fixture: None,
            client: ClientConfig::default(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Loads the default configuration file.
    ///
    /// Looks in the following locations:
    /// 1. ~/.config/tabula/config.toml
    /// 2. ~/.tabula/config.toml
    /// 3. Returns default if not found
    pub fn load_default() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".tabula").join("config.toml");
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Returns the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tabula").join("config.toml"))
    }

    /// Returns a builder for configuration.
    pub fn builder() -> CliConfigBuilder {
        CliConfigBuilder::new()
    }
}

/// Builder for CLI configuration.
#[derive(Default)]
pub struct CliConfigBuilder {
    config: CliConfig,
}

impl CliConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the master addresses from a comma-separated list.
    pub fn masters(mut self, masters: &str) -> Self {
        self.config.client.master_addresses = ClientConfig::for_masters(masters).master_addresses;
        self
    }

    /// Sets the table to bind.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.config.client.default_table = Some(table.into());
        self
    }

    /// Sets the output format.
    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.config.output_format = format.into();
        self
    }

    /// Sets the fixture file.
    pub fn fixture(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.fixture = Some(path.into());
        self
    }

    /// Sets the default scan limit.
    pub fn default_limit(mut self, limit: i64) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CliConfig {
        self.config
    }
}
