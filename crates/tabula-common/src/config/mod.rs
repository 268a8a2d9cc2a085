//! Client configuration.
//!
//! Store addresses, the connection-level read timeout, and scan batching.
//! Configuration can be built in code or loaded from a TOML file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TabulaError, TabulaResult};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Master addresses (`host:port`).
    #[serde(default = "default_master_addresses")]
    pub master_addresses: Vec<String>,

    /// Socket read timeout in milliseconds, fixed for the life of the client.
    #[serde(default = "default_socket_read_timeout_ms")]
    pub socket_read_timeout_ms: u64,

    /// Rows per scan page requested from the store.
    #[serde(default = "default_scan_batch_size_rows")]
    pub scan_batch_size_rows: usize,

    /// Table to bind at construction.
    #[serde(default)]
    pub default_table: Option<String>,

    /// Cache opened tables by name across calls.
    #[serde(default)]
    pub schema_cache: bool,
}

fn default_master_addresses() -> Vec<String> {
    vec!["localhost:7051".to_string()]
}

fn default_socket_read_timeout_ms() -> u64 {
    6000
}

fn default_scan_batch_size_rows() -> usize {
    1024
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            master_addresses: default_master_addresses(),
            socket_read_timeout_ms: default_socket_read_timeout_ms(),
            scan_batch_size_rows: default_scan_batch_size_rows(),
            default_table: None,
            schema_cache: false,
        }
    }
}

impl ClientConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for a comma-separated master list.
    pub fn for_masters(masters: &str) -> Self {
        Self {
            master_addresses: parse_master_list(masters),
            ..Self::default()
        }
    }

    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> TabulaResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TabulaError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> TabulaResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| TabulaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> TabulaResult<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TabulaError::Config(format!("{}: {}", parent.display(), e)))?;
        }

        std::fs::write(path, content)
            .map_err(|e| TabulaError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Converts configuration to TOML string.
    pub fn to_toml(&self) -> TabulaResult<String> {
        toml::to_string_pretty(self).map_err(|e| TabulaError::Config(e.to_string()))
    }

    /// Checks the configuration for values the client cannot work with.
    pub fn validate(&self) -> TabulaResult<()> {
        if self.master_addresses.is_empty() {
            return Err(TabulaError::InvalidConfig(
                "at least one master address is required".to_string(),
            ));
        }
        if let Some(addr) = self.master_addresses.iter().find(|a| a.trim().is_empty()) {
            return Err(TabulaError::InvalidConfig(format!(
                "empty master address in {:?}",
                addr
            )));
        }
        if self.socket_read_timeout_ms == 0 {
            return Err(TabulaError::InvalidConfig(
                "socket_read_timeout_ms must be positive".to_string(),
            ));
        }
        if self.scan_batch_size_rows == 0 {
            return Err(TabulaError::InvalidConfig(
                "scan_batch_size_rows must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the socket read timeout.
    pub fn socket_read_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_read_timeout_ms)
    }

    /// Returns the masters as a comma-separated list.
    pub fn masters_string(&self) -> String {
        self.master_addresses.join(",")
    }

    /// Creates a builder for configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }
}

/// Splits a comma-separated master list, dropping blanks.
fn parse_master_list(masters: &str) -> Vec<String> {
    masters
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builder for client configuration.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
    masters_set: bool,
}

impl ClientConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the master addresses from a comma-separated list.
    pub fn masters(mut self, masters: &str) -> Self {
        self.config.master_addresses = parse_master_list(masters);
        self.masters_set = true;
        self
    }

    /// Adds one master address. The first call replaces the default master.
    pub fn master(mut self, addr: impl Into<String>) -> Self {
        if !self.masters_set {
            self.config.master_addresses.clear();
            self.masters_set = true;
        }
        self.config.master_addresses.push(addr.into());
        self
    }

    /// Sets the socket read timeout.
    pub fn socket_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.socket_read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the scan page size.
    pub fn scan_batch_size_rows(mut self, rows: usize) -> Self {
        self.config.scan_batch_size_rows = rows;
        self
    }

    /// Sets the table bound at construction.
    pub fn default_table(mut self, table: impl Into<String>) -> Self {
        self.config.default_table = Some(table.into());
        self
    }

    /// Enables the cross-call table cache.
    pub fn schema_cache(mut self, enabled: bool) -> Self {
        self.config.schema_cache = enabled;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> TabulaResult<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
