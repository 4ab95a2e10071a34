use std::path::{Path, PathBuf};

use ampere_core::{NumberingConfig, PricingConfig, StorageConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "ampere.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or full `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,

    /// Append log records to this file as well as stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Everything read from `ampere.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub pricing: PricingConfig,
    pub numbering: NumberingConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse config")
    }

    /// Load config from `path`, or from [`DEFAULT_CONFIG_PATH`] when `path`
    /// is `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config at {}", path.display()))
    }

    /// Command-line flags beat the file.
    pub fn with_overrides(
        mut self,
        backend: Option<String>,
        connection_string: Option<String>,
    ) -> Self {
        if let Some(backend) = backend {
            self.storage.backend = backend;
        }
        if let Some(connection_string) = connection_string {
            self.storage.connection_string = connection_string;
        }
        self
    }
}
