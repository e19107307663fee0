//! TOML configuration for `taxinsight`.
//!
//! ```toml
//! log_level = "info"           # optional; RUST_LOG still wins
//! log_file = "taxinsight.log"  # optional; appended to
//! tables = "regime_tables.csv" # optional; replaces the built-in tables
//!
//! [registry]
//! huf_schedule = "statutory"   # or "legacy"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.
//! Command-line flags override every value here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tax_core::RegistryConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub tables: Option<PathBuf>,
    pub registry: RegistryConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Reads `path` and resolves its relative paths against the file's
    /// directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let base = path.parent().unwrap_or(Path::new(""));
        Ok(config.resolve_paths(base))
    }

    fn resolve_paths(
        mut self,
        base: &Path,
    ) -> Self {
        let resolve = |p: PathBuf| if p.is_relative() { base.join(p) } else { p };
        self.log_file = self.log_file.map(resolve);
        self.tables = self.tables.map(resolve);
        self
    }
}
