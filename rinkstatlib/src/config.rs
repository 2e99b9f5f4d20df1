//! Configuration file support.
//!
//! Settings are read from a TOML file:
//!
//! ```toml
//! database = "data/hockey.db"
//!
//! [render]
//! padding = 3
//! rank_header = "Rank"
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RinkstatError;
use crate::render::{TableRenderer, DEFAULT_PADDING, DEFAULT_RANK_HEADER};
use crate::Result;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "rinkstat.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQLite database file
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// Table rendering settings
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[render]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Gap between columns
    pub padding: usize,
    /// Header of the rank column in ranked reports
    pub rank_header: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
            rank_header: DEFAULT_RANK_HEADER.to_string(),
        }
    }
}

impl RenderConfig {
    pub fn renderer(&self) -> TableRenderer {
        TableRenderer::with_padding(self.padding)
    }
}

impl Config {
    /// Parse configuration text. `origin` is used in error messages only.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| RinkstatError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read a configuration file that must exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RinkstatError::PathNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| RinkstatError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, path)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve configuration: an explicit file, else `rinkstat.toml` in `dir`
    /// when present, else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::from_file(candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Builder: override the database path
    pub fn with_database(mut self, database: impl Into<PathBuf>) -> Self {
        self.database = Some(database.into());
        self
    }
}
