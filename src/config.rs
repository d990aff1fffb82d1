//! Optional `annotator.toml` settings. Command-line flags win over file values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::discover::{DiscoverOptions, DEFAULT_EXCLUDE, DEFAULT_EXTENSIONS};
use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "annotator.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    pub strict_inheritance: bool,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude: DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect(),
            include: Vec::new(),
            strict_inheritance: false,
            format: "cpp".to_string(),
        }
    }
}

impl Config {
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, or return defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(path, &text)?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn discover_options(&self) -> DiscoverOptions {
        DiscoverOptions {
            extensions: self.extensions.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

/// An explicit `--config` path, else `annotator.toml` in the working directory if present.
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = cli_path {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from(DEFAULT_CONFIG_FILE);
    default.is_file().then_some(default)
}
