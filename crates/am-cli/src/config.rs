//! Optional `archimodel.toml` configuration.

use std::path::{Path, PathBuf};

use am_extract::ExtractOptions;
use am_layout::GridConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// File looked up in the vault root when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "archimodel.toml";

pub const DEFAULT_FILE_STEM: &str = "archimate-model";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub model_name: Option<String>,
    pub extract: ExtractOptions,
    pub layout: GridConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub file_stem: Option<String>,
}

impl OutputConfig {
    #[must_use]
    pub fn file_stem(&self) -> &str {
        self.file_stem
            .as_deref()
            .map(str::trim)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(DEFAULT_FILE_STEM)
    }
}

impl ExportConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The explicit file if given, else `archimodel.toml` in the vault root,
    /// else defaults.
    pub fn discover(explicit: Option<&Path>, vault: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading configuration from: {}", path.display());
            return Self::load(path);
        }
        let candidate = vault.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            info!("Loading configuration from: {}", candidate.display());
            Self::load(&candidate)
        } else {
            debug!("No {CONFIG_FILE_NAME} in vault, using defaults");
            Ok(Self::default())
        }
    }
}
