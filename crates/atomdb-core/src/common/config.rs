//! Database location and loader settings.

use crate::registry::Dataset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATAPATH_ENV: &str = "ATOMDB_DATAPATH";
pub const DATASET_ENV: &str = "ATOMDB_DATASET";
pub const DEFAULT_DATAPATH: &str = "datasets";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtomDbConfig {
    /// Root directory holding one sub-directory per dataset.
    pub datapath: PathBuf,
    pub default_dataset: Dataset,
    /// Keep parsed records in memory keyed by species and dataset.
    pub memoize: bool,
}

impl Default for AtomDbConfig {
    fn default() -> Self {
        Self {
            datapath: PathBuf::from(DEFAULT_DATAPATH),
            default_dataset: Dataset::default(),
            memoize: false,
        }
    }
}

impl AtomDbConfig {
    pub fn new(datapath: impl Into<PathBuf>) -> Self {
        Self {
            datapath: datapath.into(),
            ..Self::default()
        }
    }

    pub fn with_default_dataset(mut self, dataset: Dataset) -> Self {
        self.default_dataset = dataset;
        self
    }

    pub fn with_memoization(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Defaults overridden by `ATOMDB_DATAPATH` and `ATOMDB_DATASET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(datapath) = lookup(DATAPATH_ENV).filter(|value| !value.trim().is_empty()) {
            config.datapath = PathBuf::from(datapath);
        }
        if let Some(dataset) = lookup(DATASET_ENV).filter(|value| !value.trim().is_empty()) {
            config.default_dataset = dataset.parse().map_err(|_| ConfigError::UnknownDataset {
                variable: DATASET_ENV,
                value: dataset.clone(),
            })?;
        }
        Ok(config)
    }

    pub fn dataset_root(&self, dataset: Dataset) -> PathBuf {
        self.datapath.join(dataset.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read atomdb config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse atomdb config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{variable} names unknown dataset '{value}'")]
    UnknownDataset {
        variable: &'static str,
        value: String,
    },
}

pub fn load_config(config_path: impl AsRef<Path>) -> Result<AtomDbConfig, ConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}
