//! Named datasets and the sources backing them.

mod source;

pub use source::{DataSource, DirectorySource, MemorySource, SourceError};

use crate::common::config::AtomDbConfig;
use crate::domain::{AtomDbError, AtomDbResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

/// Every dataset this build knows how to read.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// Heat-bath configuration interaction.
    #[default]
    Hci,
    /// Slater-type orbital Hartree-Fock.
    Slater,
    /// Gaussian basis Hartree-Fock.
    Gaussian,
    /// Numerical Hartree-Fock on a radial grid.
    Numeric,
    /// NIST atomic reference data.
    Nist,
}

impl Dataset {
    pub const ALL: [Self; 5] = [
        Self::Hci,
        Self::Slater,
        Self::Gaussian,
        Self::Numeric,
        Self::Nist,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hci => "hci",
            Self::Slater => "slater",
            Self::Gaussian => "gaussian",
            Self::Numeric => "numeric",
            Self::Nist => "nist",
        }
    }

    /// Only ground states are compiled for the current datasets.
    pub const fn supports_excited_states(self) -> bool {
        false
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for Dataset {
    type Err = AtomDbError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim();
        Self::ALL
            .into_iter()
            .find(|dataset| dataset.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| AtomDbError::UnknownDataset {
                dataset: name.to_string(),
            })
    }
}

/// Immutable mapping from dataset to backing source.
///
/// Built once (from a config or a builder) and handed to the loader; there is
/// no process-wide instance.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    sources: BTreeMap<Dataset, Arc<dyn DataSource>>,
}

impl DatasetRegistry {
    pub fn builder() -> DatasetRegistryBuilder {
        DatasetRegistryBuilder::default()
    }

    /// One [`DirectorySource`] per enumerated dataset under `config.datapath`.
    pub fn from_config(config: &AtomDbConfig) -> Self {
        Dataset::ALL
            .into_iter()
            .fold(Self::builder(), |builder, dataset| {
                builder.register(
                    dataset,
                    DirectorySource::new(config.dataset_root(dataset)),
                )
            })
            .build()
    }

    pub fn resolve(&self, dataset_name: &str) -> AtomDbResult<(Dataset, Arc<dyn DataSource>)> {
        let dataset: Dataset = dataset_name.parse()?;
        let source = self
            .sources
            .get(&dataset)
            .cloned()
            .ok_or_else(|| AtomDbError::UnknownDataset {
                dataset: dataset_name.to_string(),
            })?;
        tracing::debug!(dataset = %dataset, "resolved dataset source");
        Ok((dataset, source))
    }

    pub fn datasets(&self) -> impl Iterator<Item = Dataset> + '_ {
        self.sources.keys().copied()
    }

    pub fn contains(&self, dataset: Dataset) -> bool {
        self.sources.contains_key(&dataset)
    }
}

#[derive(Debug, Default)]
pub struct DatasetRegistryBuilder {
    sources: BTreeMap<Dataset, Arc<dyn DataSource>>,
}

impl DatasetRegistryBuilder {
    /// Registers `source` for `dataset`, replacing any earlier registration.
    pub fn register(mut self, dataset: Dataset, source: impl DataSource + 'static) -> Self {
        self.sources.insert(dataset, Arc::new(source));
        self
    }

    pub fn register_shared(mut self, dataset: Dataset, source: Arc<dyn DataSource>) -> Self {
        self.sources.insert(dataset, source);
        self
    }

    pub fn build(self) -> DatasetRegistry {
        DatasetRegistry {
            sources: self.sources,
        }
    }
}
