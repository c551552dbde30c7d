//! Loading species records out of registered datasets.

use crate::common::config::AtomDbConfig;
use crate::domain::{AtomDbError, AtomDbResult, SpeciesKey};
use crate::record::SpeciesRecord;
use crate::registry::{DataSource, Dataset, DatasetRegistry, SourceError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type RecordCache = Mutex<HashMap<(SpeciesKey, Dataset), Arc<SpeciesRecord>>>;

/// Turns `(species, dataset)` requests into validated [`SpeciesRecord`]s.
///
/// Checks run in a fixed order: key validity, dataset resolution, excitation
/// support, presence in the source, then the record schema. With memoization
/// enabled, parsed records are kept for the lifetime of the loader.
#[derive(Debug)]
pub struct RecordLoader {
    registry: DatasetRegistry,
    default_dataset: Dataset,
    cache: Option<RecordCache>,
}

impl RecordLoader {
    pub fn new(registry: DatasetRegistry) -> Self {
        Self {
            registry,
            default_dataset: Dataset::default(),
            cache: None,
        }
    }

    /// Directory-backed loader honouring the configured default dataset and
    /// memoization flag.
    pub fn from_config(config: &AtomDbConfig) -> Self {
        let loader = Self::new(DatasetRegistry::from_config(config))
            .with_default_dataset(config.default_dataset);
        if config.memoize {
            loader.with_memoization()
        } else {
            loader
        }
    }

    pub fn with_default_dataset(mut self, dataset: Dataset) -> Self {
        self.default_dataset = dataset;
        self
    }

    pub fn with_memoization(mut self) -> Self {
        self.cache = Some(Mutex::new(HashMap::new()));
        self
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub const fn default_dataset(&self) -> Dataset {
        self.default_dataset
    }

    pub fn is_memoizing(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of records held by the memoization map.
    pub fn memoized_len(&self) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |cache| lock_cache(cache).len())
    }

    pub fn load(&self, key: &SpeciesKey, dataset_name: &str) -> AtomDbResult<SpeciesRecord> {
        self.load_shared(key, dataset_name).map(Arc::unwrap_or_clone)
    }

    pub fn load_default(&self, key: &SpeciesKey) -> AtomDbResult<SpeciesRecord> {
        self.load(key, self.default_dataset.as_str())
    }

    /// Like [`RecordLoader::load`], sharing the memoized record instead of
    /// cloning it.
    pub fn load_shared(
        &self,
        key: &SpeciesKey,
        dataset_name: &str,
    ) -> AtomDbResult<Arc<SpeciesRecord>> {
        key.validate()?;
        let (dataset, source) = self.registry.resolve(dataset_name)?;

        if !key.is_ground_state() && !dataset.supports_excited_states() {
            return Err(AtomDbError::UnsupportedState {
                species: key.to_string(),
                dataset: dataset.to_string(),
                excitation_index: key.excitation_index(),
            });
        }

        let Some(cache) = &self.cache else {
            return read_record(key, dataset, source.as_ref()).map(Arc::new);
        };

        let cache_key = (key.clone(), dataset);
        if let Some(record) = lock_cache(cache).get(&cache_key) {
            tracing::trace!(species = %key, dataset = %dataset, "memoized record hit");
            return Ok(Arc::clone(record));
        }

        let record = Arc::new(read_record(key, dataset, source.as_ref())?);
        lock_cache(cache).insert(cache_key, Arc::clone(&record));
        Ok(record)
    }
}

fn read_record(
    key: &SpeciesKey,
    dataset: Dataset,
    source: &dyn DataSource,
) -> AtomDbResult<SpeciesRecord> {
    let raw = source
        .read(key)
        .map_err(|error| source_error(key, dataset, error))?
        .ok_or_else(|| AtomDbError::SpeciesNotFound {
            species: key.to_string(),
            dataset: dataset.to_string(),
        })?;

    let record = raw
        .into_record(key, dataset)
        .map_err(|error| AtomDbError::MalformedData {
            species: key.to_string(),
            dataset: dataset.to_string(),
            detail: error.to_string(),
        })?;
    tracing::debug!(
        species = %key,
        dataset = %dataset,
        profiles = record.profile_names().count(),
        "loaded species record"
    );
    Ok(record)
}

fn source_error(key: &SpeciesKey, dataset: Dataset, error: SourceError) -> AtomDbError {
    match error {
        SourceError::Io { path, source } => AtomDbError::Io {
            species: key.to_string(),
            dataset: dataset.to_string(),
            path,
            source,
        },
        parse @ SourceError::Parse { .. } => AtomDbError::MalformedData {
            species: key.to_string(),
            dataset: dataset.to_string(),
            detail: parse.to_string(),
        },
        SourceError::Encode { source, .. } => AtomDbError::Serialization {
            species: key.to_string(),
            source,
        },
        invalid @ SourceError::InvalidEntry { .. } => AtomDbError::MalformedData {
            species: key.to_string(),
            dataset: dataset.to_string(),
            detail: invalid.to_string(),
        },
    }
}

fn lock_cache(
    cache: &RecordCache,
) -> MutexGuard<'_, HashMap<(SpeciesKey, Dataset), Arc<SpeciesRecord>>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}
