use crate::domain::SpeciesKey;
use crate::record::{RawSpeciesFields, RecordParseError};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read access to the raw entries of one dataset.
pub trait DataSource: Send + Sync + Debug {
    /// Returns `Ok(None)` when the dataset holds no entry for `key`.
    fn read(&self, key: &SpeciesKey) -> Result<Option<RawSpeciesFields>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("entry for element '{elem}' cannot be stored: {reason}")]
    InvalidEntry { elem: String, reason: String },
}

/// JSON entries stored as `<root>/db/<elem>_<charge>_<mult>_<nexc>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &SpeciesKey) -> PathBuf {
        self.root
            .join("db")
            .join(format!("{}.json", key.file_stem()))
    }

    /// Writes `raw` under the key derived from its own header fields.
    ///
    /// The key must name a real species, so the file always lands in `<root>/db`.
    pub fn store(&self, raw: &RawSpeciesFields) -> Result<PathBuf, SourceError> {
        let invalid = |reason: String| SourceError::InvalidEntry {
            elem: raw.elem.clone(),
            reason,
        };
        let key = raw
            .species_key()
            .map_err(|error| invalid(error.to_string()))?;
        key.validate().map_err(|error| invalid(error.to_string()))?;

        let path = self.entry_path(&key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SourceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let encoded = serde_json::to_string_pretty(raw).map_err(|source| SourceError::Encode {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, encoded).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "stored species entry");
        Ok(path)
    }
}

impl DataSource for DirectorySource {
    fn read(&self, key: &SpeciesKey) -> Result<Option<RawSpeciesFields>, SourceError> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SourceError::Io { path, source }),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| SourceError::Parse { path, source })
    }
}

/// Entries held in memory, keyed by species.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<SpeciesKey, RawSpeciesFields>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `raw` under the key derived from its header fields.
    pub fn with_entry(mut self, raw: RawSpeciesFields) -> Result<Self, RecordParseError> {
        self.entries.insert(raw.species_key()?, raw);
        Ok(self)
    }

    /// Adds `raw` under an explicit key, regardless of its header fields.
    pub fn with_entry_at(mut self, key: SpeciesKey, raw: RawSpeciesFields) -> Self {
        self.entries.insert(key, raw);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DataSource for MemorySource {
    fn read(&self, key: &SpeciesKey) -> Result<Option<RawSpeciesFields>, SourceError> {
        Ok(self.entries.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSource, DirectorySource, MemorySource, SourceError};
    use crate::domain::SpeciesKey;
    use crate::record::RawSpeciesFields;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn helium() -> RawSpeciesFields {
        RawSpeciesFields {
            dataset: Some("numeric".to_string()),
            elem: "He".to_string(),
            natom: 2,
            nelec: 2,
            nspin: 0,
            mass: 7_294.3,
            mo_energies: vec![-0.918],
            mo_occs: vec![2.0],
            ..RawSpeciesFields::default()
        }
    }

    #[test]
    fn entry_path_follows_database_layout() {
        let source = DirectorySource::new("/data/slater");
        assert_eq!(
            source.entry_path(&SpeciesKey::new("c", 0, 3)),
            PathBuf::from("/data/slater/db/C_0_3_0.json")
        );
    }

    #[test]
    fn missing_entry_reads_as_none() {
        let temp = TempDir::new().expect("tempdir should be created");
        let source = DirectorySource::new(temp.path());
        let entry = source
            .read(&SpeciesKey::new("He", 0, 1))
            .expect("missing file is not an error");
        assert!(entry.is_none());
    }

    #[test]
    fn stored_entry_reads_back_identically() {
        let temp = TempDir::new().expect("tempdir should be created");
        let source = DirectorySource::new(temp.path().join("numeric"));
        let raw = helium();

        let path = source.store(&raw).expect("store should succeed");
        assert!(path.ends_with("numeric/db/He_0_1_0.json"));

        let read = source
            .read(&SpeciesKey::new("He", 0, 1))
            .expect("read should succeed")
            .expect("entry should exist");
        assert_eq!(read, raw);
    }

    #[test]
    fn invalid_json_reports_parse_error_with_path() {
        let temp = TempDir::new().expect("tempdir should be created");
        let source = DirectorySource::new(temp.path());
        let path = source.entry_path(&SpeciesKey::new("He", 0, 1));
        fs::create_dir_all(path.parent().expect("db dir")).expect("db dir should be created");
        fs::write(&path, "{\"elem\": 3").expect("entry should be written");

        let error = source
            .read(&SpeciesKey::new("He", 0, 1))
            .expect_err("truncated json should fail");
        assert!(matches!(error, SourceError::Parse { path: ref failed, .. } if *failed == path));
    }

    #[test]
    fn store_rejects_headers_that_do_not_name_a_species() {
        let temp = TempDir::new().expect("tempdir should be created");
        let source = DirectorySource::new(temp.path().join("numeric"));

        let escaping = RawSpeciesFields {
            elem: "../x".to_string(),
            ..helium()
        };
        let error = source.store(&escaping).expect_err("unknown element");
        assert!(matches!(error, SourceError::InvalidEntry { ref elem, .. } if elem == "../x"));
        assert!(!temp.path().join("numeric").exists());

        let overflowing = RawSpeciesFields {
            nspin: u32::MAX,
            ..helium()
        };
        assert!(matches!(
            source.store(&overflowing),
            Err(SourceError::InvalidEntry { .. })
        ));
    }

    #[test]
    fn memory_source_rejects_overflowing_header() {
        let raw = RawSpeciesFields {
            nspin: u32::MAX,
            ..helium()
        };
        assert!(MemorySource::new().with_entry(raw).is_err());
    }

    #[test]
    fn memory_source_keys_entries_by_header() {
        let source = MemorySource::new()
            .with_entry(helium())
            .expect("helium header is valid");
        assert_eq!(source.len(), 1);
        assert!(
            source
                .read(&SpeciesKey::new("He", 0, 1))
                .expect("memory reads never fail")
                .is_some()
        );
        assert!(
            source
                .read(&SpeciesKey::new("He", 1, 2))
                .expect("memory reads never fail")
                .is_none()
        );
    }
}
