use super::{
    CovalentRadiusSource, PropertySource, RadialProfile, SourcedProperty, SpeciesRecord,
    VdwRadiusSource,
};
use crate::common::elements::normalize_symbol;
use crate::domain::{SpeciesKey, SpinChannel};
use crate::numerics::{SplineBoundary, SplineError};
use crate::registry::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A database entry exactly as stored on disk.
///
/// Scalar header fields follow the compiled dataset layout; every radial
/// quantity is a column `<quantity>_<up|dn|tot|mag>` sampled on the shared
/// grid `rs`. Charge is `natom - nelec` and multiplicity is `nspin + 1`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSpeciesFields {
    pub dataset: Option<String>,
    pub elem: String,
    pub natom: u32,
    pub basis: Option<String>,
    pub nelec: u32,
    pub nspin: u32,
    pub nexc: u32,
    pub cov_radii: BTreeMap<String, Option<f64>>,
    pub vdw_radii: BTreeMap<String, Option<f64>>,
    pub mass: f64,
    pub energy: Option<f64>,
    pub mo_energies: Vec<f64>,
    pub mo_occs: Vec<f64>,
    pub ip: Option<f64>,
    pub mu: Option<f64>,
    pub eta: Option<f64>,
    pub rs: Option<Vec<f64>>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, Option<Vec<f64>>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordParseError {
    #[error("{0}")]
    InvalidKey(String),
    #[error("entry describes element '{found}', expected '{expected}'")]
    ElementMismatch { expected: String, found: String },
    #[error("entry belongs to dataset '{found}', expected '{expected}'")]
    DatasetMismatch { expected: String, found: String },
    #[error("header field '{field}' is {found}, expected {expected}")]
    HeaderMismatch {
        field: &'static str,
        expected: i64,
        found: i64,
    },
    #[error("header field '{field}' value {value} does not describe a species")]
    HeaderOutOfRange { field: &'static str, value: i64 },
    #[error("mass must be finite and positive, got {value}")]
    InvalidMass { value: f64 },
    #[error("field '{field}' contains a non-finite value")]
    NonFinite { field: String },
    #[error("unknown {property} source '{source_name}'")]
    UnknownPropertySource {
        property: &'static str,
        source_name: String,
    },
    #[error("orbital energies and occupations must not be empty")]
    EmptyOrbitals,
    #[error("orbital vectors are misaligned: {energies} energies, {occupations} occupations")]
    MisalignedOrbitals { energies: usize, occupations: usize },
    #[error("column '{column}' is not of the form <quantity>_<up|dn|tot|mag>")]
    UnknownColumn { column: String },
    #[error("column '{column}' has samples but the entry has no radial grid 'rs'")]
    MissingGrid { column: String },
    #[error("radial profile '{profile}' has no channels")]
    EmptyProfile { profile: String },
    #[error("radial profile '{profile}' stores the {spin} channel twice")]
    DuplicateChannel { profile: String, spin: SpinChannel },
    #[error("radial profile '{profile}' ({spin}): {source}")]
    Profile {
        profile: String,
        spin: SpinChannel,
        source: SplineError,
    },
    #[error("radial profile '{profile}' does not share the grid of the other profiles")]
    NonSharedGrid { profile: String },
    #[error("radial profile '{profile}' has a non-natural boundary the raw layout cannot store")]
    UnsupportedBoundary { profile: String },
}

impl RawSpeciesFields {
    /// Key described by the header fields.
    pub fn species_key(&self) -> Result<SpeciesKey, RecordParseError> {
        let charge = i64::from(self.natom) - i64::from(self.nelec);
        let charge = i32::try_from(charge).map_err(|_| RecordParseError::HeaderOutOfRange {
            field: "nelec",
            value: i64::from(self.nelec),
        })?;
        let multiplicity =
            self.nspin
                .checked_add(1)
                .ok_or(RecordParseError::HeaderOutOfRange {
                    field: "nspin",
                    value: i64::from(self.nspin),
                })?;
        Ok(SpeciesKey::new(&self.elem, charge, multiplicity).with_excitation(self.nexc))
    }

    /// Checks the header against `key`/`dataset` and builds the record.
    pub fn into_record(
        self,
        key: &SpeciesKey,
        dataset: Dataset,
    ) -> Result<SpeciesRecord, RecordParseError> {
        let element = normalize_symbol(&self.elem);
        if element != key.element() {
            return Err(RecordParseError::ElementMismatch {
                expected: key.element().to_string(),
                found: self.elem,
            });
        }

        if let Some(found) = &self.dataset {
            if !found.eq_ignore_ascii_case(dataset.as_str()) {
                return Err(RecordParseError::DatasetMismatch {
                    expected: dataset.to_string(),
                    found: found.clone(),
                });
            }
        }

        let described = self.species_key()?;
        let headers = [
            (
                "charge",
                i64::from(key.charge()),
                i64::from(described.charge()),
            ),
            (
                "multiplicity",
                i64::from(key.multiplicity()),
                i64::from(described.multiplicity()),
            ),
            (
                "nexc",
                i64::from(key.excitation_index()),
                i64::from(described.excitation_index()),
            ),
        ];
        for (field, expected, found) in headers {
            if expected != found {
                return Err(RecordParseError::HeaderMismatch {
                    field,
                    expected,
                    found,
                });
            }
        }

        let cov_radii = parse_sources::<CovalentRadiusSource>("cov_radii", self.cov_radii)?;
        let vdw_radii = parse_sources::<VdwRadiusSource>("vdw_radii", self.vdw_radii)?;
        let profiles = parse_columns(self.rs.as_deref(), self.columns)?;

        let record = SpeciesRecord {
            dataset,
            key: key.clone(),
            atomic_number: self.natom,
            basis: self.basis,
            mass: self.mass,
            energy: self.energy,
            ionization_potential: self.ip,
            chemical_potential: self.mu,
            chemical_hardness: self.eta,
            cov_radii,
            vdw_radii,
            mo_energies: self.mo_energies,
            mo_occs: self.mo_occs,
            profiles,
        };
        record.validate()?;
        Ok(record)
    }

    /// Flattens a record back into the on-disk layout.
    ///
    /// All profiles must share one grid and use natural boundaries.
    pub fn from_record(record: &SpeciesRecord) -> Result<Self, RecordParseError> {
        let mut rs: Option<Vec<f64>> = None;
        let mut columns = BTreeMap::new();

        for (name, channels) in &record.profiles {
            for profile in channels {
                if profile.boundary() != SplineBoundary::Natural {
                    return Err(RecordParseError::UnsupportedBoundary {
                        profile: name.clone(),
                    });
                }
                match &rs {
                    Some(grid) if grid.as_slice() != profile.grid() => {
                        return Err(RecordParseError::NonSharedGrid {
                            profile: name.clone(),
                        });
                    }
                    Some(_) => {}
                    None => rs = Some(profile.grid().to_vec()),
                }
                columns.insert(
                    format!("{name}_{}", profile.spin_channel().column_suffix()),
                    Some(profile.values().to_vec()),
                );
            }
        }

        Ok(Self {
            dataset: Some(record.dataset.to_string()),
            elem: record.elem().to_string(),
            natom: record.atomic_number,
            basis: record.basis.clone(),
            nelec: record.electron_count(),
            nspin: record.multiplicity() - 1,
            nexc: record.key.excitation_index(),
            cov_radii: source_map(&record.cov_radii),
            vdw_radii: source_map(&record.vdw_radii),
            mass: record.mass,
            energy: record.energy,
            mo_energies: record.mo_energies.clone(),
            mo_occs: record.mo_occs.clone(),
            ip: record.ionization_potential,
            mu: record.chemical_potential,
            eta: record.chemical_hardness,
            rs,
            columns,
        })
    }
}

fn parse_sources<S: PropertySource>(
    property: &'static str,
    raw: BTreeMap<String, Option<f64>>,
) -> Result<SourcedProperty<S>, RecordParseError> {
    raw.into_iter()
        .map(|(name, value)| {
            name.parse::<S>()
                .map(|source| (source, value))
                .map_err(|_| RecordParseError::UnknownPropertySource {
                    property,
                    source_name: name,
                })
        })
        .collect()
}

fn source_map<S: PropertySource>(property: &SourcedProperty<S>) -> BTreeMap<String, Option<f64>> {
    property
        .iter()
        .map(|(source, value)| (source.as_str().to_string(), value))
        .collect()
}

fn parse_columns(
    grid: Option<&[f64]>,
    columns: BTreeMap<String, Option<Vec<f64>>>,
) -> Result<BTreeMap<String, Vec<RadialProfile>>, RecordParseError> {
    let mut profiles: BTreeMap<String, Vec<RadialProfile>> = BTreeMap::new();

    for (column, values) in columns {
        let Some((quantity, spin)) = split_column(&column) else {
            return Err(RecordParseError::UnknownColumn { column });
        };
        // Null columns are quantities the dataset did not compute.
        let Some(values) = values else {
            continue;
        };
        let Some(grid) = grid else {
            return Err(RecordParseError::MissingGrid { column });
        };

        let profile = RadialProfile::new(spin, grid.to_vec(), values).map_err(|source| {
            RecordParseError::Profile {
                profile: quantity.to_string(),
                spin,
                source,
            }
        })?;
        profiles.entry(quantity.to_string()).or_default().push(profile);
    }

    for channels in profiles.values_mut() {
        channels.sort_by_key(RadialProfile::spin_channel);
    }

    Ok(profiles)
}

fn split_column(column: &str) -> Option<(&str, SpinChannel)> {
    let (quantity, suffix) = column.rsplit_once('_')?;
    if quantity.is_empty() {
        return None;
    }
    SpinChannel::from_column_suffix(suffix).map(|spin| (quantity, spin))
}
