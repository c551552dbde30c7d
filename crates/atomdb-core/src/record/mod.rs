//! Immutable species records and their JSON form.

mod profile;
mod properties;
mod raw;

pub use profile::{
    DENSITY, DENSITY_GRADIENT, KINETIC_ENERGY_DENSITY, LAPLACIAN, RadialProfile,
};
pub use properties::{CovalentRadiusSource, PropertySource, SourcedProperty, VdwRadiusSource};
pub use raw::{RawSpeciesFields, RecordParseError};

use crate::domain::{AtomDbError, AtomDbResult, SpeciesKey, SpinChannel};
use crate::registry::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Properties of one atomic or ionic species in one dataset.
///
/// Built by the loader, [`SpeciesRecord::from_json`] or plain serde
/// deserialization, and never mutated afterwards. All three paths run
/// [`SpeciesRecord::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpeciesRecordFields")]
pub struct SpeciesRecord {
    dataset: Dataset,
    key: SpeciesKey,
    atomic_number: u32,
    basis: Option<String>,
    mass: f64,
    energy: Option<f64>,
    ionization_potential: Option<f64>,
    chemical_potential: Option<f64>,
    chemical_hardness: Option<f64>,
    cov_radii: SourcedProperty<CovalentRadiusSource>,
    vdw_radii: SourcedProperty<VdwRadiusSource>,
    mo_energies: Vec<f64>,
    mo_occs: Vec<f64>,
    profiles: BTreeMap<String, Vec<RadialProfile>>,
}

#[derive(Deserialize)]
struct SpeciesRecordFields {
    dataset: Dataset,
    key: SpeciesKey,
    atomic_number: u32,
    basis: Option<String>,
    mass: f64,
    energy: Option<f64>,
    ionization_potential: Option<f64>,
    chemical_potential: Option<f64>,
    chemical_hardness: Option<f64>,
    cov_radii: SourcedProperty<CovalentRadiusSource>,
    vdw_radii: SourcedProperty<VdwRadiusSource>,
    mo_energies: Vec<f64>,
    mo_occs: Vec<f64>,
    profiles: BTreeMap<String, Vec<RadialProfile>>,
}

impl SpeciesRecordFields {
    fn into_unchecked(self) -> SpeciesRecord {
        SpeciesRecord {
            dataset: self.dataset,
            key: self.key,
            atomic_number: self.atomic_number,
            basis: self.basis,
            mass: self.mass,
            energy: self.energy,
            ionization_potential: self.ionization_potential,
            chemical_potential: self.chemical_potential,
            chemical_hardness: self.chemical_hardness,
            cov_radii: self.cov_radii,
            vdw_radii: self.vdw_radii,
            mo_energies: self.mo_energies,
            mo_occs: self.mo_occs,
            profiles: self.profiles,
        }
    }
}

impl TryFrom<SpeciesRecordFields> for SpeciesRecord {
    type Error = RecordParseError;

    fn try_from(fields: SpeciesRecordFields) -> Result<Self, Self::Error> {
        let record = fields.into_unchecked();
        record.validate()?;
        Ok(record)
    }
}

impl SpeciesRecord {
    pub const fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn key(&self) -> &SpeciesKey {
        &self.key
    }

    pub fn elem(&self) -> &str {
        self.key.element()
    }

    pub const fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    pub const fn charge(&self) -> i32 {
        self.key.charge()
    }

    pub const fn multiplicity(&self) -> u32 {
        self.key.multiplicity()
    }

    pub fn electron_count(&self) -> u32 {
        (i64::from(self.atomic_number) - i64::from(self.key.charge())) as u32
    }

    pub fn basis(&self) -> Option<&str> {
        self.basis.as_deref()
    }

    /// Atomic mass in atomic units (electron masses).
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    pub const fn energy(&self) -> Option<f64> {
        self.energy
    }

    pub const fn ionization_potential(&self) -> Option<f64> {
        self.ionization_potential
    }

    pub const fn chemical_potential(&self) -> Option<f64> {
        self.chemical_potential
    }

    pub const fn chemical_hardness(&self) -> Option<f64> {
        self.chemical_hardness
    }

    pub fn cov_radii(&self) -> &SourcedProperty<CovalentRadiusSource> {
        &self.cov_radii
    }

    pub fn vdw_radii(&self) -> &SourcedProperty<VdwRadiusSource> {
        &self.vdw_radii
    }

    pub fn cov_radius(&self, source: CovalentRadiusSource) -> AtomDbResult<f64> {
        self.cov_radii
            .get(source)
            .ok_or_else(|| self.missing_source("cov_radii", source.as_str()))
    }

    pub fn vdw_radius(&self, source: VdwRadiusSource) -> AtomDbResult<f64> {
        self.vdw_radii
            .get(source)
            .ok_or_else(|| self.missing_source("vdw_radii", source.as_str()))
    }

    pub fn mo_energies(&self) -> &[f64] {
        &self.mo_energies
    }

    pub fn mo_occs(&self) -> &[f64] {
        &self.mo_occs
    }

    /// `(energy, occupation)` pairs in orbital order.
    pub fn orbitals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mo_energies
            .iter()
            .copied()
            .zip(self.mo_occs.iter().copied())
    }

    pub fn occupied_orbital_count(&self) -> usize {
        self.mo_occs.iter().filter(|occupation| **occupation > 0.0).count()
    }

    pub fn total_occupation(&self) -> f64 {
        self.mo_occs.iter().sum()
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.profiles.keys().map(String::as_str)
    }

    /// Every stored spin channel of `name`.
    pub fn profile(&self, name: &str) -> Option<&[RadialProfile]> {
        self.profiles.get(name).map(Vec::as_slice)
    }

    pub fn profile_channel(&self, name: &str, spin: SpinChannel) -> Option<&RadialProfile> {
        self.profile(name)?
            .iter()
            .find(|profile| profile.spin_channel() == spin)
    }

    pub fn to_json(&self) -> AtomDbResult<String> {
        serde_json::to_string(self).map_err(|source| self.serialization(source))
    }

    pub fn to_json_pretty(&self) -> AtomDbResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| self.serialization(source))
    }

    /// Parses and re-validates a record produced by [`SpeciesRecord::to_json`].
    pub fn from_json(json: &str) -> AtomDbResult<Self> {
        let fields: SpeciesRecordFields =
            serde_json::from_str(json).map_err(|source| AtomDbError::MalformedData {
                species: "<unparsed>".to_string(),
                dataset: "<json>".to_string(),
                detail: source.to_string(),
            })?;
        // Parsed unchecked so record-level failures still name the species.
        let record = fields.into_unchecked();
        record.validate().map_err(|error| record.malformed(error))?;
        Ok(record)
    }

    /// Checks every record invariant.
    pub fn validate(&self) -> Result<(), RecordParseError> {
        let atomic_number = self
            .key
            .validate()
            .map_err(|error| RecordParseError::InvalidKey(error.to_string()))?;
        if atomic_number != self.atomic_number {
            return Err(RecordParseError::HeaderMismatch {
                field: "natom",
                expected: i64::from(atomic_number),
                found: i64::from(self.atomic_number),
            });
        }

        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(RecordParseError::InvalidMass { value: self.mass });
        }

        let scalars = [
            ("energy", self.energy),
            ("ip", self.ionization_potential),
            ("mu", self.chemical_potential),
            ("eta", self.chemical_hardness),
        ];
        for (field, value) in scalars {
            if value.is_some_and(|value| !value.is_finite()) {
                return Err(RecordParseError::NonFinite {
                    field: field.to_string(),
                });
            }
        }
        if let Some(source) = self.cov_radii.non_finite_source() {
            return Err(RecordParseError::NonFinite {
                field: format!("cov_radii.{source}"),
            });
        }
        if let Some(source) = self.vdw_radii.non_finite_source() {
            return Err(RecordParseError::NonFinite {
                field: format!("vdw_radii.{source}"),
            });
        }

        if self.mo_energies.is_empty() || self.mo_occs.is_empty() {
            return Err(RecordParseError::EmptyOrbitals);
        }
        if self.mo_energies.len() != self.mo_occs.len() {
            return Err(RecordParseError::MisalignedOrbitals {
                energies: self.mo_energies.len(),
                occupations: self.mo_occs.len(),
            });
        }
        for (field, values) in [("mo_energies", &self.mo_energies), ("mo_occs", &self.mo_occs)] {
            if values.iter().any(|value| !value.is_finite()) {
                return Err(RecordParseError::NonFinite {
                    field: field.to_string(),
                });
            }
        }

        for (name, channels) in &self.profiles {
            if channels.is_empty() {
                return Err(RecordParseError::EmptyProfile {
                    profile: name.clone(),
                });
            }
            for (index, profile) in channels.iter().enumerate() {
                profile
                    .validate()
                    .map_err(|source| RecordParseError::Profile {
                        profile: name.clone(),
                        spin: profile.spin_channel(),
                        source,
                    })?;
                if channels[..index]
                    .iter()
                    .any(|earlier| earlier.spin_channel() == profile.spin_channel())
                {
                    return Err(RecordParseError::DuplicateChannel {
                        profile: name.clone(),
                        spin: profile.spin_channel(),
                    });
                }
            }
        }

        Ok(())
    }

    pub(crate) fn malformed(&self, error: RecordParseError) -> AtomDbError {
        AtomDbError::MalformedData {
            species: self.key.to_string(),
            dataset: self.dataset.to_string(),
            detail: error.to_string(),
        }
    }

    fn missing_source(&self, property: &'static str, source: &str) -> AtomDbError {
        AtomDbError::PropertySourceNotFound {
            species: self.key.to_string(),
            property,
            source_name: source.to_string(),
        }
    }

    fn serialization(&self, source: serde_json::Error) -> AtomDbError {
        AtomDbError::Serialization {
            species: self.key.to_string(),
            source,
        }
    }
}
