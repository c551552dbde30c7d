pub mod errors;

pub use errors::{AtomDbError, AtomDbResult, ErrorCategory};

use crate::common::elements::{atomic_number_for_symbol, normalize_symbol};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Canonical lookup key for an atomic or ionic species.
///
/// The element symbol is normalized on construction and on deserialization;
/// charge/multiplicity consistency is only checked by
/// [`SpeciesKey::validate`], which the loader runs before touching any dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "SpeciesKeyFields")]
pub struct SpeciesKey {
    element: String,
    charge: i32,
    multiplicity: u32,
    #[serde(default)]
    excitation_index: u32,
}

#[derive(Deserialize)]
struct SpeciesKeyFields {
    element: String,
    charge: i32,
    multiplicity: u32,
    #[serde(default)]
    excitation_index: u32,
}

impl From<SpeciesKeyFields> for SpeciesKey {
    fn from(fields: SpeciesKeyFields) -> Self {
        SpeciesKey::new(fields.element, fields.charge, fields.multiplicity)
            .with_excitation(fields.excitation_index)
    }
}

impl SpeciesKey {
    pub fn new(element: impl AsRef<str>, charge: i32, multiplicity: u32) -> Self {
        Self {
            element: normalize_symbol(element.as_ref()),
            charge,
            multiplicity,
            excitation_index: 0,
        }
    }

    pub fn with_excitation(mut self, excitation_index: u32) -> Self {
        self.excitation_index = excitation_index;
        self
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub const fn charge(&self) -> i32 {
        self.charge
    }

    pub const fn multiplicity(&self) -> u32 {
        self.multiplicity
    }

    pub const fn excitation_index(&self) -> u32 {
        self.excitation_index
    }

    pub const fn is_ground_state(&self) -> bool {
        self.excitation_index == 0
    }

    /// Database file stem, `<elem>_<charge>_<mult>_<nexc>`.
    pub fn file_stem(&self) -> String {
        self.to_string()
    }

    /// Checks the key against the periodic table and spin parity.
    ///
    /// Returns the atomic number on success.
    pub fn validate(&self) -> AtomDbResult<u32> {
        let atomic_number = atomic_number_for_symbol(&self.element).ok_or_else(|| {
            self.invalid(format!("unrecognized element symbol '{}'", self.element))
        })?;

        let electron_count = i64::from(atomic_number) - i64::from(self.charge);
        if electron_count < 0 {
            return Err(self.invalid(format!(
                "charge {} exceeds nuclear charge {}",
                self.charge, atomic_number
            )));
        }

        if self.multiplicity == 0 {
            return Err(self.invalid("multiplicity must be positive"));
        }

        let unpaired = i64::from(self.multiplicity) - 1;
        if unpaired > electron_count {
            return Err(self.invalid(format!(
                "multiplicity {} needs {} unpaired electrons but only {} are present",
                self.multiplicity, unpaired, electron_count
            )));
        }

        if (electron_count - unpaired) % 2 != 0 {
            return Err(self.invalid(format!(
                "multiplicity {} is inconsistent with {} electrons",
                self.multiplicity, electron_count
            )));
        }

        Ok(atomic_number)
    }

    /// Electron count implied by the key, if the element is known.
    pub fn electron_count(&self) -> Option<i64> {
        atomic_number_for_symbol(&self.element)
            .map(|atomic_number| i64::from(atomic_number) - i64::from(self.charge))
    }

    fn invalid(&self, reason: impl Into<String>) -> AtomDbError {
        AtomDbError::InvalidSpecies {
            species: self.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for SpeciesKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.element, self.charge, self.multiplicity, self.excitation_index
        )
    }
}

/// Spin partition of an orbital-derived quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinChannel {
    Alpha,
    Beta,
    Combined,
    Magnetization,
}

impl SpinChannel {
    pub const ALL: [Self; 4] = [Self::Alpha, Self::Beta, Self::Combined, Self::Magnetization];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Combined => "combined",
            Self::Magnetization => "magnetization",
        }
    }

    /// Column suffix used by raw dataset entries (`dens_up`, `dens_tot`, ...).
    pub const fn column_suffix(self) -> &'static str {
        match self {
            Self::Alpha => "up",
            Self::Beta => "dn",
            Self::Combined => "tot",
            Self::Magnetization => "mag",
        }
    }

    pub fn from_column_suffix(suffix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.column_suffix() == suffix)
    }
}

impl Display for SpinChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for SpinChannel {
    type Err = String;

    /// Accepts both the long names and the short `a`/`b`/`ab`/`m` notation.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "a" | "alpha" | "up" => Ok(Self::Alpha),
            "b" | "beta" | "dn" | "down" => Ok(Self::Beta),
            "ab" | "combined" | "tot" | "total" => Ok(Self::Combined),
            "m" | "mag" | "magnetization" => Ok(Self::Magnetization),
            other => Err(format!("unknown spin channel '{other}'")),
        }
    }
}
