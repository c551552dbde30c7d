use crate::domain::SpinChannel;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type AtomDbResult<T> = Result<T, AtomDbError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller asked for something the key, registry or record cannot satisfy.
    InputValidation,
    /// Backing data is missing, unreadable or does not match the schema.
    DataAccess,
    /// Evaluation of a stored quantity failed.
    Computation,
}

impl ErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "InputValidationError",
            Self::DataAccess => "DataAccessError",
            Self::Computation => "ComputationError",
        }
    }
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AtomDbError {
    #[error("invalid species '{species}': {reason}")]
    InvalidSpecies { species: String, reason: String },
    #[error("unknown dataset '{dataset}'")]
    UnknownDataset { dataset: String },
    #[error("species '{species}' not found in dataset '{dataset}'")]
    SpeciesNotFound { species: String, dataset: String },
    #[error(
        "species '{species}' requests excitation index {excitation_index}, \
         but dataset '{dataset}' only provides ground states"
    )]
    UnsupportedState {
        species: String,
        dataset: String,
        excitation_index: u32,
    },
    #[error("malformed data for species '{species}' in dataset '{dataset}': {detail}")]
    MalformedData {
        species: String,
        dataset: String,
        detail: String,
    },
    #[error("property '{property}' of species '{species}' has no value for source '{source_name}'")]
    PropertySourceNotFound {
        species: String,
        property: &'static str,
        source_name: String,
    },
    #[error("species '{species}' has no radial profile '{profile}'")]
    ProfileNotFound { species: String, profile: String },
    #[error("radial profile '{profile}' of species '{species}' has no {spin} spin channel")]
    SpinChannelUnavailable {
        species: String,
        profile: String,
        spin: SpinChannel,
    },
    #[error(
        "sample point {point} is outside the grid [{min}, {max}] of radial profile \
         '{profile}' for species '{species}'"
    )]
    OutOfRange {
        species: String,
        profile: String,
        point: f64,
        min: f64,
        max: f64,
    },
    #[error(
        "radial profile '{profile}' ({spin}) of species '{species}' cannot be interpolated \
         on a log scale: sample {index} is {value}"
    )]
    LogScaleUnsupported {
        species: String,
        profile: String,
        spin: SpinChannel,
        index: usize,
        value: f64,
    },
    #[error("failed to read '{}' for species '{species}' in dataset '{dataset}': {source}", path.display())]
    Io {
        species: String,
        dataset: String,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize species '{species}': {source}")]
    Serialization {
        species: String,
        source: serde_json::Error,
    },
}

impl AtomDbError {
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidSpecies { .. }
            | Self::UnknownDataset { .. }
            | Self::UnsupportedState { .. }
            | Self::PropertySourceNotFound { .. }
            | Self::ProfileNotFound { .. }
            | Self::SpinChannelUnavailable { .. }
            | Self::OutOfRange { .. } => ErrorCategory::InputValidation,
            Self::SpeciesNotFound { .. }
            | Self::MalformedData { .. }
            | Self::Io { .. }
            | Self::Serialization { .. } => ErrorCategory::DataAccess,
            Self::LogScaleUnsupported { .. } => ErrorCategory::Computation,
        }
    }

    /// Stable dotted identifier for the failure kind.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidSpecies { .. } => "INPUT.INVALID_SPECIES",
            Self::UnknownDataset { .. } => "INPUT.UNKNOWN_DATASET",
            Self::UnsupportedState { .. } => "INPUT.UNSUPPORTED_STATE",
            Self::PropertySourceNotFound { .. } => "INPUT.PROPERTY_SOURCE",
            Self::ProfileNotFound { .. } => "INPUT.PROFILE",
            Self::SpinChannelUnavailable { .. } => "INPUT.SPIN_CHANNEL",
            Self::OutOfRange { .. } => "INPUT.OUT_OF_RANGE",
            Self::SpeciesNotFound { .. } => "DATA.SPECIES_NOT_FOUND",
            Self::MalformedData { .. } => "DATA.MALFORMED",
            Self::Io { .. } => "DATA.IO",
            Self::Serialization { .. } => "DATA.SERIALIZATION",
            Self::LogScaleUnsupported { .. } => "RUN.LOG_SCALE",
        }
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code(), self)
    }
}
