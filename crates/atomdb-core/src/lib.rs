//! AtomDB: a database of atomic and ionic properties.
//!
//! Species records are loaded from named datasets through an explicitly
//! constructed [`registry::DatasetRegistry`], read through typed accessors and
//! evaluated on arbitrary radial samples with [`evaluator::RadialProfileEvaluator`].

pub mod common;
pub mod domain;
pub mod evaluator;
pub mod loader;
pub mod numerics;
pub mod record;
pub mod registry;

pub use common::config::{AtomDbConfig, ConfigError, load_config};
pub use domain::{AtomDbError, AtomDbResult, ErrorCategory, SpeciesKey, SpinChannel};
pub use evaluator::{EvaluatorConfig, RadialProfileEvaluator, SpinCombination};
pub use loader::RecordLoader;
pub use numerics::spline::{ExtrapolationMode, InterpolationScale, SplineBoundary};
pub use record::{
    CovalentRadiusSource, RadialProfile, SourcedProperty, SpeciesRecord, VdwRadiusSource,
};
pub use registry::{DataSource, Dataset, DatasetRegistry, DirectorySource, MemorySource};
