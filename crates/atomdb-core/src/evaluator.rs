//! Spline evaluation of the radial profiles stored in a record.

use crate::domain::{AtomDbError, AtomDbResult, SpinChannel};
use crate::numerics::{CubicSpline, ExtrapolationMode, InterpolationScale, SplineError};
use crate::record::{
    DENSITY, DENSITY_GRADIENT, KINETIC_ENERGY_DENSITY, LAPLACIAN, RadialProfile, SpeciesRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// How a combined channel is derived when only alpha and beta are stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum SpinCombination {
    /// `alpha + beta`.
    #[default]
    Sum,
    /// `alpha_weight * alpha + beta_weight * beta`.
    Weighted { alpha: f64, beta: f64 },
}

impl SpinCombination {
    pub fn combine(self, alpha: f64, beta: f64) -> f64 {
        match self {
            Self::Sum => alpha + beta,
            Self::Weighted {
                alpha: alpha_weight,
                beta: beta_weight,
            } => alpha_weight * alpha + beta_weight * beta,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub extrapolation: ExtrapolationMode,
    /// Scale for every profile except the kinetic energy density.
    pub scale: InterpolationScale,
    /// Kinetic energy density spans many decades, so it defaults to log.
    pub kinetic_energy_scale: InterpolationScale,
    pub combination: SpinCombination,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            extrapolation: ExtrapolationMode::default(),
            scale: InterpolationScale::Linear,
            kinetic_energy_scale: InterpolationScale::Log,
            combination: SpinCombination::default(),
        }
    }
}

impl EvaluatorConfig {
    pub fn with_extrapolation(mut self, extrapolation: ExtrapolationMode) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    pub fn with_scale(mut self, scale: InterpolationScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_kinetic_energy_scale(mut self, scale: InterpolationScale) -> Self {
        self.kinetic_energy_scale = scale;
        self
    }

    pub fn with_combination(mut self, combination: SpinCombination) -> Self {
        self.combination = combination;
        self
    }

    pub fn scale_for(&self, profile_name: &str) -> InterpolationScale {
        if profile_name == KINETIC_ENERGY_DENSITY {
            self.kinetic_energy_scale
        } else {
            self.scale
        }
    }
}

/// Evaluates the radial profiles of one record on arbitrary radii.
///
/// A spline is built the first time a `(profile, stored channel)` pair is
/// needed and reused afterwards. Combined and magnetization channels that are
/// not stored are derived point-wise from alpha and beta.
#[derive(Debug)]
pub struct RadialProfileEvaluator<'r> {
    record: &'r SpeciesRecord,
    config: EvaluatorConfig,
    splines: Mutex<HashMap<(String, SpinChannel), Arc<CubicSpline>>>,
}

impl<'r> RadialProfileEvaluator<'r> {
    pub fn new(record: &'r SpeciesRecord, config: EvaluatorConfig) -> Self {
        Self {
            record,
            config,
            splines: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self) -> &'r SpeciesRecord {
        self.record
    }

    pub const fn config(&self) -> EvaluatorConfig {
        self.config
    }

    pub fn cached_splines(&self) -> usize {
        self.splines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn evaluate(
        &self,
        profile_name: &str,
        sample_points: &[f64],
        spin: SpinChannel,
    ) -> AtomDbResult<Vec<f64>> {
        let channels =
            self.record
                .profile(profile_name)
                .ok_or_else(|| AtomDbError::ProfileNotFound {
                    species: self.record.key().to_string(),
                    profile: profile_name.to_string(),
                })?;

        if let Some(profile) = find_channel(channels, spin) {
            return self.sample(profile_name, profile, sample_points);
        }

        if matches!(spin, SpinChannel::Alpha | SpinChannel::Beta) {
            return Err(self.unavailable(profile_name, spin));
        }
        let (Some(alpha), Some(beta)) = (
            find_channel(channels, SpinChannel::Alpha),
            find_channel(channels, SpinChannel::Beta),
        ) else {
            return Err(self.unavailable(profile_name, spin));
        };

        let alpha = self.sample(profile_name, alpha, sample_points)?;
        let beta = self.sample(profile_name, beta, sample_points)?;
        let combination = self.config.combination;
        Ok(alpha
            .into_iter()
            .zip(beta)
            .map(|(alpha, beta)| match spin {
                SpinChannel::Magnetization => alpha - beta,
                _ => combination.combine(alpha, beta),
            })
            .collect())
    }

    pub fn density(&self, sample_points: &[f64], spin: SpinChannel) -> AtomDbResult<Vec<f64>> {
        self.evaluate(DENSITY, sample_points, spin)
    }

    pub fn density_gradient(
        &self,
        sample_points: &[f64],
        spin: SpinChannel,
    ) -> AtomDbResult<Vec<f64>> {
        self.evaluate(DENSITY_GRADIENT, sample_points, spin)
    }

    pub fn laplacian(&self, sample_points: &[f64], spin: SpinChannel) -> AtomDbResult<Vec<f64>> {
        self.evaluate(LAPLACIAN, sample_points, spin)
    }

    pub fn kinetic_energy_density(
        &self,
        sample_points: &[f64],
        spin: SpinChannel,
    ) -> AtomDbResult<Vec<f64>> {
        self.evaluate(KINETIC_ENERGY_DENSITY, sample_points, spin)
    }

    fn sample(
        &self,
        profile_name: &str,
        profile: &RadialProfile,
        sample_points: &[f64],
    ) -> AtomDbResult<Vec<f64>> {
        let spline = self.spline(profile_name, profile)?;
        spline
            .evaluate_many(sample_points, self.config.extrapolation)
            .map_err(|error| self.spline_error(profile_name, profile, error))
    }

    fn spline(
        &self,
        profile_name: &str,
        profile: &RadialProfile,
    ) -> AtomDbResult<Arc<CubicSpline>> {
        let key = (profile_name.to_string(), profile.spin_channel());
        let mut splines = self.splines.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(spline) = splines.get(&key) {
            return Ok(Arc::clone(spline));
        }

        let spline = profile
            .spline(self.config.scale_for(profile_name))
            .map_err(|error| self.spline_error(profile_name, profile, error))?;
        tracing::trace!(
            species = %self.record.key(),
            profile = profile_name,
            spin = %profile.spin_channel(),
            knots = spline.knots().len(),
            "built radial spline"
        );
        let spline = Arc::new(spline);
        splines.insert(key, Arc::clone(&spline));
        Ok(spline)
    }

    fn spline_error(
        &self,
        profile_name: &str,
        profile: &RadialProfile,
        error: SplineError,
    ) -> AtomDbError {
        let species = self.record.key().to_string();
        let profile_name = profile_name.to_string();
        match error {
            SplineError::OutOfRange { point, min, max } => AtomDbError::OutOfRange {
                species,
                profile: profile_name,
                point,
                min,
                max,
            },
            SplineError::NonFiniteQuery { value } => {
                let (min, max) = profile.domain();
                AtomDbError::OutOfRange {
                    species,
                    profile: profile_name,
                    point: value,
                    min,
                    max,
                }
            }
            SplineError::NonPositiveLogValue { index, value } => {
                AtomDbError::LogScaleUnsupported {
                    species,
                    profile: profile_name,
                    spin: profile.spin_channel(),
                    index,
                    value,
                }
            }
            other => AtomDbError::MalformedData {
                species,
                dataset: self.record.dataset().to_string(),
                detail: format!("radial profile '{profile_name}': {other}"),
            },
        }
    }

    fn unavailable(&self, profile_name: &str, spin: SpinChannel) -> AtomDbError {
        AtomDbError::SpinChannelUnavailable {
            species: self.record.key().to_string(),
            profile: profile_name.to_string(),
            spin,
        }
    }
}

fn find_channel(channels: &[RadialProfile], spin: SpinChannel) -> Option<&RadialProfile> {
    channels
        .iter()
        .find(|profile| profile.spin_channel() == spin)
}

#[cfg(test)]
mod tests {
    use super::{EvaluatorConfig, RadialProfileEvaluator, SpinCombination};
    use crate::domain::{AtomDbError, SpeciesKey, SpinChannel};
    use crate::numerics::{ExtrapolationMode, InterpolationScale};
    use crate::record::{RawSpeciesFields, SpeciesRecord};
    use crate::registry::Dataset;
    use std::collections::BTreeMap;

    const GRID: [f64; 5] = [0.0, 0.5, 1.0, 2.0, 4.0];
    const ALPHA: [f64; 5] = [4.0, 2.0, 1.0, 0.25, 0.01];
    const BETA: [f64; 5] = [3.0, 1.0, 0.5, 0.125, 0.0];

    fn lithium() -> SpeciesRecord {
        RawSpeciesFields {
            elem: "Li".to_string(),
            natom: 3,
            nelec: 3,
            nspin: 1,
            mass: 12_652.67,
            mo_energies: vec![-2.477, -0.196, -2.447],
            mo_occs: vec![1.0, 1.0, 1.0],
            rs: Some(GRID.to_vec()),
            columns: BTreeMap::from([
                ("dens_up".to_string(), Some(ALPHA.to_vec())),
                ("dens_dn".to_string(), Some(BETA.to_vec())),
                ("lapl_tot".to_string(), Some(vec![-9.0, -1.0, 0.5, 0.1, 0.0])),
                ("ked_up".to_string(), Some(vec![8.0, 3.0, 1.0, 0.2, 0.01])),
            ]),
            ..RawSpeciesFields::default()
        }
        .into_record(&SpeciesKey::new("Li", 0, 2), Dataset::Slater)
        .expect("lithium should parse")
    }

    #[test]
    fn stored_channel_is_exact_at_knots() {
        let record = lithium();
        let evaluator = RadialProfileEvaluator::new(&record, EvaluatorConfig::default());
        assert_eq!(
            evaluator
                .density(&GRID, SpinChannel::Alpha)
                .expect("alpha is stored"),
            ALPHA.to_vec()
        );
    }

    #[test]
    fn combined_channel_sums_alpha_and_beta() {
        let record = lithium();
        let evaluator = RadialProfileEvaluator::new(&record, EvaluatorConfig::default());
        let points = [0.0, 0.25, 1.0, 3.0];

        let combined = evaluator
            .density(&points, SpinChannel::Combined)
            .expect("combined derives from alpha and beta");
        let alpha = evaluator.density(&points, SpinChannel::Alpha).expect("alpha");
        let beta = evaluator.density(&points, SpinChannel::Beta).expect("beta");
        for ((combined, alpha), beta) in combined.iter().zip(&alpha).zip(&beta) {
            assert!((combined - (alpha + beta)).abs() < 1.0e-12);
        }
        assert_eq!(combined[0], 7.0);
        assert_eq!(combined[2], 1.5);
    }

    #[test]
    fn weighted_combination_and_magnetization() {
        let record = lithium();
        let evaluator = RadialProfileEvaluator::new(
            &record,
            EvaluatorConfig::default().with_combination(SpinCombination::Weighted {
                alpha: 0.5,
                beta: 2.0,
            }),
        );
        assert_eq!(
            evaluator
                .density(&[0.0, 0.5], SpinChannel::Combined)
                .expect("weighted"),
            vec![8.0, 3.0]
        );
        assert_eq!(
            evaluator
                .density(&[0.0, 1.0], SpinChannel::Magnetization)
                .expect("magnetization"),
            vec![1.0, 0.5]
        );
    }

    #[test]
    fn missing_channels_and_profiles_are_reported() {
        let record = lithium();
        let evaluator = RadialProfileEvaluator::new(&record, EvaluatorConfig::default());

        let error = evaluator
            .laplacian(&[0.5], SpinChannel::Alpha)
            .expect_err("only the combined laplacian is stored");
        assert!(matches!(
            error,
            AtomDbError::SpinChannelUnavailable {
                spin: SpinChannel::Alpha,
                ..
            }
        ));
        assert_eq!(
            evaluator
                .laplacian(&[0.5], SpinChannel::Combined)
                .expect("stored combined"),
            vec![-1.0]
        );

        let error = evaluator
            .kinetic_energy_density(&[0.5], SpinChannel::Combined)
            .expect_err("beta ked is missing");
        assert!(matches!(
            error,
            AtomDbError::SpinChannelUnavailable {
                spin: SpinChannel::Combined,
                ..
            }
        ));

        let error = evaluator
            .density_gradient(&[0.5], SpinChannel::Combined)
            .expect_err("no gradient stored");
        assert!(matches!(
            error,
            AtomDbError::ProfileNotFound { ref profile, .. } if profile == "d_dens"
        ));
    }

    #[test]
    fn out_of_range_points_follow_extrapolation_mode() {
        let record = lithium();
        let strict = RadialProfileEvaluator::new(&record, EvaluatorConfig::default());
        let error = strict
            .density(&[1.0, 5.0], SpinChannel::Alpha)
            .expect_err("5.0 is beyond the grid");
        assert!(matches!(
            error,
            AtomDbError::OutOfRange { point, min, max, .. }
                if point == 5.0 && min == 0.0 && max == 4.0
        ));

        let clamped = RadialProfileEvaluator::new(
            &record,
            EvaluatorConfig::default().with_extrapolation(ExtrapolationMode::Clamp),
        );
        assert_eq!(
            clamped
                .density(&[-1.0, 5.0], SpinChannel::Alpha)
                .expect("clamped"),
            vec![4.0, 0.01]
        );
        let error = clamped
            .density(&[f64::NAN], SpinChannel::Alpha)
            .expect_err("NaN is never a valid radius");
        assert!(matches!(error, AtomDbError::OutOfRange { .. }));
    }

    #[test]
    fn log_scale_requires_positive_samples() {
        let record = lithium();
        let evaluator = RadialProfileEvaluator::new(
            &record,
            EvaluatorConfig::default().with_scale(InterpolationScale::Log),
        );
        assert_eq!(
            evaluator
                .density(&GRID, SpinChannel::Alpha)
                .expect("alpha is positive"),
            ALPHA.to_vec()
        );

        let error = evaluator
            .density(&[1.0], SpinChannel::Beta)
            .expect_err("beta ends at zero");
        assert!(matches!(
            error,
            AtomDbError::LogScaleUnsupported {
                spin: SpinChannel::Beta,
                index: 4,
                ..
            }
        ));
    }

    #[test]
    fn splines_are_built_once_per_stored_channel() {
        let record = lithium();
        let evaluator = RadialProfileEvaluator::new(&record, EvaluatorConfig::default());
        for _ in 0..3 {
            evaluator
                .density(&[0.75], SpinChannel::Combined)
                .expect("combined");
        }
        assert_eq!(evaluator.cached_splines(), 2);

        let first = evaluator.density(&[0.3, 1.7], SpinChannel::Alpha).expect("alpha");
        let second = evaluator.density(&[0.3, 1.7], SpinChannel::Alpha).expect("alpha");
        assert_eq!(first, second);
    }

    #[test]
    fn config_reads_from_json_with_defaults() {
        let config: EvaluatorConfig = serde_json::from_str(
            r#"{"extrapolation": "linear", "combination": {"rule": "weighted", "alpha": 1.0, "beta": -1.0}}"#,
        )
        .expect("config should parse");
        assert_eq!(config.extrapolation, ExtrapolationMode::Linear);
        assert_eq!(config.scale, InterpolationScale::Linear);
        assert_eq!(config.kinetic_energy_scale, InterpolationScale::Log);
        assert_eq!(config.combination.combine(3.0, 1.0), 2.0);

        let linear_ked: EvaluatorConfig =
            serde_json::from_str(r#"{"kinetic_energy_scale": "linear"}"#).expect("config");
        assert_eq!(linear_ked.scale_for("ked"), InterpolationScale::Linear);
        assert_eq!(linear_ked.scale_for("dens"), InterpolationScale::Linear);
    }

    #[test]
    fn kinetic_energy_density_interpolates_on_log_scale() {
        let record = lithium();
        let ked = [8.0_f64, 3.0, 1.0, 0.2, 0.01];

        let default = RadialProfileEvaluator::new(&record, EvaluatorConfig::default());
        let log = default
            .kinetic_energy_density(&[3.0], SpinChannel::Alpha)
            .expect("alpha ked is stored");
        assert_eq!(
            default
                .evaluate("ked", &[3.0], SpinChannel::Alpha)
                .expect("same quantity by name"),
            log
        );
        assert_eq!(
            default
                .kinetic_energy_density(&GRID, SpinChannel::Alpha)
                .expect("knots"),
            ked.to_vec()
        );

        let linear = RadialProfileEvaluator::new(
            &record,
            EvaluatorConfig::default().with_kinetic_energy_scale(InterpolationScale::Linear),
        )
        .kinetic_energy_density(&[3.0], SpinChannel::Alpha)
        .expect("alpha ked is stored");

        // Between 0.2 and 0.01 a log spline stays positive, strictly inside the samples.
        assert!(log[0] > 0.01 && log[0] < 0.2, "{log:?}");
        assert_ne!(log, linear);
    }
}
