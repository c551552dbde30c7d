use crate::domain::SpinChannel;
use crate::numerics::{CubicSpline, InterpolationScale, SplineBoundary, SplineError, validate_knots};
use serde::{Deserialize, Serialize};

/// Density quantities compiled into the datasets.
pub const DENSITY: &str = "dens";
pub const DENSITY_GRADIENT: &str = "d_dens";
pub const LAPLACIAN: &str = "lapl";
pub const KINETIC_ENERGY_DENSITY: &str = "ked";

/// A radial function tabulated on a strictly increasing grid for one spin channel.
///
/// Every value of this type has passed [`RadialProfile::validate`], including
/// ones produced by deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RadialProfileFields")]
pub struct RadialProfile {
    spin_channel: SpinChannel,
    grid: Vec<f64>,
    values: Vec<f64>,
    #[serde(default)]
    boundary: SplineBoundary,
}

#[derive(Deserialize)]
struct RadialProfileFields {
    spin_channel: SpinChannel,
    grid: Vec<f64>,
    values: Vec<f64>,
    #[serde(default)]
    boundary: SplineBoundary,
}

impl TryFrom<RadialProfileFields> for RadialProfile {
    type Error = SplineError;

    fn try_from(fields: RadialProfileFields) -> Result<Self, Self::Error> {
        let profile = Self {
            spin_channel: fields.spin_channel,
            grid: fields.grid,
            values: fields.values,
            boundary: fields.boundary,
        };
        profile.validate()?;
        Ok(profile)
    }
}

impl RadialProfile {
    pub fn new(
        spin_channel: SpinChannel,
        grid: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, SplineError> {
        validate_knots(&grid, &values)?;
        Ok(Self {
            spin_channel,
            grid,
            values,
            boundary: SplineBoundary::Natural,
        })
    }

    pub fn with_boundary(mut self, boundary: SplineBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub const fn spin_channel(&self) -> SpinChannel {
        self.spin_channel
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub const fn boundary(&self) -> SplineBoundary {
        self.boundary
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.grid[0], self.grid[self.grid.len() - 1])
    }

    pub fn validate(&self) -> Result<(), SplineError> {
        validate_knots(&self.grid, &self.values)?;
        if let SplineBoundary::Clamped {
            start_slope,
            end_slope,
        } = self.boundary
        {
            if !start_slope.is_finite() || !end_slope.is_finite() {
                return Err(SplineError::NonFiniteBoundarySlope {
                    start: start_slope,
                    end: end_slope,
                });
            }
        }
        Ok(())
    }

    pub fn spline(&self, scale: InterpolationScale) -> Result<CubicSpline, SplineError> {
        CubicSpline::new(&self.grid, &self.values, self.boundary, scale)
    }
}
