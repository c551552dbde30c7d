use serde::{Deserialize, Serialize};

/// Boundary condition closing the cubic spline system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SplineBoundary {
    /// Zero second derivative at both ends.
    #[default]
    Natural,
    /// Prescribed first derivative at both ends, in the units of the samples.
    Clamped { start_slope: f64, end_slope: f64 },
}

/// What happens to sample points outside the knot range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationMode {
    /// Reject the point.
    #[default]
    Error,
    /// Return the value at the nearest boundary knot.
    Clamp,
    /// Follow the spline tangent at the nearest boundary knot.
    Linear,
}

/// Space in which the spline is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationScale {
    #[default]
    Linear,
    /// Interpolate `ln(y)` and exponentiate; requires strictly positive samples.
    Log,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    #[error("cubic spline requires at least 1 knot")]
    Empty,
    #[error("spline input length mismatch: grid={grid}, values={values}")]
    LengthMismatch { grid: usize, values: usize },
    #[error("grid entry must be finite at index {index}, got {value}")]
    NonFiniteKnot { index: usize, value: f64 },
    #[error("grid must be strictly increasing, index {index} has {current} after {previous}")]
    NonIncreasingGrid {
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("sample value must be finite at index {index}, got {value}")]
    NonFiniteValue { index: usize, value: f64 },
    #[error("log-scale interpolation needs positive samples, index {index} has {value}")]
    NonPositiveLogValue { index: usize, value: f64 },
    #[error("clamped boundary slopes must be finite, got start={start}, end={end}")]
    NonFiniteBoundarySlope { start: f64, end: f64 },
    #[error("spline query must be finite, got {value}")]
    NonFiniteQuery { value: f64 },
    #[error("spline query {point} is outside [{min}, {max}]")]
    OutOfRange { point: f64, min: f64, max: f64 },
}

/// Checks that `grid`/`values` can carry a spline: equal non-zero length,
/// finite entries and a strictly increasing grid.
pub fn validate_knots(grid: &[f64], values: &[f64]) -> Result<(), SplineError> {
    if grid.is_empty() {
        return Err(SplineError::Empty);
    }

    if grid.len() != values.len() {
        return Err(SplineError::LengthMismatch {
            grid: grid.len(),
            values: values.len(),
        });
    }

    for (index, value) in grid.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(SplineError::NonFiniteKnot { index, value });
        }
    }

    for (index, window) in grid.windows(2).enumerate() {
        if window[1] <= window[0] {
            return Err(SplineError::NonIncreasingGrid {
                index: index + 1,
                previous: window[0],
                current: window[1],
            });
        }
    }

    for (index, value) in values.iter().copied().enumerate() {
        if !value.is_finite() {
            return Err(SplineError::NonFiniteValue { index, value });
        }
    }

    Ok(())
}

/// Piecewise cubic interpolant over a strictly increasing grid.
///
/// On interval `i` the spline is `y_i + b_i dx + c_i dx^2 + d_i dx^3` with
/// `dx = x - x_i`, all in the interpolation space selected by the scale.
/// Queries that hit a knot exactly return the stored sample untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    knots: Vec<f64>,
    samples: Vec<f64>,
    transformed: Vec<f64>,
    linear: Vec<f64>,
    quadratic: Vec<f64>,
    cubic: Vec<f64>,
    scale: InterpolationScale,
}

impl CubicSpline {
    pub fn new(
        grid: &[f64],
        values: &[f64],
        boundary: SplineBoundary,
        scale: InterpolationScale,
    ) -> Result<Self, SplineError> {
        validate_knots(grid, values)?;

        let transformed = match scale {
            InterpolationScale::Linear => values.to_vec(),
            InterpolationScale::Log => {
                if let Some((index, value)) = values
                    .iter()
                    .copied()
                    .enumerate()
                    .find(|(_, value)| *value <= 0.0)
                {
                    return Err(SplineError::NonPositiveLogValue { index, value });
                }
                values.iter().map(|value| value.ln()).collect()
            }
        };

        let boundary = match (boundary, scale) {
            (SplineBoundary::Clamped { start_slope, end_slope }, _)
                if !start_slope.is_finite() || !end_slope.is_finite() =>
            {
                return Err(SplineError::NonFiniteBoundarySlope {
                    start: start_slope,
                    end: end_slope,
                });
            }
            // d ln(y) / dx = y' / y
            (SplineBoundary::Clamped { start_slope, end_slope }, InterpolationScale::Log) => {
                SplineBoundary::Clamped {
                    start_slope: start_slope / values[0],
                    end_slope: end_slope / values[values.len() - 1],
                }
            }
            (boundary, _) => boundary,
        };

        let second = second_derivatives(grid, &transformed, boundary);
        let interval_count = grid.len().saturating_sub(1);
        let mut linear = Vec::with_capacity(interval_count);
        let mut quadratic = Vec::with_capacity(interval_count);
        let mut cubic = Vec::with_capacity(interval_count);

        for index in 0..interval_count {
            let h = grid[index + 1] - grid[index];
            let secant = (transformed[index + 1] - transformed[index]) / h;
            linear.push(secant - h * (2.0 * second[index] + second[index + 1]) / 6.0);
            quadratic.push(second[index] / 2.0);
            cubic.push((second[index + 1] - second[index]) / (6.0 * h));
        }

        Ok(Self {
            knots: grid.to_vec(),
            samples: values.to_vec(),
            transformed,
            linear,
            quadratic,
            cubic,
            scale,
        })
    }

    pub fn natural(grid: &[f64], values: &[f64]) -> Result<Self, SplineError> {
        Self::new(
            grid,
            values,
            SplineBoundary::Natural,
            InterpolationScale::Linear,
        )
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub const fn scale(&self) -> InterpolationScale {
        self.scale
    }

    /// Closed interval covered by the knots.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    pub fn evaluate(&self, point: f64, extrapolation: ExtrapolationMode) -> Result<f64, SplineError> {
        if !point.is_finite() {
            return Err(SplineError::NonFiniteQuery { value: point });
        }

        let (min, max) = self.domain();
        let last = self.knots.len() - 1;

        if point < min || point > max {
            return match extrapolation {
                ExtrapolationMode::Error => Err(SplineError::OutOfRange { point, min, max }),
                ExtrapolationMode::Clamp if point < min => Ok(self.samples[0]),
                ExtrapolationMode::Clamp => Ok(self.samples[last]),
                ExtrapolationMode::Linear if point < min => Ok(self.untransform(
                    self.transformed[0] + self.start_slope() * (point - min),
                )),
                ExtrapolationMode::Linear => Ok(self.untransform(
                    self.transformed[last] + self.end_slope() * (point - max),
                )),
            };
        }

        match self
            .knots
            .binary_search_by(|probe| probe.total_cmp(&point))
        {
            Ok(index) => Ok(self.samples[index]),
            Err(upper) => {
                let lower = upper - 1;
                let dx = point - self.knots[lower];
                let value = self.transformed[lower]
                    + dx * (self.linear[lower]
                        + dx * (self.quadratic[lower] + dx * self.cubic[lower]));
                Ok(self.untransform(value))
            }
        }
    }

    pub fn evaluate_many(
        &self,
        points: &[f64],
        extrapolation: ExtrapolationMode,
    ) -> Result<Vec<f64>, SplineError> {
        points
            .iter()
            .map(|point| self.evaluate(*point, extrapolation))
            .collect()
    }

    fn start_slope(&self) -> f64 {
        self.linear.first().copied().unwrap_or(0.0)
    }

    fn end_slope(&self) -> f64 {
        let Some(last) = self.linear.len().checked_sub(1) else {
            return 0.0;
        };
        let h = self.knots[last + 1] - self.knots[last];
        self.linear[last] + h * (2.0 * self.quadratic[last] + 3.0 * h * self.cubic[last])
    }

    fn untransform(&self, value: f64) -> f64 {
        match self.scale {
            InterpolationScale::Linear => value,
            InterpolationScale::Log => value.exp(),
        }
    }
}

/// Solves the tridiagonal system for the knot second derivatives.
fn second_derivatives(grid: &[f64], values: &[f64], boundary: SplineBoundary) -> Vec<f64> {
    let n = grid.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let mut sub = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut sup = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    for index in 1..n - 1 {
        let h_prev = grid[index] - grid[index - 1];
        let h_next = grid[index + 1] - grid[index];
        sub[index] = h_prev;
        diag[index] = 2.0 * (h_prev + h_next);
        sup[index] = h_next;
        rhs[index] = 6.0
            * ((values[index + 1] - values[index]) / h_next
                - (values[index] - values[index - 1]) / h_prev);
    }

    match boundary {
        SplineBoundary::Natural => {
            diag[0] = 1.0;
            diag[n - 1] = 1.0;
        }
        SplineBoundary::Clamped {
            start_slope,
            end_slope,
        } => {
            let h_first = grid[1] - grid[0];
            diag[0] = 2.0 * h_first;
            sup[0] = h_first;
            rhs[0] = 6.0 * ((values[1] - values[0]) / h_first - start_slope);

            let h_last = grid[n - 1] - grid[n - 2];
            sub[n - 1] = h_last;
            diag[n - 1] = 2.0 * h_last;
            rhs[n - 1] = 6.0 * (end_slope - (values[n - 1] - values[n - 2]) / h_last);
        }
    }

    solve_tridiagonal(&sub, &diag, &sup, &mut rhs);
    rhs
}

/// Thomas algorithm; the spline systems are diagonally dominant so no pivoting is needed.
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &mut [f64]) {
    let n = diag.len();
    let mut modified_sup = vec![0.0; n];

    modified_sup[0] = sup[0] / diag[0];
    rhs[0] /= diag[0];
    for index in 1..n {
        let pivot = diag[index] - sub[index] * modified_sup[index - 1];
        modified_sup[index] = sup[index] / pivot;
        rhs[index] = (rhs[index] - sub[index] * rhs[index - 1]) / pivot;
    }

    for index in (0..n - 1).rev() {
        rhs[index] -= modified_sup[index] * rhs[index + 1];
    }
}
