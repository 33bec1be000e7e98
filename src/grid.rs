//! Parameter grid: the delay and buffer-size axes and their coordinate mesh.
//!
//! The mesh is built once per run and shared by reference with every
//! surface, so all variants are plotted against identical coordinates.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, Result};

/// Delay axis definition in milliseconds (0..=190, step 10).
pub const DELAY_AXIS: AxisSpec = AxisSpec {
    start: 0.0,
    stop: 190.0,
    step: 10.0,
};

/// Buffer-size axis definition in bytes (100..=2000, step 100).
pub const BUFFER_AXIS: AxisSpec = AxisSpec {
    start: 100.0,
    stop: 2000.0,
    step: 100.0,
};

/// Upper limit on samples per axis.
pub const MAX_SAMPLES: usize = 10_000;

/// Inclusive axis definition as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    /// First sample
    pub start: f64,
    /// Last sample (inclusive)
    pub stop: f64,
    /// Distance between samples
    pub step: f64,
}

/// An ordered, strictly increasing sequence of sample points.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    spec: AxisSpec,
    values: Array1<f64>,
}

impl Axis {
    /// Build an axis from `start` to `stop` (inclusive) in `step` increments.
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self> {
        Self::from_spec(AxisSpec { start, stop, step })
    }

    /// Build an axis from a configuration entry.
    pub fn from_spec(spec: AxisSpec) -> Result<Self> {
        let AxisSpec { start, stop, step } = spec;
        if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
            return Err(PlotError::Config(format!(
                "axis bounds must be finite (start={start}, stop={stop}, step={step})"
            )));
        }
        if step <= 0.0 {
            return Err(PlotError::Config(format!(
                "axis step must be positive, got {step}"
            )));
        }
        if stop < start {
            return Err(PlotError::Config(format!(
                "axis stop {stop} is below start {start}"
            )));
        }

        // Tolerate float noise so that 0..=190 step 10 yields exactly 20 points.
        let intervals = ((stop - start) / step + 1e-9).floor();
        if !intervals.is_finite() || intervals >= MAX_SAMPLES as f64 {
            return Err(PlotError::Config(format!(
                "axis {start}..{stop} step {step} exceeds {MAX_SAMPLES} samples"
            )));
        }
        let count = intervals as usize + 1;
        let values = Array1::from_shape_fn(count, |i| start + i as f64 * step);

        Ok(Self { spec, values })
    }

    /// The definition this axis was built from.
    pub fn spec(&self) -> AxisSpec {
        self.spec
    }

    /// Sample points.
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed axis; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest sample.
    pub fn min(&self) -> f64 {
        self.spec.start
    }

    /// Largest sample actually produced (may be below `stop` if the step
    /// does not divide the span).
    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}

/// Cartesian product of the delay and buffer-size axes.
///
/// Both grids have shape `(buffer.len(), delay.len())`: rows follow the
/// buffer axis, columns follow the delay axis.
#[derive(Debug, Clone)]
pub struct ParameterMesh {
    delay: Axis,
    buffer: Axis,
    delay_grid: Array2<f64>,
    buffer_grid: Array2<f64>,
}

impl ParameterMesh {
    /// Build the mesh from two axes.
    pub fn new(delay: Axis, buffer: Axis) -> Self {
        let shape = (buffer.len(), delay.len());
        let delay_grid = Array2::from_shape_fn(shape, |(_, j)| delay.values()[j]);
        let buffer_grid = Array2::from_shape_fn(shape, |(i, _)| buffer.values()[i]);

        Self {
            delay,
            buffer,
            delay_grid,
            buffer_grid,
        }
    }

    /// Build the mesh from axis definitions.
    pub fn from_specs(delay: AxisSpec, buffer: AxisSpec) -> Result<Self> {
        Ok(Self::new(Axis::from_spec(delay)?, Axis::from_spec(buffer)?))
    }

    /// `(buffer samples, delay samples)`; every dataset must have this shape.
    pub fn shape(&self) -> (usize, usize) {
        self.delay_grid.dim()
    }

    /// Delay axis (columns).
    pub fn delay_axis(&self) -> &Axis {
        &self.delay
    }

    /// Buffer-size axis (rows).
    pub fn buffer_axis(&self) -> &Axis {
        &self.buffer
    }

    /// Delay value at every cell.
    pub fn delay_grid(&self) -> &Array2<f64> {
        &self.delay_grid
    }

    /// Buffer-size value at every cell.
    pub fn buffer_grid(&self) -> &Array2<f64> {
        &self.buffer_grid
    }
}

impl Default for ParameterMesh {
    fn default() -> Self {
        Self::from_specs(DELAY_AXIS, BUFFER_AXIS).expect("built-in axes are valid")
    }
}
