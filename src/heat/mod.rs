//! Density heatmap pipeline: grid aggregation -> stamp accumulation -> gradient colorization

mod gradient;
mod grid;
mod renderer;
mod stamp;

pub use gradient::{ColorStop, GradientLut, DEFAULT_GRADIENT};
pub use grid::{aggregate, bin, Aggregation, Cell, MaxIntensity, GRID_MARGIN, LEGACY_MAX_INTENSITY};
pub use renderer::{colorize, point_alpha, DensityRenderer, DEFAULT_MIN_OPACITY};
pub use stamp::{Stamp, DEFAULT_BLUR, DEFAULT_RADIUS};

/// A point in surface coordinates with its weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

impl WeightedPoint {
    pub fn new(x: f64, y: f64, weight: f64) -> Self {
        Self { x, y, weight }
    }

    /// Point with the default weight of 1
    pub fn unit(x: f64, y: f64) -> Self {
        Self::new(x, y, 1.0)
    }
}

/// One merged grid cell ready to be stamped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedPoint {
    pub x: f64,
    pub y: f64,
    /// Average contribution per merged point (weight / count)
    pub intensity: f64,
}
