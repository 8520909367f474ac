//! heatwall: a software density heatmap renderer.
//!
//! Weighted points are binned into a coarse grid, each merged cell stamps a
//! blurred disk into the alpha channel of a [`PixelBuffer`], and the alpha
//! field is colorized through a 256-entry gradient lookup table.

pub mod color;
pub mod display;
pub mod error;
pub mod export;
pub mod heat;
pub mod layer;
#[cfg(feature = "mqtt")]
pub mod mqtt;
pub mod points;
pub mod util;

pub use color::Rgba;
pub use display::PixelBuffer;
pub use error::{HeatError, Result};
pub use heat::{
    AggregatedPoint, ColorStop, DensityRenderer, GradientLut, MaxIntensity, Stamp, WeightedPoint,
};
pub use layer::{
    HeatLayer, HeatLayerController, HeatLayerState, HeatOptions, PassStats, PlanarViewport,
    ViewportHost,
};
pub use points::HeatPoint;
