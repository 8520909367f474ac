//! Coarse spatial binning with running weighted-centroid merging.
//!
//! Every pass builds a fresh sparse grid keyed by `(row, col)`, merges the
//! points that share a cell, and emits one [`AggregatedPoint`] per cell.

use super::{AggregatedPoint, WeightedPoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cells of margin added to every key so points in the stamp bleed area
/// left of / above the surface still get non-negative keys
pub const GRID_MARGIN: i64 = 2;

/// Constant max used by [`MaxIntensity::LegacyFixed`]
pub const LEGACY_MAX_INTENSITY: f64 = 5.0;

/// How the normalizing maximum intensity of a pass is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaxIntensity {
    /// True maximum over the emitted intensities, never below 1
    #[default]
    Computed,
    /// Always 5, regardless of the data
    LegacyFixed,
}

/// Running aggregate of the points that fell into one grid bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
    pub count: u32,
}

impl Cell {
    fn new(p: &WeightedPoint) -> Self {
        Self {
            x: p.x,
            y: p.y,
            weight: p.weight,
            count: 1,
        }
    }

    /// Fold one more point into the weighted centroid
    fn merge(&mut self, p: &WeightedPoint) {
        let total = self.weight + p.weight;
        self.x = (self.x * self.weight + p.x * p.weight) / total;
        self.y = (self.y * self.weight + p.y * p.weight) / total;
        self.weight = total;
        self.count += 1;
    }

    /// Average contribution per merged point
    pub fn intensity(&self) -> f64 {
        self.weight / self.count as f64
    }
}

/// Output of one aggregation pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregation {
    /// One point per populated cell, in ascending (row, col) order
    pub points: Vec<AggregatedPoint>,
    /// Normalizing maximum for stamp opacity
    pub max: f64,
    /// Input points rejected for non-finite or out-of-range coordinates, or
    /// non-positive weight
    pub dropped: usize,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Largest cell index magnitude accepted; farther points can't be told apart
const MAX_CELL_INDEX: f64 = i32::MAX as f64;

/// Bucket for a point, `None` when its cell index is out of range
#[inline]
fn cell_key(p: &WeightedPoint, cell_size: f64) -> Option<(i64, i64)> {
    let col = (p.x / cell_size).floor();
    let row = (p.y / cell_size).floor();
    if col.abs() > MAX_CELL_INDEX || row.abs() > MAX_CELL_INDEX {
        return None;
    }
    Some((row as i64 + GRID_MARGIN, col as i64 + GRID_MARGIN))
}

#[inline]
fn is_usable(p: &WeightedPoint) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.weight.is_finite() && p.weight > 0.0
}

/// Build the populated cells for a point set without emitting
pub fn bin(points: &[WeightedPoint], cell_size: f64) -> (BTreeMap<(i64, i64), Cell>, usize) {
    let mut grid: BTreeMap<(i64, i64), Cell> = BTreeMap::new();
    let mut dropped = 0;
    if !(cell_size.is_finite() && cell_size > 0.0) {
        log::warn!("grid: invalid cell size {}, nothing aggregated", cell_size);
        return (grid, points.len());
    }

    for p in points {
        let key = if is_usable(p) { cell_key(p, cell_size) } else { None };
        let Some(key) = key else {
            dropped += 1;
            continue;
        };
        grid.entry(key)
            .and_modify(|cell| cell.merge(p))
            .or_insert_with(|| Cell::new(p));
    }
    (grid, dropped)
}

/// Bin `points` into cells of `cell_size` pixels and emit one point per cell
/// with `intensity = weight / count`.
pub fn aggregate(points: &[WeightedPoint], cell_size: f64, policy: MaxIntensity) -> Aggregation {
    let (grid, dropped) = bin(points, cell_size);
    if dropped > 0 {
        log::trace!("grid: dropped {} unusable point(s)", dropped);
    }

    let points: Vec<AggregatedPoint> = grid
        .values()
        .map(|cell| AggregatedPoint {
            x: cell.x,
            y: cell.y,
            intensity: cell.intensity(),
        })
        .collect();

    let max = match policy {
        MaxIntensity::LegacyFixed => LEGACY_MAX_INTENSITY,
        MaxIntensity::Computed => points.iter().map(|p| p.intensity).fold(1.0, f64::max),
    };

    Aggregation {
        points,
        max,
        dropped,
    }
}
