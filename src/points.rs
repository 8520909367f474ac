//! Logical input points and point-file loading

use crate::error::Result;
use crate::util::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A logical coordinate handed to the heat layer, before viewport conversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PointRecord")]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    /// Defaults to 1 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl HeatPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            weight: None,
        }
    }

    pub fn weighted(lat: f64, lng: f64, weight: f64) -> Self {
        Self {
            lat,
            lng,
            weight: Some(weight),
        }
    }

    /// Weight with the default applied
    #[inline]
    pub fn weight_or_default(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// Accepted on-disk shapes: `[lat, lng]`, `[lat, lng, weight]` or an object
#[derive(Deserialize)]
#[serde(untagged)]
enum PointRecord {
    Pair([f64; 2]),
    Triple([f64; 3]),
    Object {
        lat: f64,
        lng: f64,
        #[serde(default)]
        weight: Option<f64>,
    },
}

impl From<PointRecord> for HeatPoint {
    fn from(record: PointRecord) -> Self {
        match record {
            PointRecord::Pair([lat, lng]) => HeatPoint::new(lat, lng),
            PointRecord::Triple([lat, lng, w]) => HeatPoint::weighted(lat, lng, w),
            PointRecord::Object { lat, lng, weight } => HeatPoint { lat, lng, weight },
        }
    }
}

/// One point or an array of points; used for streamed payloads
#[derive(Deserialize)]
#[serde(untagged)]
enum PointBatch {
    One(HeatPoint),
    Many(Vec<HeatPoint>),
}

/// Parse a JSON payload holding a single point record or an array of them
pub fn parse_points(json: &str) -> Result<Vec<HeatPoint>> {
    let batch: PointBatch = serde_json::from_str(json)?;
    Ok(match batch {
        PointBatch::One(p) => vec![p],
        PointBatch::Many(v) => v,
    })
}

/// Load points from a JSON file
pub fn load_points(path: impl AsRef<Path>) -> Result<Vec<HeatPoint>> {
    let json = fs::read_to_string(path.as_ref())?;
    let points = parse_points(&json)?;
    log::info!("loaded {} point(s) from {}", points.len(), path.as_ref().display());
    Ok(points)
}

/// Save points as a JSON array of objects
pub fn save_points(path: impl AsRef<Path>, points: &[HeatPoint]) -> Result<()> {
    let json = serde_json::to_string_pretty(points)?;
    fs::write(path, json)?;
    Ok(())
}

/// Synthetic clustered point cloud around the origin, reproducible per seed.
///
/// Points are spread over a handful of Gaussian clusters within `extent`
/// logical units of (0, 0); weights fall in [0.25, 1.25).
pub fn demo_points(count: usize, seed: u64, extent: f64) -> Vec<HeatPoint> {
    let mut rng = Rng::new(seed);
    let clusters: Vec<(f64, f64, f64)> = (0..6)
        .map(|_| {
            (
                rng.range_f64(-extent, extent) * 0.6,
                rng.range_f64(-extent, extent),
                rng.range_f64(0.05, 0.2) * extent,
            )
        })
        .collect();

    (0..count)
        .map(|_| {
            let (lat, lng, spread) = clusters[rng.index(clusters.len())];
            HeatPoint::weighted(
                lat + rng.gaussian() * spread,
                lng + rng.gaussian() * spread,
                rng.range_f64(0.25, 1.25),
            )
        })
        .collect()
}
