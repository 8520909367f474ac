use super::HeatOptions;
use crate::points::HeatPoint;
use std::sync::Arc;

/// Immutable snapshot of everything a render pass reads.
///
/// Mutations produce a new state; the point list is shared between
/// snapshots until one of them appends.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeatLayerState {
    points: Arc<Vec<HeatPoint>>,
    options: Arc<HeatOptions>,
}

impl HeatLayerState {
    pub fn new(points: Vec<HeatPoint>, options: HeatOptions) -> Self {
        Self {
            points: Arc::new(points),
            options: Arc::new(options.sanitized()),
        }
    }

    pub fn points(&self) -> &[HeatPoint] {
        &self.points
    }

    pub fn options(&self) -> &HeatOptions {
        &self.options
    }

    /// Same options, new point set
    pub fn with_points(&self, points: Vec<HeatPoint>) -> Self {
        Self {
            points: Arc::new(points),
            options: Arc::clone(&self.options),
        }
    }

    /// Same options, one more point. Appends in place when this snapshot
    /// is the only owner of its point list.
    pub fn with_point(mut self, point: HeatPoint) -> Self {
        Arc::make_mut(&mut self.points).push(point);
        self
    }

    /// Same points, new (sanitized) options
    pub fn with_options(&self, options: HeatOptions) -> Self {
        Self {
            points: Arc::clone(&self.points),
            options: Arc::new(options.sanitized()),
        }
    }
}
