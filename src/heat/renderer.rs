//! Stamp accumulation and gradient colorization

use super::{AggregatedPoint, ColorStop, GradientLut, Stamp};
use crate::display::PixelBuffer;

pub const DEFAULT_MIN_OPACITY: f64 = 0.05;

/// Global alpha for one stamp: `max(intensity / max, min_opacity)` in [0, 1].
/// A non-positive or non-finite `max` counts as 1.
#[inline]
pub fn point_alpha(intensity: f64, max: f64, min_opacity: f64) -> f32 {
    let max = if max.is_finite() && max > 0.0 { max } else { 1.0 };
    let ratio = intensity / max;
    let ratio = if ratio.is_nan() { 0.0 } else { ratio };
    ratio.max(min_opacity).clamp(0.0, 1.0) as f32
}

/// Replace RGB of every covered pixel with the gradient color for its alpha.
/// Transparent pixels are skipped; alpha is never modified.
pub fn colorize(surface: &mut PixelBuffer, gradient: &GradientLut) {
    // ABGR layout: [0]=A, [1]=B, [2]=G, [3]=R
    for px in surface.as_bytes_mut().chunks_exact_mut(4) {
        let alpha = px[0];
        if alpha != 0 {
            let c = gradient.lookup(alpha);
            px[1] = c.b;
            px[2] = c.g;
            px[3] = c.r;
        }
    }
}

/// Owns the stamp and gradient across redraws and paints aggregated points
#[derive(Debug, Clone, Default)]
pub struct DensityRenderer {
    stamp: Stamp,
    gradient: GradientLut,
}

impl DensityRenderer {
    pub fn new(stamp: Stamp, gradient: GradientLut) -> Self {
        Self { stamp, gradient }
    }

    pub fn stamp(&self) -> &Stamp {
        &self.stamp
    }

    pub fn gradient(&self) -> &GradientLut {
        &self.gradient
    }

    /// Rebuild the stamp if radius or blur changed. Returns true on rebuild.
    pub fn set_radius(&mut self, radius: f64, blur: f64) -> bool {
        if self.stamp.matches(radius, blur) {
            return false;
        }
        self.stamp = Stamp::build(radius, blur);
        true
    }

    /// Rebuild the lookup table from new stops
    pub fn set_gradient(&mut self, stops: &[ColorStop]) {
        self.gradient = GradientLut::build(stops);
    }

    /// Grid cell size for aggregation: half the stamp extent
    pub fn cell_size(&self) -> f64 {
        self.stamp.extent() / 2.0
    }

    /// Clear `surface`, composite the stamp once per point, then colorize.
    /// A zero-area surface is left untouched.
    pub fn render(
        &self,
        surface: &mut PixelBuffer,
        points: &[AggregatedPoint],
        max: f64,
        min_opacity: f64,
    ) {
        if surface.is_empty() {
            return;
        }
        surface.clear();

        let r = self.stamp.extent();
        for p in points {
            if !(p.x.is_finite() && p.y.is_finite()) {
                continue;
            }
            let alpha = point_alpha(p.intensity, max, min_opacity);
            let dst_x = (p.x - r).round() as i32;
            let dst_y = (p.y - r).round() as i32;
            surface.composite_alpha(self.stamp.image(), dst_x, dst_y, alpha);
        }

        colorize(surface, &self.gradient);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;

    fn point(x: f64, y: f64, intensity: f64) -> AggregatedPoint {
        AggregatedPoint { x, y, intensity }
    }

    #[test]
    fn test_point_alpha_floor_and_ratio() {
        assert_eq!(point_alpha(0.001, 10.0, 0.05), 0.05);
        assert_eq!(point_alpha(5.0, 10.0, 0.05), 0.5);
        assert_eq!(point_alpha(50.0, 5.0, 0.05), 1.0);
        assert_eq!(point_alpha(2.0, 0.0, 0.05), 1.0);
        assert_eq!(point_alpha(f64::NAN, 1.0, 0.2), 0.2);
    }

    #[test]
    fn test_empty_points_leave_transparent_surface() {
        let renderer = DensityRenderer::default();
        let mut surface = PixelBuffer::with_size(32, 32);
        surface.set_pixel_rgba(3, 3, 9, 9, 9, 9);
        renderer.render(&mut surface, &[], 1.0, DEFAULT_MIN_OPACITY);
        assert!(surface.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_single_point_colorized_with_gradient() {
        let renderer = DensityRenderer::default();
        let mut surface = PixelBuffer::with_size(100, 100);
        renderer.render(&mut surface, &[point(50.0, 50.0, 1.0)], 1.0, DEFAULT_MIN_OPACITY);

        let (r, g, b, a) = surface.get_pixel_rgba(50, 50).unwrap();
        assert!(a >= 250);
        let expected = renderer.gradient().lookup(a);
        assert_eq!((r, g, b), (expected.r, expected.g, expected.b));
        assert_eq!(surface.get_pixel_rgba(0, 0), Some((0, 0, 0, 0)));
    }

    #[test]
    fn test_every_covered_pixel_matches_lut() {
        let renderer = DensityRenderer::default();
        let mut surface = PixelBuffer::with_size(120, 90);
        let pts = [point(30.0, 30.0, 1.0), point(60.0, 40.0, 0.3), point(-10.0, 85.0, 2.0)];
        renderer.render(&mut surface, &pts, 2.0, DEFAULT_MIN_OPACITY);
        for y in 0..90 {
            for x in 0..120 {
                let (r, g, b, a) = surface.get_pixel_rgba(x, y).unwrap();
                if a == 0 {
                    assert_eq!((r, g, b), (0, 0, 0));
                } else {
                    let c = renderer.gradient().lookup(a);
                    assert_eq!((r, g, b), (c.r, c.g, c.b));
                }
            }
        }
    }

    #[test]
    fn test_dim_point_still_visible() {
        let renderer = DensityRenderer::default();
        let mut surface = PixelBuffer::with_size(100, 100);
        renderer.render(&mut surface, &[point(50.0, 50.0, 1e-9)], 1000.0, 0.05);
        let a = surface.alpha_at(50, 50);
        // 0.05 of a ~255 center
        assert!((12..=14).contains(&a), "alpha {}", a);
    }

    #[test]
    fn test_overlapping_stamps_accumulate() {
        let renderer = DensityRenderer::default();
        let mut one = PixelBuffer::with_size(100, 100);
        let mut two = PixelBuffer::with_size(100, 100);
        renderer.render(&mut one, &[point(50.0, 50.0, 0.5)], 1.0, 0.05);
        renderer.render(
            &mut two,
            &[point(50.0, 50.0, 0.5), point(52.0, 50.0, 0.5)],
            1.0,
            0.05,
        );
        assert!(two.alpha_at(51, 50) > one.alpha_at(51, 50));
    }

    #[test]
    fn test_render_is_idempotent() {
        let renderer = DensityRenderer::default();
        let pts = [point(10.0, 10.0, 1.0), point(40.5, 22.25, 0.7)];
        let mut a = PixelBuffer::with_size(64, 48);
        let mut b = PixelBuffer::with_size(64, 48);
        renderer.render(&mut a, &pts, 1.0, 0.05);
        renderer.render(&mut b, &pts, 1.0, 0.05);
        assert_eq!(a, b);
        renderer.render(&mut a, &pts, 1.0, 0.05);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_area_surface_is_noop() {
        let renderer = DensityRenderer::default();
        let mut surface = PixelBuffer::with_size(0, 10);
        renderer.render(&mut surface, &[point(0.0, 0.0, 1.0)], 1.0, 0.05);
        assert!(surface.as_bytes().is_empty());
    }

    #[test]
    fn test_set_radius_only_rebuilds_on_change() {
        let mut renderer = DensityRenderer::default();
        assert!(!renderer.set_radius(25.0, 15.0));
        assert!(renderer.set_radius(10.0, 5.0));
        assert_eq!(renderer.stamp().side(), 30);
        assert_eq!(renderer.cell_size(), 7.5);
    }

    #[test]
    fn test_capped_stamp_not_rebuilt_for_same_options() {
        let mut renderer = DensityRenderer::default();
        assert!(renderer.set_radius(5000.0, 15.0));
        assert!(renderer.stamp().extent() <= 1024.0);
        assert!(!renderer.set_radius(5000.0, 15.0));
    }

    #[test]
    fn test_custom_gradient_applied() {
        let mut renderer = DensityRenderer::default();
        renderer.set_gradient(&[ColorStop::new(0.0, Rgba::rgb(7, 8, 9))]);
        let mut surface = PixelBuffer::with_size(40, 40);
        renderer.render(&mut surface, &[point(20.0, 20.0, 1.0)], 1.0, 0.05);
        let (r, g, b, _) = surface.get_pixel_rgba(20, 20).unwrap();
        assert_eq!((r, g, b), (7, 8, 9));
    }

    #[test]
    fn test_colorize_skips_transparent() {
        let mut surface = PixelBuffer::with_size(2, 1);
        surface.set_pixel_rgba(1, 0, 0, 0, 0, 255);
        colorize(&mut surface, &GradientLut::default());
        assert_eq!(surface.get_pixel_rgba(0, 0), Some((0, 0, 0, 0)));
        let c = GradientLut::default().lookup(255);
        assert_eq!(surface.get_pixel_rgba(1, 0), Some((c.r, c.g, c.b, 255)));
    }
}
