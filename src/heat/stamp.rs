//! Precomputed blurred-disk alpha image, composited once per aggregated point

use crate::display::PixelBuffer;

pub const DEFAULT_RADIUS: f64 = 25.0;
pub const DEFAULT_BLUR: f64 = 15.0;

/// Largest accepted radius + blur; keeps the stamp allocation bounded
const MAX_EXTENT: f64 = 1024.0;

/// Square alpha image of side `floor(2 * (radius + blur))`
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    image: PixelBuffer,
    radius: f64,
    blur: f64,
    /// (radius, blur) as asked for, before the extent cap
    requested: (f64, f64),
}

impl Stamp {
    /// Draw a disk of `radius` centered in the square and blur its alpha with a
    /// Gaussian of sigma `blur / 2`. Invalid values fall back to the defaults.
    pub fn build(radius: f64, blur: f64) -> Self {
        let mut radius = if radius.is_finite() && radius > 0.0 {
            radius
        } else {
            log::warn!("stamp: invalid radius {}, using {}", radius, DEFAULT_RADIUS);
            DEFAULT_RADIUS
        };
        let mut blur = if blur.is_finite() && blur >= 0.0 {
            blur
        } else {
            log::warn!("stamp: invalid blur {}, using {}", blur, DEFAULT_BLUR);
            DEFAULT_BLUR
        };
        let requested = (radius, blur);
        if radius + blur > MAX_EXTENT {
            log::warn!("stamp: extent {} exceeds {}, scaling down", radius + blur, MAX_EXTENT);
            // Ratio first: both operands may be near f64::MAX
            let share = 1.0 / (1.0 + blur / radius);
            radius = (MAX_EXTENT * share).clamp(0.0, MAX_EXTENT);
            blur = (MAX_EXTENT - radius).max(0.0);
        }

        let r = radius + blur;
        let side = ((r * 2.0).floor() as u32).max(1);
        let mut image = PixelBuffer::with_size(side, side);
        image.fill_circle_alpha(r, r, radius);
        image.gaussian_blur_alpha((blur / 2.0) as f32);

        log::debug!(
            "stamp: radius={} blur={} side={}px",
            radius,
            blur,
            side
        );
        Self {
            image,
            radius,
            blur,
            requested,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn blur(&self) -> f64 {
        self.blur
    }

    /// `radius + blur`: half the side, and the bleed distance around each point
    pub fn extent(&self) -> f64 {
        self.radius + self.blur
    }

    /// Side length in pixels
    pub fn side(&self) -> u32 {
        self.image.width()
    }

    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    /// Alpha at pixel (x, y) of the stamp, 0 outside
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        self.image.alpha_at(x, y)
    }

    /// True when built from the same (radius, blur), compared before capping
    pub fn matches(&self, radius: f64, blur: f64) -> bool {
        self.requested == (radius, blur)
    }
}

impl Default for Stamp {
    fn default() -> Self {
        Self::build(DEFAULT_RADIUS, DEFAULT_BLUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stamp_geometry() {
        let stamp = Stamp::default();
        assert_eq!((stamp.radius(), stamp.blur()), (25.0, 15.0));
        assert_eq!(stamp.extent(), 40.0);
        assert_eq!(stamp.side(), 80);
        assert_eq!(stamp.image().height(), 80);
    }

    #[test]
    fn test_fractional_extent_truncates_side() {
        let stamp = Stamp::build(10.3, 2.0);
        assert_eq!(stamp.side(), 24);
    }

    #[test]
    fn test_center_opaque_corner_transparent() {
        let stamp = Stamp::default();
        assert!(stamp.alpha_at(40, 40) >= 250, "center {}", stamp.alpha_at(40, 40));
        assert_eq!(stamp.alpha_at(0, 0), 0);
        assert_eq!(stamp.alpha_at(79, 79), 0);
        // Mid-edge sits two sigmas past the disk rim
        assert!(stamp.alpha_at(40, 0) < 16, "edge {}", stamp.alpha_at(40, 0));
    }

    #[test]
    fn test_radial_falloff_is_monotonic() {
        let stamp = Stamp::default();
        let c = 40;
        for dir in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
            let mut prev = stamp.alpha_at(c, c);
            for step in 1..40 {
                let a = stamp.alpha_at(c + dir.0 * step, c + dir.1 * step);
                assert!(a <= prev.saturating_add(1), "step {} {:?}: {} > {}", step, dir, a, prev);
                prev = a;
            }
        }
    }

    #[test]
    fn test_stamp_is_radially_symmetric() {
        let stamp = Stamp::build(12.0, 6.0);
        let side = stamp.side() as i32;
        for y in 0..side {
            for x in 0..side {
                let mirrored = stamp.alpha_at(side - 1 - x, side - 1 - y);
                let transposed = stamp.alpha_at(y, x);
                let a = stamp.alpha_at(x, y);
                assert!((a as i32 - mirrored as i32).abs() <= 1);
                assert!((a as i32 - transposed as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_zero_blur_is_hard_disk() {
        let stamp = Stamp::build(5.0, 0.0);
        assert_eq!(stamp.side(), 10);
        assert_eq!(stamp.alpha_at(5, 5), 255);
        assert_eq!(stamp.alpha_at(0, 0), 0);
    }

    #[test]
    fn test_invalid_inputs_fall_back() {
        let stamp = Stamp::build(-3.0, f64::NAN);
        assert!(stamp.matches(DEFAULT_RADIUS, DEFAULT_BLUR));
    }

    #[test]
    fn test_huge_extent_is_capped() {
        let stamp = Stamp::build(1.0e9, 0.0);
        assert!(stamp.extent() <= MAX_EXTENT);
        assert_eq!(stamp.side(), 2048);

        for (radius, blur) in [(1.0e308, 15.0), (f64::MAX, 0.0), (f64::MAX, f64::MAX), (1.0, 1.0e308)] {
            let stamp = Stamp::build(radius, blur);
            assert!(stamp.radius().is_finite() && stamp.blur().is_finite());
            assert!(stamp.extent() <= MAX_EXTENT, "{} + {}", stamp.radius(), stamp.blur());
            assert!(stamp.side() <= 2048);
        }
    }

    #[test]
    fn test_capped_stamp_matches_requested_values() {
        let stamp = Stamp::build(2000.0, 2000.0);
        assert_eq!((stamp.radius(), stamp.blur()), (512.0, 512.0));
        assert!(stamp.matches(2000.0, 2000.0));
        assert!(!stamp.matches(512.0, 512.0));
    }
}
