//! Alpha -> color lookup table built from gradient stops

use crate::color::Rgba;
use crate::util::lerp_color;
use serde::{Deserialize, Serialize};

/// One gradient stop: `offset` in [0, 1] along the ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(offset: f64, color: Rgba) -> Self {
        Self { offset, color }
    }

    fn is_valid(&self) -> bool {
        self.offset.is_finite() && (0.0..=1.0).contains(&self.offset)
    }
}

/// Blue -> cyan -> lime -> yellow -> red
pub const DEFAULT_GRADIENT: [ColorStop; 5] = [
    ColorStop::new(0.4, Rgba::rgb(0, 0, 255)),
    ColorStop::new(0.6, Rgba::rgb(0, 255, 255)),
    ColorStop::new(0.7, Rgba::rgb(0, 255, 0)),
    ColorStop::new(0.8, Rgba::rgb(255, 255, 0)),
    ColorStop::new(1.0, Rgba::rgb(255, 0, 0)),
];

/// 256-entry table indexed by accumulated alpha
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradientLut {
    table: [Rgba; 256],
}

impl GradientLut {
    /// Build the table as a 1x256 vertical linear gradient sampled at each row's
    /// pixel center. Out-of-range stops are dropped; no usable stops means the
    /// default gradient.
    pub fn build(stops: &[ColorStop]) -> Self {
        let mut valid: Vec<ColorStop> = stops.iter().copied().filter(ColorStop::is_valid).collect();
        if valid.len() != stops.len() {
            log::warn!(
                "gradient: dropped {} stop(s) with offsets outside [0, 1]",
                stops.len() - valid.len()
            );
        }
        if valid.is_empty() {
            if !stops.is_empty() {
                log::warn!("gradient: no usable stops, using default gradient");
            }
            valid = DEFAULT_GRADIENT.to_vec();
        }
        // Stable, so equal offsets keep their given order (hard stops)
        valid.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        let mut table = [Rgba::TRANSPARENT; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let t = (i as f64 + 0.5) / 256.0;
            *entry = sample(&valid, t);
        }
        Self { table }
    }

    /// Color for an accumulated alpha value
    #[inline]
    pub fn lookup(&self, alpha: u8) -> Rgba {
        self.table[alpha as usize]
    }

    pub fn table(&self) -> &[Rgba; 256] {
        &self.table
    }
}

impl Default for GradientLut {
    fn default() -> Self {
        Self::build(&DEFAULT_GRADIENT)
    }
}

/// Evaluate sorted, non-empty stops at `t`; flat beyond the first and last stop
fn sample(stops: &[ColorStop], t: f64) -> Rgba {
    let first = stops[0];
    let last = stops[stops.len() - 1];
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t < b.offset {
            let span = b.offset - a.offset;
            return if span > 0.0 {
                lerp_color(a.color, b.color, (t - a.offset) / span)
            } else {
                b.color
            };
        }
    }
    last.color
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgba, b: Rgba, tol: i32) -> bool {
        (a.r as i32 - b.r as i32).abs() <= tol
            && (a.g as i32 - b.g as i32).abs() <= tol
            && (a.b as i32 - b.b as i32).abs() <= tol
            && (a.a as i32 - b.a as i32).abs() <= tol
    }

    #[test]
    fn test_default_gradient_endpoints() {
        let lut = GradientLut::default();
        assert_eq!(lut.lookup(0), Rgba::rgb(0, 0, 255));
        assert!(close(lut.lookup(255), Rgba::rgb(255, 0, 0), 4), "{:?}", lut.lookup(255));
    }

    #[test]
    fn test_flat_before_first_stop() {
        let lut = GradientLut::default();
        // t = 100.5 / 256 ~= 0.39 is still before the 0.4 stop
        assert_eq!(lut.lookup(100), Rgba::rgb(0, 0, 255));
        // t ~= 0.70 sits on the lime stop
        assert!(close(lut.lookup(179), Rgba::rgb(0, 255, 0), 4), "{:?}", lut.lookup(179));
    }

    #[test]
    fn test_two_stop_linear_ramp() {
        let lut = GradientLut::build(&[
            ColorStop::new(0.0, Rgba::rgb(0, 0, 0)),
            ColorStop::new(1.0, Rgba::rgb(255, 255, 255)),
        ]);
        for i in 0..=255u8 {
            let expected = ((i as f64 + 0.5) / 256.0 * 255.0).round() as u8;
            assert_eq!(lut.lookup(i).r, expected);
        }
    }

    #[test]
    fn test_unsorted_stops_are_sorted() {
        let a = GradientLut::build(&[
            ColorStop::new(1.0, Rgba::rgb(255, 0, 0)),
            ColorStop::new(0.0, Rgba::rgb(0, 0, 255)),
        ]);
        let b = GradientLut::build(&[
            ColorStop::new(0.0, Rgba::rgb(0, 0, 255)),
            ColorStop::new(1.0, Rgba::rgb(255, 0, 0)),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_stop_is_solid() {
        let lut = GradientLut::build(&[ColorStop::new(0.5, Rgba::rgb(1, 2, 3))]);
        assert!(lut.table().iter().all(|&c| c == Rgba::rgb(1, 2, 3)));
    }

    #[test]
    fn test_empty_and_invalid_fall_back_to_default() {
        let default = GradientLut::default();
        assert_eq!(GradientLut::build(&[]), default);
        assert_eq!(
            GradientLut::build(&[ColorStop::new(1.5, Rgba::rgb(9, 9, 9))]),
            default
        );
        assert_eq!(
            GradientLut::build(&[ColorStop::new(f64::NAN, Rgba::rgb(9, 9, 9))]),
            default
        );
    }

    #[test]
    fn test_hard_stop() {
        let lut = GradientLut::build(&[
            ColorStop::new(0.5, Rgba::rgb(0, 0, 0)),
            ColorStop::new(0.5, Rgba::rgb(255, 255, 255)),
        ]);
        assert_eq!(lut.lookup(127), Rgba::rgb(0, 0, 0));
        assert_eq!(lut.lookup(128), Rgba::rgb(255, 255, 255));
    }
}
