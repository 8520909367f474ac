use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

// ============================================================================
// Utility Functions
// ============================================================================

/// Source-over on a single alpha channel: `a = s + d * (1 - s)`, `s` in [0, 1]
#[inline]
fn over_alpha(src: f32, dst: u8) -> u8 {
    let d = dst as f32 / 255.0;
    ((src + d * (1.0 - src)) * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Write ABGR pixel with custom alpha (RGBA8888 little-endian byte order)
#[inline]
fn write_pixel_rgba(dest: &mut [u8], r: u8, g: u8, b: u8, a: u8) {
    dest[0] = a; // A
    dest[1] = b; // B
    dest[2] = g; // G
    dest[3] = r; // R
}

/// Normalized 1D Gaussian kernel, radius `ceil(3 * sigma)`
fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as i32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / two_sigma_sq).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8888 pixel buffer for software rendering.
///
/// Starts fully transparent. The heat pipeline accumulates density in the
/// alpha channel and only writes color during colorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Transparent surface at the default window size
    pub fn new() -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Create a new transparent pixel buffer with custom resolution
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// True for a zero-area buffer
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when (x, y) addresses a pixel of this surface
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Reallocate to a new size. Contents are discarded (transparent).
    /// Returns false when the size was already current.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == self.width && height == self.height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * 4];
        true
    }

    /// Clear every pixel to fully transparent black
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Set a single pixel with custom alpha (bounds checked)
    #[inline]
    pub fn set_pixel_rgba(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8, a: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            write_pixel_rgba(&mut self.pixels[idx..idx + 4], r, g, b, a);
        }
    }

    /// Straight RGBA of one pixel
    /// `None` outside the surface
    #[inline]
    pub fn get_pixel_rgba(&self, x: i32, y: i32) -> Option<(u8, u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((
                self.pixels[idx + 3], // R
                self.pixels[idx + 2], // G
                self.pixels[idx + 1], // B
                self.pixels[idx],     // A
            ))
        } else {
            None
        }
    }

    /// Alpha channel of a pixel, 0 when out of bounds
    #[inline]
    pub fn alpha_at(&self, x: i32, y: i32) -> u8 {
        if self.in_bounds(x, y) {
            self.pixels[self.pixel_index(x as u32, y as u32)]
        } else {
            0
        }
    }

    /// Number of pixels with nonzero alpha
    pub fn covered_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[0] != 0).count()
    }

    // ========================================================================
    // Alpha primitives
    // ========================================================================

    /// Anti-aliased filled disk written into the alpha channel only.
    /// Coverage ramps over one pixel across the rim; color channels stay as they are.
    pub fn fill_circle_alpha(&mut self, cx: f64, cy: f64, radius: f64) {
        if radius <= 0.0 || self.is_empty() {
            return;
        }
        let y_start = ((cy - radius - 1.0).floor() as i32).max(0);
        let y_end = ((cy + radius + 1.0).ceil() as i32).min(self.height as i32 - 1);
        let x_start = ((cx - radius - 1.0).floor() as i32).max(0);
        let x_end = ((cx + radius + 1.0).ceil() as i32).min(self.width as i32 - 1);

        for y in y_start..=y_end {
            let dy = y as f64 + 0.5 - cy;
            for x in x_start..=x_end {
                let dx = x as f64 + 0.5 - cx;
                let dist = (dx * dx + dy * dy).sqrt();
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    let idx = self.pixel_index(x as u32, y as u32);
                    self.pixels[idx] = (coverage * 255.0).round() as u8;
                }
            }
        }
    }

    /// Separable Gaussian blur of the alpha channel. Pixels outside the
    /// buffer count as transparent, so content fades out at the edges.
    pub fn gaussian_blur_alpha(&mut self, sigma: f32) {
        if !(sigma > 0.0) || self.is_empty() {
            return;
        }
        let kernel = gaussian_kernel(sigma);
        let r = (kernel.len() / 2) as i32;
        let w = self.width as i32;
        let h = self.height as i32;

        let src: Vec<f32> = self.pixels.chunks_exact(4).map(|px| px[0] as f32).collect();
        let mut temp = vec![0.0f32; src.len()];

        // --- Horizontal pass: src -> temp ---
        for y in 0..h {
            let row = (y * w) as usize;
            for x in 0..w {
                let mut sum = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = x + k as i32 - r;
                    if sx >= 0 && sx < w {
                        sum += src[row + sx as usize] * weight;
                    }
                }
                temp[row + x as usize] = sum;
            }
        }

        // --- Vertical pass: temp -> pixels ---
        for x in 0..w {
            for y in 0..h {
                let mut sum = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let sy = y + k as i32 - r;
                    if sy >= 0 && sy < h {
                        sum += temp[(sy * w + x) as usize] * weight;
                    }
                }
                let idx = self.pixel_index(x as u32, y as u32);
                self.pixels[idx] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Composite the alpha channel of `src` onto this buffer at (dst_x, dst_y),
    /// scaled by `opacity`, using source-over. Color channels are untouched.
    /// Skips fully transparent source pixels.
    pub fn composite_alpha(&mut self, src: &PixelBuffer, dst_x: i32, dst_y: i32, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity == 0.0 {
            return;
        }
        let src_w = src.width() as i32;
        let src_h = src.height() as i32;
        let dst_w = self.width as i32;
        let dst_h = self.height as i32;

        // Clip the source rectangle once instead of per pixel
        let sx0 = dst_x.saturating_neg().max(0);
        let sy0 = dst_y.saturating_neg().max(0);
        let sx1 = src_w.min(dst_w.saturating_sub(dst_x));
        let sy1 = src_h.min(dst_h.saturating_sub(dst_y));
        if sx0 >= sx1 || sy0 >= sy1 {
            return;
        }

        for sy in sy0..sy1 {
            let mut si = src.pixel_index(sx0 as u32, sy as u32);
            let mut di = self.pixel_index((dst_x + sx0) as u32, (dst_y + sy) as u32);
            for _ in sx0..sx1 {
                let sa = src.pixels[si];
                if sa != 0 {
                    let s = sa as f32 / 255.0 * opacity;
                    self.pixels[di] = over_alpha(s, self.pixels[di]);
                }
                si += 4;
                di += 4;
            }
        }
    }

    // ========================================================================
    // Raw access
    // ========================================================================

    /// Raw ABGR bytes for SDL texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable access to raw pixels for post-processing passes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Straight (non-premultiplied) RGBA bytes in row-major order, for image export
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len());
        for px in self.pixels.chunks_exact(4) {
            out.extend_from_slice(&[px[3], px[2], px[1], px[0]]);
        }
        out
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}
