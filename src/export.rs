//! PNG export of a rendered heat surface

use crate::display::PixelBuffer;
use crate::error::{HeatError, Result};
use image::RgbaImage;
use std::path::Path;

/// Convert the surface to a straight-alpha RGBA image
pub fn to_image(surface: &PixelBuffer) -> Result<RgbaImage> {
    if surface.is_empty() {
        return Err(HeatError::InvalidArgument(format!(
            "cannot export a {}x{} surface",
            surface.width(),
            surface.height()
        )));
    }
    RgbaImage::from_raw(surface.width(), surface.height(), surface.to_rgba_bytes()).ok_or_else(
        || HeatError::InvalidArgument("surface size does not match its pixel data".to_string()),
    )
}

/// Write the surface to `path` as PNG
pub fn save_png(surface: &PixelBuffer, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let img = to_image(surface)?;
    img.save_with_format(path, image::ImageFormat::Png)?;
    log::info!(
        "wrote {}x{} heatmap to {}",
        surface.width(),
        surface.height(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_image_preserves_channels() {
        let mut surface = PixelBuffer::with_size(3, 2);
        surface.set_pixel_rgba(2, 1, 10, 20, 30, 40);
        let img = to_image(&surface).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0, [10, 20, 30, 40]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_surface_rejected() {
        let surface = PixelBuffer::with_size(0, 5);
        assert!(matches!(to_image(&surface), Err(HeatError::InvalidArgument(_))));
    }

    #[test]
    fn test_save_png_roundtrip_size() {
        let dir = std::env::temp_dir().join(format!("heatwall-png-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("heat.png");
        let mut surface = PixelBuffer::with_size(8, 4);
        surface.set_pixel_rgba(1, 1, 255, 0, 0, 255);
        save_png(&surface, &path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (8, 4));
        assert_eq!(loaded.get_pixel(1, 1).0, [255, 0, 0, 255]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
