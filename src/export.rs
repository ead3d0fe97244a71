use std::{fs, path::Path};

use image::{GrayImage, ImageError, Luma};
use ndarray::ArrayView2;
use tracing::info;

use crate::{enums::Colormap, error::ViewerError, ports::RasterWriter};

/// Writes slices with the `image` crate, picking the format from the file
/// extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRasterWriter;

impl ImageRasterWriter {
    /// Stretch the slice's own min..max onto 0..255. A flat slice is black.
    pub fn render(slice: ArrayView2<'_, f32>, colormap: Colormap) -> GrayImage {
        let Colormap::Grayscale = colormap;
        let (min, max) = slice
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = max - min;
        let (height, width) = slice.dim();
        GrayImage::from_fn(width as u32, height as u32, |x, y| {
            let value = slice[[y as usize, x as usize]];
            let level = if range > 0.0 && value.is_finite() {
                ((value - min) / range * 255.0).round().clamp(0.0, 255.0) as u8
            } else {
                0
            };
            Luma([level])
        })
    }
}

impl RasterWriter for ImageRasterWriter {
    fn write_image(
        &mut self,
        path: &Path,
        title: &str,
        slice: ArrayView2<'_, f32>,
        colormap: Colormap,
    ) -> Result<(), ViewerError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(ImageError::IoError)?;
        }
        Self::render(slice, colormap).save(path)?;
        info!(title, path = %path.display(), "saved slice");
        Ok(())
    }
}
