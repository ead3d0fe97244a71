use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2, Zip};

/// Brightness/contrast remap and 8-bit quantisation.
///
/// Parameters are trusted as given; only the output range is clamped.
pub struct Windowing;

impl Windowing {
    #[inline]
    pub(crate) fn window_value(value: f32, brightness: i32, contrast: f32) -> u8 {
        value
            .mul_add(contrast, brightness as f32)
            .clamp(0.0, 255.0) as u8
    }

    /// Compute `clamp(slice * contrast + brightness, 0, 255)` element-wise.
    pub fn apply(slice: ArrayView2<'_, f32>, brightness: i32, contrast: f32) -> Array2<u8> {
        Zip::from(slice).par_map_collect(|&v| Self::window_value(v, brightness, contrast))
    }

    /// Pack a 2-D array of gray levels into an image, row `r` becoming image
    /// line `r`.
    pub fn to_image(pixels: ArrayView2<'_, u8>) -> GrayImage {
        let (height, width) = pixels.dim();
        GrayImage::from_fn(width as u32, height as u32, |x, y| {
            Luma([pixels[[y as usize, x as usize]]])
        })
    }
}
