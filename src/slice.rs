use ndarray::{Array2, ArrayView2, s};

use crate::{enums::Plane, error::ViewerError, volume::Volume};

/// Cuts 2-D slices out of a [`Volume`] by array index.
pub struct SliceExtractor;

impl SliceExtractor {
    /// Borrow the slice at `index` along `plane`.
    ///
    /// Axial yields `volume[index, :, :]` with shape `(y, x)`, coronal
    /// `volume[:, index, :]` with shape `(z, x)` and sagittal
    /// `volume[:, :, index]` with shape `(z, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::IndexOutOfRange`] if `index` is not below the
    /// plane's dimension.
    pub fn extract(
        volume: &Volume,
        plane: Plane,
        index: usize,
    ) -> Result<ArrayView2<'_, f32>, ViewerError> {
        if !volume.in_bounds(plane, index) {
            return Err(ViewerError::IndexOutOfRange {
                plane,
                index,
                dimension: volume.dimension(plane),
            });
        }
        let data = volume.data();
        let slice = match plane {
            Plane::Axial => data.slice(s![index, .., ..]),
            Plane::Coronal => data.slice(s![.., index, ..]),
            Plane::Sagittal => data.slice(s![.., .., index]),
        };
        Ok(slice)
    }

    /// Flip rows so the last row is drawn at the top.
    pub fn flip_vertical<A: Clone>(slice: ArrayView2<'_, A>) -> Array2<A> {
        slice.slice(s![..;-1, ..]).to_owned()
    }
}
