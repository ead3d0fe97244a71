use ndarray::Array3;

use crate::{enums::Plane, volume_loader::LoadError};

/// Dense scalar voxel grid in `(z, y, x)` order.
///
/// A `Volume` is immutable once built; loading another dataset replaces it
/// wholesale.
#[derive(Debug, Clone)]
pub struct Volume {
    data: Array3<f32>,
}

impl Volume {
    /// Wrap a voxel grid, rejecting any zero-sized dimension.
    pub fn new(data: Array3<f32>) -> Result<Self, LoadError> {
        let (z, y, x) = data.dim();
        if z == 0 || y == 0 || x == 0 {
            return Err(LoadError::EmptyVolume { shape: (z, y, x) });
        }
        Ok(Self { data })
    }

    /// Build a volume from a flat row-major buffer of `z * y * x` voxels.
    pub fn from_shape_vec(raw: Vec<f32>, shape: (usize, usize, usize)) -> Result<Self, LoadError> {
        let len = raw.len();
        let data = Array3::from_shape_vec(shape, raw)
            .map_err(|_| LoadError::ShapeMismatch { shape, len })?;
        Self::new(data)
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Number of slices along the given plane's index axis.
    pub fn dimension(&self, plane: Plane) -> usize {
        self.data.len_of(ndarray::Axis(plane.axis()))
    }

    pub fn in_bounds(&self, plane: Plane, index: usize) -> bool {
        index < self.dimension(plane)
    }

    /// `(rows, cols)` of a slice taken in the given plane.
    pub fn slice_shape(&self, plane: Plane) -> (usize, usize) {
        let (z, y, x) = self.dim();
        match plane {
            Plane::Axial => (y, x),
            Plane::Coronal => (z, x),
            Plane::Sagittal => (z, y),
        }
    }

    /// Largest extent across the three axes.
    pub fn max_extent(&self) -> usize {
        let (z, y, x) = self.dim();
        z.max(y).max(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_per_plane() {
        let volume = Volume::new(Array3::zeros((4, 6, 8))).unwrap();
        assert_eq!(volume.dimension(Plane::Axial), 4);
        assert_eq!(volume.dimension(Plane::Coronal), 6);
        assert_eq!(volume.dimension(Plane::Sagittal), 8);
        assert_eq!(volume.slice_shape(Plane::Axial), (6, 8));
        assert_eq!(volume.slice_shape(Plane::Coronal), (4, 8));
        assert_eq!(volume.slice_shape(Plane::Sagittal), (4, 6));
        assert_eq!(volume.max_extent(), 8);
    }

    #[test]
    fn bounds_predicate() {
        let volume = Volume::new(Array3::zeros((2, 3, 4))).unwrap();
        assert!(volume.in_bounds(Plane::Axial, 1));
        assert!(!volume.in_bounds(Plane::Axial, 2));
        assert!(volume.in_bounds(Plane::Sagittal, 3));
        assert!(!volume.in_bounds(Plane::Sagittal, 4));
    }

    #[test]
    fn empty_dimension_is_rejected() {
        let err = Volume::new(Array3::zeros((0, 3, 4))).unwrap_err();
        assert!(matches!(err, LoadError::EmptyVolume { shape: (0, 3, 4) }));
    }

    #[test]
    fn flat_buffer_must_match_shape() {
        assert!(Volume::from_shape_vec(vec![0.0; 24], (2, 3, 4)).is_ok());
        let err = Volume::from_shape_vec(vec![0.0; 23], (2, 3, 4)).unwrap_err();
        assert!(matches!(err, LoadError::ShapeMismatch { len: 23, .. }));
    }
}
