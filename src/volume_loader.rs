use crate::{enums::SortBy, ports::VolumeSource, volume::Volume};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, Array3, s};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions, error::NiftiError};
use rayon::prelude::*;
use std::{fs, path::Path};
use thiserror::Error;
use tracing::{info, warn};
use web_time::Instant;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Volume has an empty dimension: {shape:?}")]
    EmptyVolume { shape: (usize, usize, usize) },

    #[error("Buffer of {len} voxels does not fit shape {shape:?}")]
    ShapeMismatch {
        shape: (usize, usize, usize),
        len: usize,
    },

    #[error("Expected a 3-D volume, got shape {0:?}")]
    UnsupportedShape(Vec<usize>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] NiftiError),
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from DICOM objects
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - Slice of DICOM file objects
    /// * `sort_by` - Method to sort the slices
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found or dimensions are inconsistent
    pub fn load_from_dicom_objects(
        dicom_objects: &[FileDicomObject<InMemDicomObject>],
        sort_by: SortBy,
    ) -> Result<Volume, LoadError> {
        let mut images_with_order: Vec<_> = dicom_objects
            .par_iter()
            .filter_map(|dicom_object| Self::extract_image_with_order(dicom_object, &sort_by))
            .collect();

        if images_with_order.is_empty() {
            return Err(LoadError::NoValidImages);
        }
        let skipped = dicom_objects.len() - images_with_order.len();
        if skipped > 0 {
            warn!(skipped, "skipped DICOM objects without decodable pixel data");
        }

        Self::sort_images(&mut images_with_order, sort_by);

        let images: Vec<_> = images_with_order
            .into_iter()
            .map(|(_, image)| image)
            .collect();

        Self::validate_dimensions(&images)?;

        Volume::new(Self::build_volume_array(&images))
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path> + Sync],
        sort_by: SortBy,
    ) -> Result<Volume, LoadError> {
        let objects: Result<Vec<_>, _> = paths
            .par_iter()
            .map(|path| open_file(path.as_ref()))
            .collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, LoadError> {
        let started = Instant::now();
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(LoadError::NoValidImages);
        }

        let volume = Self::load_from_file_paths(&paths, sort_by)?;
        info!(
            path = %path.as_ref().display(),
            files = paths.len(),
            shape = ?volume.dim(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded DICOM series"
        );
        Ok(volume)
    }

    /// Load a 3-D NIfTI file (`.nii` or `.nii.gz`).
    ///
    /// NIfTI stores voxels as `(x, y, z)`; the result is reordered to
    /// `(z, y, x)`. A trailing singleton 4th dimension is accepted.
    pub fn load_nifti(path: impl AsRef<Path>) -> Result<Volume, LoadError> {
        let started = Instant::now();
        let object = ReaderOptions::new().read_file(path.as_ref())?;
        let array = object.into_volume().into_ndarray::<f32>()?;
        let shape = array.shape().to_vec();
        let voxels: Vec<f32> = array.iter().copied().collect();

        let volume = Self::volume_from_xyz(&shape, voxels)?;
        info!(
            path = %path.as_ref().display(),
            shape = ?volume.dim(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded NIfTI volume"
        );
        Ok(volume)
    }

    fn volume_from_xyz(shape: &[usize], voxels: Vec<f32>) -> Result<Volume, LoadError> {
        let (nx, ny, nz) = match shape {
            [nx, ny, nz] | [nx, ny, nz, 1] => (*nx, *ny, *nz),
            _ => return Err(LoadError::UnsupportedShape(shape.to_vec())),
        };
        let len = voxels.len();
        let xyz = Array3::from_shape_vec((nx, ny, nz), voxels).map_err(|_| {
            LoadError::ShapeMismatch {
                shape: (nx, ny, nz),
                len,
            }
        })?;
        Volume::new(xyz.permuted_axes([2, 1, 0]).as_standard_layout().into_owned())
    }

    fn extract_image_with_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<(Option<f32>, Array2<f32>)> {
        let order = Self::get_sort_order(dicom_object, sort_by)?;
        let image_2d = Self::decode_image(dicom_object)?;
        Some((order, image_2d))
    }

    fn get_sort_order(
        dicom_object: &FileDicomObject<InMemDicomObject>,
        sort_by: &SortBy,
    ) -> Option<Option<f32>> {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let pos = dicom_object
                    .element(tags::IMAGE_POSITION_PATIENT)
                    .ok()?
                    .to_multi_float32()
                    .ok()?;
                Some(pos.get(2).copied())
            }
            SortBy::TablePosition => {
                let pos = dicom_object
                    .element(tags::TABLE_POSITION)
                    .ok()?
                    .to_float32()
                    .ok();
                Some(pos)
            }
            SortBy::InstanceNumber => {
                let num = dicom_object
                    .element(tags::INSTANCE_NUMBER)
                    .ok()?
                    .to_int::<i32>()
                    .ok()
                    .map(|n| n as f32);
                Some(num)
            }
            SortBy::None => Some(Some(0.0)),
        }
    }

    // Modality rescale is applied, VOI windowing is left to the viewer.
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Option<Array2<f32>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn sort_images(images_with_order: &mut [(Option<f32>, Array2<f32>)], sort_by: SortBy) {
        if !matches!(sort_by, SortBy::None) {
            images_with_order
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        }

        if matches!(sort_by, SortBy::ImagePositionPatient) {
            images_with_order.reverse();
        }
    }

    fn validate_dimensions(images: &[Array2<f32>]) -> Result<(), LoadError> {
        let first_dim = images[0].dim();
        if images.iter().any(|img| img.dim() != first_dim) {
            return Err(LoadError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(images: &[Array2<f32>]) -> Array3<f32> {
        let (height, width) = images[0].dim();
        let depth = images.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, image) in images.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(image);
        }

        volume
    }
}

/// Reads volumes from the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileVolumeSource {
    pub sort_by: SortBy,
}

impl FileVolumeSource {
    pub fn new(sort_by: SortBy) -> Self {
        Self { sort_by }
    }
}

impl VolumeSource for FileVolumeSource {
    fn load_dicom_series(&self, folder: &Path) -> Result<Volume, LoadError> {
        VolumeLoader::load_from_directory(folder, self.sort_by)
    }

    fn load_nifti(&self, file: &Path) -> Result<Volume, LoadError> {
        VolumeLoader::load_nifti(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn nifti_axes_are_reordered_to_zyx() {
        let (nx, ny, nz) = (2, 3, 4);
        // logical (x, y, z) order, z fastest
        let voxels: Vec<f32> = (0..nx)
            .flat_map(|x| {
                (0..ny).flat_map(move |y| (0..nz).map(move |z| (x * 100 + y * 10 + z) as f32))
            })
            .collect();
        let volume = VolumeLoader::volume_from_xyz(&[nx, ny, nz], voxels).unwrap();
        assert_eq!(volume.dim(), (4, 3, 2));
        assert_eq!(volume.data()[[3, 2, 1]], 123.0);
        assert!(volume.data().is_standard_layout());
    }

    #[test]
    fn singleton_fourth_dimension_is_accepted() {
        let volume = VolumeLoader::volume_from_xyz(&[2, 2, 2, 1], vec![0.0; 8]).unwrap();
        assert_eq!(volume.dim(), (2, 2, 2));
    }

    #[test]
    fn non_volumetric_shapes_are_rejected() {
        let err = VolumeLoader::volume_from_xyz(&[2, 2, 2, 3], vec![0.0; 24]).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedShape(_)));
        let err = VolumeLoader::volume_from_xyz(&[4, 4], vec![0.0; 16]).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedShape(_)));
    }

    #[test]
    fn directory_without_dicom_files_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"not dicom").unwrap();
        let err = VolumeLoader::load_from_directory(dir.path(), SortBy::None).unwrap_err();
        assert!(matches!(err, LoadError::NoValidImages));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let source = FileVolumeSource::default();
        let err = source.load_dicom_series(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }

    #[test]
    fn unreadable_nifti_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.nii");
        fs::write(&path, b"definitely not a nifti header").unwrap();
        assert!(FileVolumeSource::default().load_nifti(&path).is_err());
    }

    #[test]
    fn slices_sort_by_key() {
        let mut images = vec![
            (Some(2.0), Array2::from_elem((1, 1), 2.0f32)),
            (Some(0.0), Array2::from_elem((1, 1), 0.0f32)),
            (Some(1.0), Array2::from_elem((1, 1), 1.0f32)),
        ];
        VolumeLoader::sort_images(&mut images, SortBy::InstanceNumber);
        let order: Vec<_> = images.iter().map(|(key, _)| key.unwrap()).collect();
        assert_eq!(order, vec![0.0, 1.0, 2.0]);

        VolumeLoader::sort_images(&mut images, SortBy::ImagePositionPatient);
        let order: Vec<_> = images.iter().map(|(key, _)| key.unwrap()).collect();
        assert_eq!(order, vec![2.0, 1.0, 0.0]);
    }
}
