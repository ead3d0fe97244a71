//! Boundaries to the collaborators the viewer core does not own: volume
//! readers, the raster file writer and the UI's render surface.

use std::path::Path;

use ndarray::ArrayView2;

use crate::{
    enums::{Colormap, Plane},
    error::ViewerError,
    viewer::MprViewer,
    volume::Volume,
    volume_loader::LoadError,
};

/// Produces volumes from storage. Implementations must not return partially
/// built volumes.
pub trait VolumeSource {
    fn load_dicom_series(&self, folder: &Path) -> Result<Volume, LoadError>;

    fn load_nifti(&self, file: &Path) -> Result<Volume, LoadError>;
}

/// Writes a raw intensity slice to an image file.
pub trait RasterWriter {
    fn write_image(
        &mut self,
        path: &Path,
        title: &str,
        slice: ArrayView2<'_, f32>,
        colormap: Colormap,
    ) -> Result<(), ViewerError>;
}

/// Notified after every state change that needs a redraw. The surface pulls
/// images and crosshairs from the viewer it is handed.
pub trait RenderSurface {
    /// `dirty` lists the views changed since the previous call, in axial,
    /// coronal, sagittal order. Their flags are cleared once this returns.
    fn on_state_changed(&mut self, viewer: &MprViewer, dirty: &[Plane]);
}
