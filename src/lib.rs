//! # MPR viewer core
//!
//! This crate is the view-state engine of a multi-planar reconstruction
//! viewer for 3-D medical volumes. A volume is shown as three orthogonal
//! slice views:
//!  - Axial (z slices)
//!  - Coronal (y slices)
//!  - Sagittal (x slices)
//!
//! The views share one `(z, y, x)` cursor: clicking a view while the cursor
//! inspector is active moves the other two. Every view has its own
//! brightness/contrast window, visibility flag and zoom rectangle, and a cine
//! player scrubs all three in lockstep. The current slice of any view can be
//! exported as a raster image.
//!
//! Slicing is purely by array index; orientation, spacing and patient
//! coordinates are not interpreted. Volumes come from DICOM series (one
//! `.dcm` file per slice) or NIfTI files.
//!
//! The UI layer drives an [`MprViewer`] directly or through an [`EventLoop`],
//! and implements [`RenderSurface`] to be told when to redraw.
//!
//! # Examples
//!
//! ## Loading a series and reading the axial view
//!
//! ```no_run
//! # use mpr_viewer::{MprViewer, ParameterKind, Plane, ViewerConfig};
//! # use std::path::Path;
//! let mut viewer = MprViewer::new(ViewerConfig::default());
//! viewer
//!     .load_dicom_series(Path::new("dicom"))
//!     .expect("should have loaded files from directory");
//! viewer
//!     .set_view_parameter(Plane::Axial, ParameterKind::Contrast, 1.5)
//!     .expect("volume is loaded");
//! let image = viewer
//!     .current_image(Plane::Axial)
//!     .expect("should have returned the axial slice");
//! image.save("axial.png").expect("should have written the image");
//! ```

pub mod cine;
pub mod config;
pub mod cursor;
pub mod enums;
pub mod error;
pub mod event_loop;
pub mod export;
pub mod ports;
pub mod slice;
pub mod view_state;
pub mod viewer;
pub mod volume;
pub mod volume_loader;
pub mod windowing;

pub use cine::{CinePlayer, CineState, CineTimer};
pub use config::{ConfigError, ViewerConfig};
pub use cursor::{Crosshair, CursorController};
pub use enums::{Colormap, ParameterKind, Plane, SortBy, ZoomDirection};
pub use error::ViewerError;
pub use event_loop::{EventLoop, ViewerHandle};
pub use export::ImageRasterWriter;
pub use ports::{RasterWriter, RenderSurface, VolumeSource};
pub use slice::SliceExtractor;
pub use view_state::{ViewState, Views, ZoomRect};
pub use viewer::{InputEvent, MprViewer};
pub use volume::Volume;
pub use volume_loader::{FileVolumeSource, LoadError, VolumeLoader};
pub use windowing::Windowing;
