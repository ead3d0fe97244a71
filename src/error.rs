use thiserror::Error;

use crate::{enums::Plane, volume_loader::LoadError};

/// Errors surfaced by the viewer core. None of them leave the viewer in a
/// partially updated state.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load volume: {0}")]
    Load(#[from] LoadError),

    #[error("no volume loaded")]
    NoVolume,

    #[error("{plane} slice index {index} out of range (dimension {dimension})")]
    IndexOutOfRange {
        plane: Plane,
        index: usize,
        dimension: usize,
    },

    #[error("invalid view selection: {0:?}")]
    InvalidSelection(String),

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("zoom rectangle must have non-zero finite width and height")]
    DegenerateZoom,

    #[error("failed to write image: {0}")]
    Io(#[from] image::ImageError),
}
