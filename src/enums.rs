use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// One of the three orthogonal viewing directions of the `(z, y, x)` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Axial,
    Coronal,
    Sagittal,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Axial, Plane::Coronal, Plane::Sagittal];

    /// Array axis the slice index runs along (z for axial, y for coronal,
    /// x for sagittal).
    pub fn axis(self) -> usize {
        match self {
            Plane::Axial => 0,
            Plane::Coronal => 1,
            Plane::Sagittal => 2,
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plane::Axial => write!(f, "Axial"),
            Plane::Coronal => write!(f, "Coronal"),
            Plane::Sagittal => write!(f, "Sagittal"),
        }
    }
}

impl FromStr for Plane {
    type Err = ViewerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "axial" => Ok(Plane::Axial),
            "coronal" => Ok(Plane::Coronal),
            "sagittal" => Ok(Plane::Sagittal),
            _ => Err(ViewerError::InvalidSelection(value.to_owned())),
        }
    }
}

/// Which per-view parameter a slider controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Slice,
    Brightness,
    Contrast,
}

/// Scroll-wheel direction. `In` corresponds to wheel up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Colormap {
    #[default]
    Grayscale,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}
