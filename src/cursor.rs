use tracing::debug;

use crate::{
    enums::Plane,
    error::ViewerError,
    view_state::{Views, coordinate_to_index},
};

/// Planes whose indices a click's x and y coordinates address.
pub fn click_targets(plane: Plane) -> (Plane, Plane) {
    match plane {
        Plane::Axial => (Plane::Sagittal, Plane::Coronal),
        Plane::Coronal => (Plane::Sagittal, Plane::Axial),
        Plane::Sagittal => (Plane::Coronal, Plane::Axial),
    }
}

/// Dashed reference lines drawn on one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crosshair {
    pub plane: Plane,
    /// x position of the vertical line.
    pub vertical: usize,
    /// y position of the horizontal line.
    pub horizontal: usize,
}

impl Crosshair {
    /// RGB of the horizontal line.
    pub const HORIZONTAL_COLOR: [u8; 3] = [255, 0, 0];
    /// RGB of the vertical line.
    pub const VERTICAL_COLOR: [u8; 3] = [0, 255, 0];

    fn for_plane(plane: Plane, views: &Views) -> Self {
        let (x_plane, y_plane) = click_targets(plane);
        Self {
            plane,
            vertical: views[x_plane].slice_index(),
            horizontal: views[y_plane].slice_index(),
        }
    }
}

/// Keeps the three views pointing at one `(z, y, x)` voxel.
#[derive(Debug, Default)]
pub struct CursorController {
    inspector_active: bool,
    crosshairs: Option<[Crosshair; 3]>,
}

impl CursorController {
    pub fn activate(&mut self) {
        self.inspector_active = true;
    }

    pub fn deactivate(&mut self) {
        self.inspector_active = false;
        self.crosshairs = None;
    }

    pub fn is_active(&self) -> bool {
        self.inspector_active
    }

    /// Handle a click at `(x, y)` in `plane`'s data coordinates.
    ///
    /// Returns `Ok(false)` without touching any view while the inspector is
    /// off.
    pub fn on_click(
        &mut self,
        views: &mut Views,
        plane: Plane,
        x: f64,
        y: f64,
    ) -> Result<bool, ViewerError> {
        if !self.inspector_active {
            return Ok(false);
        }
        let (x_plane, y_plane) = click_targets(plane);
        let x_index = coordinate_to_index(x, views[x_plane].dimension(), "x")?;
        let y_index = coordinate_to_index(y, views[y_plane].dimension(), "y")?;

        views[x_plane].set_slice_index(x_index);
        views[y_plane].set_slice_index(y_index);
        debug!(%plane, x_index, y_index, cursor = ?views.cursor(), "cursor moved");

        self.refresh(views);
        Ok(true)
    }

    /// Recompute line geometry from the current indices, if the inspector is
    /// active.
    pub fn refresh(&mut self, views: &Views) {
        if self.inspector_active {
            self.crosshairs = Some(Plane::ALL.map(|plane| Crosshair::for_plane(plane, views)));
        }
    }

    pub fn crosshair(&self, plane: Plane) -> Option<Crosshair> {
        self.crosshairs.map(|lines| lines[plane.axis()])
    }

    pub fn crosshairs(&self) -> Option<[Crosshair; 3]> {
        self.crosshairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Volume;
    use ndarray::Array3;

    fn views(shape: (usize, usize, usize)) -> Views {
        Views::new(&Volume::new(Array3::zeros(shape)).unwrap())
    }

    #[test]
    fn clicks_are_ignored_until_inspector_is_active() {
        let mut views = views((30, 40, 50));
        let mut cursor = CursorController::default();
        assert!(!cursor.is_active());
        assert!(!cursor.on_click(&mut views, Plane::Axial, 10.0, 20.0).unwrap());
        assert_eq!(views.cursor(), (15, 20, 25));
        assert!(cursor.crosshairs().is_none());
    }

    #[test]
    fn axial_click_moves_sagittal_and_coronal() {
        let mut views = views((30, 40, 50));
        let mut cursor = CursorController::default();
        cursor.activate();
        assert!(cursor.on_click(&mut views, Plane::Axial, 10.0, 20.0).unwrap());
        assert_eq!(views[Plane::Sagittal].slice_index(), 10);
        assert_eq!(views[Plane::Coronal].slice_index(), 20);
        assert_eq!(views[Plane::Axial].slice_index(), 15);
    }

    #[test]
    fn clicks_encoding_the_same_voxel_agree() {
        let mut views = views((30, 40, 50));
        let mut cursor = CursorController::default();
        cursor.activate();
        cursor.on_click(&mut views, Plane::Coronal, 10.0, 7.0).unwrap();
        assert_eq!(views.cursor(), (7, 20, 10));
        cursor.on_click(&mut views, Plane::Sagittal, 20.0, 7.0).unwrap();
        assert_eq!(views.cursor(), (7, 20, 10));
        cursor.on_click(&mut views, Plane::Axial, 10.0, 20.0).unwrap();
        assert_eq!(views.cursor(), (7, 20, 10));
    }

    #[test]
    fn clicks_clamp_to_bounds() {
        let mut views = views((30, 40, 50));
        let mut cursor = CursorController::default();
        cursor.activate();
        cursor.on_click(&mut views, Plane::Sagittal, 400.0, -3.0).unwrap();
        assert_eq!(views[Plane::Coronal].slice_index(), 39);
        assert_eq!(views[Plane::Axial].slice_index(), 0);
    }

    #[test]
    fn non_finite_click_changes_nothing() {
        let mut views = views((30, 40, 50));
        let mut cursor = CursorController::default();
        cursor.activate();
        assert!(cursor.on_click(&mut views, Plane::Axial, 3.0, f64::NAN).is_err());
        assert_eq!(views.cursor(), (15, 20, 25));
    }

    #[test]
    fn crosshairs_use_the_other_views_indices() {
        let mut views = views((30, 40, 50));
        let mut cursor = CursorController::default();
        cursor.activate();
        cursor.on_click(&mut views, Plane::Axial, 10.0, 20.0).unwrap();
        let (z, y, x) = views.cursor();
        assert_eq!(
            cursor.crosshair(Plane::Axial),
            Some(Crosshair { plane: Plane::Axial, vertical: x, horizontal: y })
        );
        assert_eq!(
            cursor.crosshair(Plane::Coronal),
            Some(Crosshair { plane: Plane::Coronal, vertical: x, horizontal: z })
        );
        assert_eq!(
            cursor.crosshair(Plane::Sagittal),
            Some(Crosshair { plane: Plane::Sagittal, vertical: y, horizontal: z })
        );

        cursor.deactivate();
        assert!(!cursor.is_active());
        assert!(cursor.crosshairs().is_none());
    }
}
