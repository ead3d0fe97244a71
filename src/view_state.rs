use std::ops::{Index, IndexMut, RangeInclusive};

use image::GrayImage;

use crate::{
    enums::{Plane, ZoomDirection},
    error::ViewerError,
    slice::SliceExtractor,
    volume::Volume,
    windowing::Windowing,
};

pub const BRIGHTNESS_RANGE: RangeInclusive<i32> = -100..=100;
pub const CONTRAST_RANGE: RangeInclusive<f32> = 0.5..=2.0;

/// Display limits of a view in data coordinates.
///
/// `x` is `(left, right)` and `y` is `(bottom, top)`. Image views start with
/// `y` inverted, i.e. bottom is the larger value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRect {
    x: (f64, f64),
    y: (f64, f64),
}

impl ZoomRect {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Result<Self, ViewerError> {
        let finite = [x.0, x.1, y.0, y.1].iter().all(|v| v.is_finite());
        let width = x.1 - x.0;
        let height = y.1 - y.0;
        if !finite || width == 0.0 || height == 0.0 || !width.is_finite() || !height.is_finite() {
            return Err(ViewerError::DegenerateZoom);
        }
        Ok(Self { x, y })
    }

    /// Limits covering a whole `rows x cols` slice, pixel centres on integers.
    pub fn full_extent(rows: usize, cols: usize) -> Self {
        Self {
            x: (-0.5, cols as f64 - 0.5),
            y: (rows as f64 - 0.5, -0.5),
        }
    }

    pub fn x(&self) -> (f64, f64) {
        self.x
    }

    pub fn y(&self) -> (f64, f64) {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.x.1 - self.x.0
    }

    pub fn height(&self) -> f64 {
        self.y.1 - self.y.0
    }

    /// Rescale both extents around `(x, y)`, which keeps its relative
    /// position in the rectangle.
    pub fn scaled_about(&self, x: f64, y: f64, factor: f64) -> Result<Self, ViewerError> {
        Self::new(
            (x - (x - self.x.0) * factor, x + (self.x.1 - x) * factor),
            (y - (y - self.y.0) * factor, y + (self.y.1 - y) * factor),
        )
    }
}

/// Display state of one plane.
#[derive(Debug, Clone)]
pub struct ViewState {
    plane: Plane,
    dimension: usize,
    slice_shape: (usize, usize),
    slice_index: usize,
    brightness: i32,
    contrast: f32,
    visible: bool,
    zoom: ZoomRect,
    dirty: bool,
}

impl ViewState {
    /// Fresh state for `plane`: midpoint slice, neutral window, full extent.
    pub fn new(plane: Plane, volume: &Volume) -> Self {
        let dimension = volume.dimension(plane);
        let slice_shape = volume.slice_shape(plane);
        Self {
            plane,
            dimension,
            slice_shape,
            slice_index: dimension / 2,
            brightness: 0,
            contrast: 1.0,
            visible: true,
            zoom: ZoomRect::full_extent(slice_shape.0, slice_shape.1),
            dirty: true,
        }
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn slice_index(&self) -> usize {
        self.slice_index
    }

    pub fn brightness(&self) -> i32 {
        self.brightness
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn zoom(&self) -> ZoomRect {
        self.zoom
    }

    /// Panel caption, e.g. `"Axial - Slice 50"`.
    pub fn title(&self) -> String {
        format!("{} - Slice {}", self.plane, self.slice_index)
    }

    /// Clamps to the last slice.
    pub fn set_slice_index(&mut self, index: usize) {
        self.slice_index = index.min(self.dimension - 1);
        self.dirty = true;
    }

    pub fn set_brightness(&mut self, brightness: i32) {
        self.brightness = brightness.clamp(*BRIGHTNESS_RANGE.start(), *BRIGHTNESS_RANGE.end());
        self.dirty = true;
    }

    pub fn set_contrast(&mut self, contrast: f32) -> Result<(), ViewerError> {
        if !contrast.is_finite() {
            return Err(ViewerError::InvalidParameter {
                name: "contrast",
                value: contrast as f64,
            });
        }
        self.contrast = contrast.clamp(*CONTRAST_RANGE.start(), *CONTRAST_RANGE.end());
        self.dirty = true;
        Ok(())
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.dirty = true;
    }

    pub fn set_zoom(&mut self, zoom: ZoomRect) {
        self.zoom = zoom;
        self.dirty = true;
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(ZoomRect::full_extent(self.slice_shape.0, self.slice_shape.1));
    }

    /// Scroll-wheel zoom centred on the pointer at `(x, y)`.
    ///
    /// Zooming out is not bounded by the slice extent.
    pub fn zoom_at(
        &mut self,
        x: f64,
        y: f64,
        direction: ZoomDirection,
        step: f64,
    ) -> Result<(), ViewerError> {
        let factor = match direction {
            ZoomDirection::In => 1.0 - step,
            ZoomDirection::Out => 1.0 + step,
        };
        let zoom = self.zoom.scaled_about(x, y, factor)?;
        self.set_zoom(zoom);
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the view changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Request a redraw without a state change, e.g. when crosshairs move.
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Windowed, vertically flipped image of the current slice.
    pub fn current_image(&self, volume: &Volume) -> Result<GrayImage, ViewerError> {
        let slice = SliceExtractor::extract(volume, self.plane, self.slice_index)?;
        let windowed = Windowing::apply(slice, self.brightness, self.contrast);
        let flipped = SliceExtractor::flip_vertical(windowed.view());
        Ok(Windowing::to_image(flipped.view()))
    }
}

/// Convert a display coordinate into an index in `0..dimension`.
///
/// Fractions are floored and out-of-range values clamp to the nearest end.
pub(crate) fn coordinate_to_index(
    value: f64,
    dimension: usize,
    name: &'static str,
) -> Result<usize, ViewerError> {
    if !value.is_finite() {
        return Err(ViewerError::InvalidParameter { name, value });
    }
    let last = dimension.saturating_sub(1);
    Ok((value.floor().max(0.0) as usize).min(last))
}

/// The three view states, addressable by [`Plane`].
#[derive(Debug, Clone)]
pub struct Views([ViewState; 3]);

impl Views {
    pub fn new(volume: &Volume) -> Self {
        Self(Plane::ALL.map(|plane| ViewState::new(plane, volume)))
    }

    /// The shared cursor `(z, y, x)`.
    pub fn cursor(&self) -> (usize, usize, usize) {
        (
            self[Plane::Axial].slice_index,
            self[Plane::Coronal].slice_index,
            self[Plane::Sagittal].slice_index,
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewState> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ViewState> {
        self.0.iter_mut()
    }

    /// Planes of the views changed since the last call; clears their flags.
    pub fn take_dirty(&mut self) -> Vec<Plane> {
        self.iter_mut()
            .filter_map(|view| view.take_dirty().then_some(view.plane))
            .collect()
    }
}

impl Index<Plane> for Views {
    type Output = ViewState;

    fn index(&self, plane: Plane) -> &ViewState {
        &self.0[plane.axis()]
    }
}

impl IndexMut<Plane> for Views {
    fn index_mut(&mut self, plane: Plane) -> &mut ViewState {
        &mut self.0[plane.axis()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn volume(shape: (usize, usize, usize)) -> Volume {
        Volume::new(Array3::from_shape_fn(shape, |(z, y, x)| (z + y + x) as f32)).unwrap()
    }

    #[test]
    fn new_views_start_at_midpoints() {
        let views = Views::new(&volume((100, 256, 255)));
        assert_eq!(views.cursor(), (50, 128, 127));
        for view in views.iter() {
            assert_eq!(view.brightness(), 0);
            assert_eq!(view.contrast(), 1.0);
            assert!(view.visible());
        }
        let axial = &views[Plane::Axial];
        assert_eq!(axial.zoom(), ZoomRect::full_extent(256, 255));
    }

    #[test]
    fn setters_clamp_to_ranges() {
        let mut view = ViewState::new(Plane::Coronal, &volume((4, 6, 8)));
        view.set_slice_index(99);
        assert_eq!(view.slice_index(), 5);
        view.set_brightness(-300);
        assert_eq!(view.brightness(), -100);
        view.set_brightness(150);
        assert_eq!(view.brightness(), 100);
        view.set_contrast(0.1).unwrap();
        assert_eq!(view.contrast(), 0.5);
        view.set_contrast(7.0).unwrap();
        assert_eq!(view.contrast(), 2.0);
    }

    #[test]
    fn non_finite_contrast_is_rejected() {
        let mut view = ViewState::new(Plane::Axial, &volume((4, 6, 8)));
        assert!(view.set_contrast(f32::NAN).is_err());
        assert_eq!(view.contrast(), 1.0);
    }

    #[test]
    fn mutators_mark_dirty() {
        let mut view = ViewState::new(Plane::Axial, &volume((4, 6, 8)));
        assert!(view.take_dirty());
        assert!(!view.take_dirty());
        view.set_visible(false);
        assert!(view.take_dirty());
        assert!(!view.visible());
    }

    #[test]
    fn views_report_only_changed_planes() {
        let mut views = Views::new(&volume((4, 6, 8)));
        assert_eq!(views.take_dirty(), Plane::ALL.to_vec());
        assert!(views.take_dirty().is_empty());

        views[Plane::Sagittal].set_brightness(20);
        views[Plane::Axial].reset_zoom();
        assert_eq!(views.take_dirty(), vec![Plane::Axial, Plane::Sagittal]);
        assert!(!views[Plane::Axial].is_dirty());
    }

    #[test]
    fn zoom_keeps_pointer_fixed() {
        let mut view = ViewState::new(Plane::Axial, &volume((4, 10, 20)));
        let before = view.zoom();
        let (px, py) = (5.0, 3.0);
        let rel_x = (px - before.x().0) / before.width();
        let rel_y = (py - before.y().0) / before.height();

        view.zoom_at(px, py, ZoomDirection::In, 0.1).unwrap();
        let after = view.zoom();
        assert!((after.width() - before.width() * 0.9).abs() < 1e-9);
        assert!((after.height() - before.height() * 0.9).abs() < 1e-9);
        assert!(((px - after.x().0) / after.width() - rel_x).abs() < 1e-9);
        assert!(((py - after.y().0) / after.height() - rel_y).abs() < 1e-9);

        view.zoom_at(px, py, ZoomDirection::Out, 0.1).unwrap();
        assert!((view.zoom().width() - before.width() * 0.9 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn zoom_out_is_unbounded() {
        let mut view = ViewState::new(Plane::Sagittal, &volume((4, 6, 8)));
        for _ in 0..50 {
            view.zoom_at(1.0, 1.0, ZoomDirection::Out, 0.1).unwrap();
        }
        assert!(view.zoom().width() > 6.0 * 100.0);
    }

    #[test]
    fn degenerate_rects_are_rejected() {
        assert!(ZoomRect::new((1.0, 1.0), (0.0, 5.0)).is_err());
        assert!(ZoomRect::new((0.0, 1.0), (f64::NAN, 5.0)).is_err());
        assert!(ZoomRect::new((0.0, 1.0), (5.0, 0.0)).is_ok());
    }

    #[test]
    fn non_finite_pointer_leaves_zoom_untouched() {
        let mut view = ViewState::new(Plane::Axial, &volume((4, 6, 8)));
        let before = view.zoom();
        assert!(view.zoom_at(f64::INFINITY, 0.0, ZoomDirection::In, 0.1).is_err());
        assert_eq!(view.zoom(), before);
    }

    #[test]
    fn current_image_is_flipped_and_windowed() {
        let volume = volume((3, 4, 5));
        let mut view = ViewState::new(Plane::Axial, &volume);
        view.set_slice_index(2);
        view.set_brightness(10);
        let image = view.current_image(&volume).unwrap();
        assert_eq!(image.dimensions(), (5, 4));
        // top image row is the last array row: z=2, y=3
        assert_eq!(image.get_pixel(0, 0).0, [2 + 3 + 10]);
        assert_eq!(image.get_pixel(4, 3).0, [2 + 4 + 10]);
    }

    #[test]
    fn coordinates_floor_and_clamp() {
        assert_eq!(coordinate_to_index(3.7, 10, "x").unwrap(), 3);
        assert_eq!(coordinate_to_index(-2.0, 10, "x").unwrap(), 0);
        assert_eq!(coordinate_to_index(42.0, 10, "x").unwrap(), 9);
        assert!(coordinate_to_index(f64::NAN, 10, "x").is_err());
    }

    #[test]
    fn title_names_plane_and_slice() {
        let view = ViewState::new(Plane::Sagittal, &volume((4, 6, 8)));
        assert_eq!(view.title(), "Sagittal - Slice 4");
    }
}
