use std::path::{Path, PathBuf};

use image::GrayImage;
use tracing::{debug, info, warn};

use crate::{
    cine::{CinePlayer, CineState},
    config::ViewerConfig,
    cursor::{Crosshair, CursorController},
    enums::{Colormap, ParameterKind, Plane, ZoomDirection},
    error::ViewerError,
    export::ImageRasterWriter,
    ports::{RasterWriter, RenderSurface, VolumeSource},
    slice::SliceExtractor,
    view_state::{CONTRAST_RANGE, ViewState, Views, ZoomRect, coordinate_to_index},
    volume::Volume,
    volume_loader::FileVolumeSource,
};

/// Discrete events the UI layer (or the cine timer) feeds into the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    LoadDicomSeries { folder: PathBuf },
    LoadNifti { file: PathBuf },
    SliderChanged { plane: Plane, kind: ParameterKind, value: f64 },
    VisibilityToggled { plane: Plane, visible: bool },
    Click { plane: Plane, x: f64, y: f64 },
    Scroll { plane: Plane, x: f64, y: f64, direction: ZoomDirection },
    CursorInspector { active: bool },
    CineToggled,
    CineTick { generation: u64 },
    ExportRequested { plane: String, path: Option<PathBuf> },
    Shutdown,
}

#[derive(Debug)]
struct Loaded {
    volume: Volume,
    views: Views,
}

/// Owns the volume, the three views, the cursor and the cine player, and
/// routes every UI operation to them.
pub struct MprViewer {
    config: ViewerConfig,
    state: Option<Loaded>,
    cursor: CursorController,
    cine: CinePlayer,
    source: Box<dyn VolumeSource>,
    writer: Box<dyn RasterWriter>,
    surface: Option<Box<dyn RenderSurface>>,
}

impl Default for MprViewer {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl MprViewer {
    /// Viewer reading from the file system and writing with the `image` crate.
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            cine: CinePlayer::new(config.cine_period()),
            source: Box::new(FileVolumeSource::new(config.sort_by)),
            config,
            state: None,
            cursor: CursorController::default(),
            writer: Box::new(ImageRasterWriter),
            surface: None,
        }
    }

    pub fn with_source(mut self, source: impl VolumeSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_writer(mut self, writer: impl RasterWriter + 'static) -> Self {
        self.writer = Box::new(writer);
        self
    }

    pub fn with_surface(mut self, surface: impl RenderSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn volume(&self) -> Option<&Volume> {
        self.state.as_ref().map(|loaded| &loaded.volume)
    }

    pub fn views(&self) -> Option<&Views> {
        self.state.as_ref().map(|loaded| &loaded.views)
    }

    pub fn view(&self, plane: Plane) -> Option<&ViewState> {
        self.views().map(|views| &views[plane])
    }

    /// The shared `(z, y, x)` cursor.
    pub fn cursor_position(&self) -> Option<(usize, usize, usize)> {
        self.views().map(Views::cursor)
    }

    pub fn cursor(&self) -> &CursorController {
        &self.cursor
    }

    pub fn crosshair(&self, plane: Plane) -> Option<Crosshair> {
        self.cursor.crosshair(plane)
    }

    pub fn cine(&self) -> &CinePlayer {
        &self.cine
    }

    pub fn current_image(&self, plane: Plane) -> Result<GrayImage, ViewerError> {
        let loaded = self.loaded()?;
        loaded.views[plane].current_image(&loaded.volume)
    }

    /// Windowed images of every visible view, in axial, coronal, sagittal
    /// order.
    pub fn visible_images(&self) -> Result<Vec<(Plane, GrayImage)>, ViewerError> {
        let loaded = self.loaded()?;
        loaded
            .views
            .iter()
            .filter(|view| view.visible())
            .map(|view| Ok((view.plane(), view.current_image(&loaded.volume)?)))
            .collect()
    }

    /// Install a new volume, resetting all views. Playback is stopped.
    pub fn load_volume(&mut self, volume: Volume) {
        self.cine.stop();
        let views = Views::new(&volume);
        info!(shape = ?volume.dim(), cursor = ?views.cursor(), "volume loaded");
        self.cursor.refresh(&views);
        self.state = Some(Loaded { volume, views });
        self.notify();
    }

    /// On failure the current volume and views are kept.
    pub fn load_dicom_series(&mut self, folder: &Path) -> Result<(), ViewerError> {
        let volume = self
            .source
            .load_dicom_series(folder)
            .inspect_err(|err| warn!(folder = %folder.display(), %err, "DICOM load failed"))?;
        self.load_volume(volume);
        Ok(())
    }

    /// On failure the current volume and views are kept.
    pub fn load_nifti(&mut self, file: &Path) -> Result<(), ViewerError> {
        let volume = self
            .source
            .load_nifti(file)
            .inspect_err(|err| warn!(file = %file.display(), %err, "NIfTI load failed"))?;
        self.load_volume(volume);
        Ok(())
    }

    /// Single entry point for the slice, brightness and contrast sliders of
    /// every view. Finite values are clamped into range.
    pub fn set_view_parameter(
        &mut self,
        plane: Plane,
        kind: ParameterKind,
        value: f64,
    ) -> Result<(), ViewerError> {
        let loaded = self.state.as_mut().ok_or(ViewerError::NoVolume)?;
        let view = &mut loaded.views[plane];
        match kind {
            ParameterKind::Slice => {
                let index = coordinate_to_index(value, view.dimension(), "slice")?;
                view.set_slice_index(index);
                sync_crosshairs(&mut self.cursor, &mut loaded.views);
            }
            ParameterKind::Brightness => {
                if !value.is_finite() {
                    return Err(ViewerError::InvalidParameter { name: "brightness", value });
                }
                view.set_brightness(value.trunc() as i32);
            }
            ParameterKind::Contrast => {
                if !value.is_finite() {
                    return Err(ViewerError::InvalidParameter { name: "contrast", value });
                }
                let (low, high) = (*CONTRAST_RANGE.start(), *CONTRAST_RANGE.end());
                view.set_contrast(value.clamp(low.into(), high.into()) as f32)?;
            }
        }
        debug!(%plane, ?kind, value, "view parameter changed");
        self.notify();
        Ok(())
    }

    pub fn set_visible(&mut self, plane: Plane, visible: bool) -> Result<(), ViewerError> {
        self.loaded_mut()?.views[plane].set_visible(visible);
        self.notify();
        Ok(())
    }

    pub fn set_zoom(&mut self, plane: Plane, zoom: ZoomRect) -> Result<(), ViewerError> {
        self.loaded_mut()?.views[plane].set_zoom(zoom);
        self.notify();
        Ok(())
    }

    pub fn reset_zoom(&mut self, plane: Plane) -> Result<(), ViewerError> {
        self.loaded_mut()?.views[plane].reset_zoom();
        self.notify();
        Ok(())
    }

    /// Scroll-wheel zoom on one view around the pointer.
    pub fn scroll(
        &mut self,
        plane: Plane,
        x: f64,
        y: f64,
        direction: ZoomDirection,
    ) -> Result<(), ViewerError> {
        let step = self.config.zoom_step;
        self.loaded_mut()?.views[plane].zoom_at(x, y, direction, step)?;
        self.notify();
        Ok(())
    }

    pub fn activate_cursor_inspector(&mut self) {
        self.cursor.activate();
        if let Some(loaded) = self.state.as_mut() {
            sync_crosshairs(&mut self.cursor, &mut loaded.views);
        }
        self.notify();
    }

    pub fn deactivate_cursor_inspector(&mut self) {
        if !self.cursor.is_active() {
            return;
        }
        self.cursor.deactivate();
        if let Some(loaded) = self.state.as_mut() {
            loaded.views.iter_mut().for_each(ViewState::mark_dirty);
        }
        self.notify();
    }

    /// Move the other two views to the clicked position. Ignored unless the
    /// cursor inspector is active.
    pub fn click(&mut self, plane: Plane, x: f64, y: f64) -> Result<(), ViewerError> {
        let Some(loaded) = self.state.as_mut() else {
            return Err(ViewerError::NoVolume);
        };
        if self.cursor.on_click(&mut loaded.views, plane, x, y)? {
            sync_crosshairs(&mut self.cursor, &mut loaded.views);
            self.notify();
        }
        Ok(())
    }

    /// Start playback if stopped, stop it if running.
    pub fn toggle_cine(&mut self) -> Result<CineState, ViewerError> {
        let Some(loaded) = self.state.as_ref() else {
            return Err(ViewerError::NoVolume);
        };
        let state = self.cine.toggle(&loaded.views);
        self.notify();
        Ok(state)
    }

    pub fn stop_cine(&mut self) {
        self.cine.stop();
    }

    /// Advance playback by one frame. Stale or idle ticks are ignored.
    pub fn cine_tick(&mut self, generation: u64) {
        let Some(loaded) = self.state.as_mut() else {
            return;
        };
        if self.cine.tick(generation, &mut loaded.views).is_some() {
            sync_crosshairs(&mut self.cursor, &mut loaded.views);
            self.notify();
        }
    }

    /// Write the raw (unwindowed) current slice of `plane` as an image titled
    /// `"{Plane}_Slice_{index}"`. Without `path` the file goes to the
    /// configured export directory. Returns the written path.
    pub fn export_slice(&mut self, plane: &str, path: Option<&Path>) -> Result<PathBuf, ViewerError> {
        let plane: Plane = plane
            .parse()
            .inspect_err(|err| warn!(%err, "export rejected"))?;
        let loaded = self.state.as_ref().ok_or(ViewerError::NoVolume)?;
        let index = loaded.views[plane].slice_index();
        let slice = SliceExtractor::extract(&loaded.volume, plane, index)?;
        let title = format!("{plane}_Slice_{index}");
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.export_path(&title));

        self.writer
            .write_image(&path, &title, slice, Colormap::Grayscale)
            .inspect_err(|err| warn!(%title, %err, "export failed"))?;
        Ok(path)
    }

    /// Dispatch one input event.
    pub fn handle(&mut self, event: InputEvent) -> Result<(), ViewerError> {
        match event {
            InputEvent::LoadDicomSeries { folder } => self.load_dicom_series(&folder),
            InputEvent::LoadNifti { file } => self.load_nifti(&file),
            InputEvent::SliderChanged { plane, kind, value } => {
                self.set_view_parameter(plane, kind, value)
            }
            InputEvent::VisibilityToggled { plane, visible } => self.set_visible(plane, visible),
            InputEvent::Click { plane, x, y } => self.click(plane, x, y),
            InputEvent::Scroll { plane, x, y, direction } => self.scroll(plane, x, y, direction),
            InputEvent::CursorInspector { active: true } => {
                self.activate_cursor_inspector();
                Ok(())
            }
            InputEvent::CursorInspector { active: false } => {
                self.deactivate_cursor_inspector();
                Ok(())
            }
            InputEvent::CineToggled => self.toggle_cine().map(|_| ()),
            InputEvent::CineTick { generation } => {
                self.cine_tick(generation);
                Ok(())
            }
            InputEvent::ExportRequested { plane, path } => {
                self.export_slice(&plane, path.as_deref()).map(|_| ())
            }
            InputEvent::Shutdown => Ok(()),
        }
    }

    fn loaded(&self) -> Result<&Loaded, ViewerError> {
        self.state.as_ref().ok_or(ViewerError::NoVolume)
    }

    fn loaded_mut(&mut self) -> Result<&mut Loaded, ViewerError> {
        self.state.as_mut().ok_or(ViewerError::NoVolume)
    }

    // Without a surface the flags stay set for whoever attaches next.
    fn notify(&mut self) {
        let Some(mut surface) = self.surface.take() else {
            return;
        };
        let dirty = self
            .state
            .as_mut()
            .map(|loaded| loaded.views.take_dirty())
            .unwrap_or_default();
        surface.on_state_changed(self, &dirty);
        self.surface = Some(surface);
    }
}

/// Recompute crosshairs after an index change. Every view shows lines, so all
/// of them need a redraw.
fn sync_crosshairs(cursor: &mut CursorController, views: &mut Views) {
    if cursor.is_active() {
        cursor.refresh(views);
        views.iter_mut().for_each(ViewState::mark_dirty);
    }
}
