use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use mpr_viewer::{
    Crosshair, EventLoop, InputEvent, MprViewer, Plane, RenderSurface, ViewerConfig, ViewerHandle,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Headless driver for the MPR viewer core
#[derive(Parser, Debug)]
#[command(author, about, version)]
struct Args {
    /// Directory holding a DICOM series (.dcm files)
    #[arg(long, conflicts_with = "nifti", required_unless_present = "nifti")]
    dicom: Option<PathBuf>,

    /// NIfTI file (.nii or .nii.gz)
    #[arg(long)]
    nifti: Option<PathBuf>,

    /// JSON viewer configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Play the cine loop for this many frames before exporting
    #[arg(long, default_value_t = 0)]
    cine_ticks: u32,

    /// Plane to export (axial, coronal or sagittal); may be repeated
    #[arg(short, long)]
    export: Vec<String>,

    /// Directory for exported slices, overrides the configuration
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Logs what a UI would draw after each change.
struct LogSurface;

impl RenderSurface for LogSurface {
    fn on_state_changed(&mut self, viewer: &MprViewer, dirty: &[Plane]) {
        let Some(views) = viewer.views() else {
            return;
        };
        for &plane in dirty {
            let view = &views[plane];
            if !view.visible() {
                continue;
            }
            match viewer.crosshair(plane) {
                Some(lines) => debug!(
                    title = %view.title(),
                    vertical = lines.vertical,
                    vertical_rgb = ?Crosshair::VERTICAL_COLOR,
                    horizontal = lines.horizontal,
                    horizontal_rgb = ?Crosshair::HORIZONTAL_COLOR,
                    "redraw"
                ),
                None => debug!(title = %view.title(), "redraw"),
            }
        }
    }
}

fn send(handle: &ViewerHandle, event: InputEvent) {
    if let Err(err) = handle.send(event) {
        warn!(%err, "event loop already stopped");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_filter = format!("mpr_viewer={}", args.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    let mut config = match args.config.as_deref().map(ViewerConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(output_dir) = args.output_dir {
        config.export_dir = output_dir;
    }

    let period = config.cine_period();
    let mut viewer = MprViewer::new(config).with_surface(LogSurface);
    let loaded = match (&args.dicom, &args.nifti) {
        (Some(folder), _) => viewer.load_dicom_series(folder),
        (None, Some(file)) => viewer.load_nifti(file),
        (None, None) => unreachable!("clap requires one input"),
    };
    if let Err(err) = loaded {
        error!(%err, "could not load volume");
        return ExitCode::FAILURE;
    }

    if args.cine_ticks > 0 {
        let (handle, event_loop) = EventLoop::new(viewer);
        let ticks = args.cine_ticks;
        let driver = async move {
            send(&handle, InputEvent::CineToggled);
            tokio::time::sleep(period * ticks + period / 2).await;
            send(&handle, InputEvent::Shutdown);
        };
        let ((), returned) = tokio::join!(driver, event_loop.run());
        viewer = returned;
        info!(cursor = ?viewer.cursor_position(), "cine finished");
    }

    let mut failed = false;
    for plane in &args.export {
        match viewer.export_slice(plane, None) {
            Ok(path) => info!(plane, path = %path.display(), "exported"),
            Err(err) => {
                error!(plane, %err, "export failed");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
