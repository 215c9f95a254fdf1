//! Prism Demo Viewer
//!
//! Opens one presenting window, negotiates a device and swapchain for it,
//! and runs until the window is closed.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p prism-viewer -- [OPTIONS]
//! ```
//!
//! ## Options
//! - `--width <N>`: Initial window width (default: 1280)
//! - `--height <N>`: Initial window height (default: 720)
//! - `--stereo`: Request a stereoscopic swapchain
//! - `--vert <PATH>`: Vertex shader binary (default: shaders/triangle.vert.spv)
//! - `--frag <PATH>`: Fragment shader binary (default: shaders/triangle.frag.spv)
//! - `-h, --help`: Print help message
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

use std::path::PathBuf;
use std::sync::Arc;

use prism_core::{Extent, WindowGeometry};
use prism_gpu::{AppRequest, DisplayRequest, GpuInstance};
use prism_platform::{WindowBackend, WindowCallbacks, WindowDescriptor, WinitBackend};
use prism_session::{ManagerConfig, WindowManager};
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Options {
    width: u32,
    height: u32,
    stereo: bool,
    vert: PathBuf,
    frag: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            stereo: false,
            vert: PathBuf::from("shaders/triangle.vert.spv"),
            frag: PathBuf::from("shaders/triangle.frag.spv"),
        }
    }
}

fn parse_options() -> anyhow::Result<Options> {
    let mut options = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--width" => {
                let value = args.next().ok_or_else(|| anyhow::anyhow!("--width needs a value"))?;
                options.width = value.parse()?;
            }
            "--height" => {
                let value = args.next().ok_or_else(|| anyhow::anyhow!("--height needs a value"))?;
                options.height = value.parse()?;
            }
            "--stereo" => options.stereo = true,
            "--vert" => {
                let value = args.next().ok_or_else(|| anyhow::anyhow!("--vert needs a value"))?;
                options.vert = PathBuf::from(value);
            }
            "--frag" => {
                let value = args.next().ok_or_else(|| anyhow::anyhow!("--frag needs a value"))?;
                options.frag = PathBuf::from(value);
            }
            other => anyhow::bail!("unknown option: {other}"),
        }
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "-h" || arg == "--help") {
        print_help();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = parse_options()?;

    let gpu = Arc::new(GpuInstance::new(&AppRequest::new("Prism Viewer"))?);
    let backend: Arc<dyn WindowBackend> = Arc::new(WinitBackend::new());

    let config = ManagerConfig::default()
        .with_shaders(options.vert, options.frag)
        .with_display_request(DisplayRequest::new().with_stereoscopic(options.stereo));
    let mut manager = WindowManager::new(backend, Some(gpu), config);

    let descriptor = WindowDescriptor::new("Prism Viewer").with_geometry(WindowGeometry {
        extent: Extent {
            width: options.width,
            height: options.height,
        },
        ..WindowGeometry::default()
    });
    let callbacks = WindowCallbacks::new()
        .on_configure(|geometry| {
            info!(
                width = geometry.extent.width,
                height = geometry.extent.height,
                "window configured"
            );
        })
        .on_close(|| info!("close requested"));

    let id = manager.create_window(&descriptor, callbacks)?;
    let session = manager
        .session(id)
        .ok_or_else(|| anyhow::anyhow!("window closed during startup"))?;
    info!(window = %session.name(), "viewer running; close the window to exit");

    session.wait_closed();
    manager.shutdown();
    Ok(())
}

fn print_help() {
    eprintln!(
        "Prism Demo Viewer

USAGE:
    cargo run -p prism-viewer -- [OPTIONS]

OPTIONS:
    --width <N>      Initial window width (default: 1280)
    --height <N>     Initial window height (default: 720)
    --stereo         Request a stereoscopic swapchain
    --vert <PATH>    Vertex shader binary (default: shaders/triangle.vert.spv)
    --frag <PATH>    Fragment shader binary (default: shaders/triangle.frag.spv)
    -h, --help       Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG         Set log level (e.g., info, debug, trace)"
    );
}
