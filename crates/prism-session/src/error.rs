//! Session error types.

use thiserror::Error;

/// Window session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The window is not in the registry; it never existed or has already
    /// completed the close protocol.
    #[error("unknown window")]
    UnknownWindow,

    /// The backend could not create or operate the native window.
    #[error("platform error: {0}")]
    Platform(#[from] prism_platform::PlatformError),

    /// Graphics negotiation failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] prism_gpu::GpuError),

    /// An input+output window was requested without a GPU instance.
    #[error("graphics requested but no GPU instance was provided")]
    GraphicsUnavailable,

    /// The window's native handle cannot back a render surface.
    #[error("backend exposes no native handles for surface creation")]
    NoSurfaceHandles,

    /// The window's event thread ended before creation completed.
    #[error("window event thread ended during creation")]
    CreationAborted,
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, SessionError>;
