//! GPU error types.

use ash::vk;
use std::path::PathBuf;
use thiserror::Error;

/// GPU-related errors.
///
/// Negotiation failures are reported as typed values so the caller can retry
/// with relaxed requirements or surface the failure upward. The only hard
/// abort left in this crate is a registry-corruption style logic error, and
/// that lives in the session layer, not here.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// A required layer, extension, feature, or queue capability is absent.
    /// Lists every missing requirement, not just the first.
    #[error("configuration unsatisfiable; missing requirements: {}", missing.join(", "))]
    Unsatisfiable {
        /// Names of all missing requirements.
        missing: Vec<String>,
    },

    /// Every enumerated device was disqualified, or none exist.
    #[error("no compatible device found")]
    NoCompatibleDevice,

    /// The chosen device is not a member of the last-enumerated compatible set.
    #[error("device handle is stale: not in the last-enumerated compatible set")]
    StaleDevice,

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Swapchain creation failed.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreation(String),

    /// Logical device creation failed.
    #[error("Device creation failed: {0}")]
    DeviceCreation(String),

    /// Shader binary could not be loaded.
    #[error("Failed to load shader binary {path}: {source}")]
    ShaderLoad {
        /// Path of the shader binary.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Pipeline creation failed.
    #[error("Pipeline creation failed: {0}")]
    PipelineCreation(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
