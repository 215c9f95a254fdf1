//! Graphics capability negotiation engine for the Prism platform layer.
//!
//! This crate provides:
//! - Vulkan instance creation and the shared GPU context
//! - Device enumeration, scoring, and selection against capability requests
//! - Queue family resolution with shared-index deduplication
//! - Surface/swapchain negotiation and the presentable image chain
//! - Logical device and fixed-function pipeline construction

pub mod device;
pub mod display;
pub mod error;
pub mod features;
pub mod instance;
pub mod pipeline;
pub mod queue;
pub mod request;
pub mod shader;
pub mod swapchain;

pub use device::{
    enumerate_candidates, evaluate_candidate, pick_from_profiles, score_device, select_best,
    ChosenDevice, DeviceCandidate, DeviceProfile, DISCRETE_GPU_SCORE, DISQUALIFIED,
};
pub use display::DisplaySession;
pub use error::{GpuError, Result};
pub use features::{enable_features, missing_features};
pub use instance::GpuInstance;
pub use pipeline::RenderPipeline;
pub use queue::{
    dedup_families, find_queue_family, resolve_queue_assignments, QueueFamilyAssignment, QueueKind,
};
pub use request::{AppRequest, DisplayRequest};
pub use shader::load_spirv;
pub use swapchain::{
    clamp_extent, image_count, select_present_mode, select_surface_format, Swapchain,
    SwapchainParams, SwapchainSupport,
};
