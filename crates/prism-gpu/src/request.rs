//! Capability request model.
//!
//! Immutable descriptions of what an application and a display session need
//! from the graphics stack. Requests are built once and then consumed, never
//! mutated, by the negotiation stages.

use ash::vk;

/// Per-application capability request.
///
/// Covers everything negotiated once per process: instance layers, instance
/// extensions, and validation.
#[derive(Debug, Clone)]
pub struct AppRequest {
    /// Application name reported to the driver.
    pub app_name: String,
    /// Required instance layer names.
    pub required_layers: Vec<String>,
    /// Required instance extension names, in addition to the per-platform
    /// surface extensions.
    pub required_extensions: Vec<String>,
    /// Enable validation layers.
    pub validation: bool,
}

impl Default for AppRequest {
    fn default() -> Self {
        Self {
            app_name: "Prism".to_string(),
            required_layers: Vec::new(),
            required_extensions: Vec::new(),
            validation: cfg!(debug_assertions),
        }
    }
}

impl AppRequest {
    /// Create a request with the given application name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    /// Require an instance layer.
    #[must_use]
    pub fn with_layer(mut self, name: impl Into<String>) -> Self {
        self.required_layers.push(name.into());
        self
    }

    /// Require an instance extension.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>) -> Self {
        self.required_extensions.push(name.into());
        self
    }

    /// Enable or disable validation layers.
    #[must_use]
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }
}

/// Per-display capability request.
///
/// Consumed by device picking, queue resolution, and swapchain negotiation
/// for one display session.
#[derive(Debug, Clone)]
pub struct DisplayRequest {
    /// No presentation: skip surface/swapchain negotiation entirely.
    pub headless: bool,
    /// Create one swapchain layer per eye.
    pub stereoscopic: bool,
    /// Required device extension names, in addition to the swapchain
    /// extension for presenting sessions.
    pub required_extensions: Vec<String>,
    /// Required queue capability flags. The enabled set passed to device
    /// creation is exactly this set, verified against the hardware.
    pub required_queue_flags: vk::QueueFlags,
    /// Required hardware feature names (see [`crate::features`]).
    pub required_features: Vec<String>,
}

impl Default for DisplayRequest {
    fn default() -> Self {
        Self {
            headless: false,
            stereoscopic: false,
            required_extensions: Vec::new(),
            required_queue_flags: vk::QueueFlags::GRAPHICS,
            required_features: Vec::new(),
        }
    }
}

impl DisplayRequest {
    /// Create a default presenting request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip presentation entirely.
    #[must_use]
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Request one swapchain layer per eye.
    #[must_use]
    pub fn with_stereoscopic(mut self, stereoscopic: bool) -> Self {
        self.stereoscopic = stereoscopic;
        self
    }

    /// Require a device extension.
    #[must_use]
    pub fn with_extension(mut self, name: impl Into<String>) -> Self {
        self.required_extensions.push(name.into());
        self
    }

    /// Require queue capability flags.
    #[must_use]
    pub fn with_queue_flags(mut self, flags: vk::QueueFlags) -> Self {
        self.required_queue_flags |= flags;
        self
    }

    /// Require a hardware feature by name.
    #[must_use]
    pub fn with_feature(mut self, name: impl Into<String>) -> Self {
        self.required_features.push(name.into());
        self
    }
}
