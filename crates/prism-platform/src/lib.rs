//! Native window backend abstraction for the Prism platform layer.
//!
//! The session manager consumes one [`WindowBackend`] implementation,
//! injected at construction time rather than selected by compile-time
//! branching. Two implementations ship here: a winit-backed one for real
//! displays and a channel-driven headless one for input-only sessions and
//! tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod event;
pub mod headless;
pub mod winit_backend;

pub use backend::{EventPump, RawHandles, WindowBackend, WindowControl};
pub use event::{NativeEvent, WindowCallbacks};
pub use headless::HeadlessBackend;
pub use winit_backend::WinitBackend;

use prism_core::WindowGeometry;

/// Platform backend errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// How a window occupies the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    #[default]
    Windowed,
    Fullscreen,
    DockedFullscreen,
}

/// Whether a window carries graphics output or only receives input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interaction {
    InputOnly,
    #[default]
    InputOutput,
}

/// Everything a backend needs to create one native window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub title: String,
    pub geometry: WindowGeometry,
    pub display_mode: DisplayMode,
    pub interaction: Interaction,
}

impl Default for WindowDescriptor {
    fn default() -> Self {
        Self {
            title: "Prism".to_string(),
            geometry: WindowGeometry::default(),
            display_mode: DisplayMode::Windowed,
            interaction: Interaction::InputOutput,
        }
    }
}

impl WindowDescriptor {
    /// Create a descriptor with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the initial geometry.
    #[must_use]
    pub fn with_geometry(mut self, geometry: WindowGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set the display mode.
    #[must_use]
    pub fn with_display_mode(mut self, mode: DisplayMode) -> Self {
        self.display_mode = mode;
        self
    }

    /// Set the interaction mode.
    #[must_use]
    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.interaction = interaction;
        self
    }
}
