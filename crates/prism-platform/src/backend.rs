//! The window backend interface the session manager consumes.

use crate::event::NativeEvent;
use crate::{Result, WindowDescriptor};
use prism_core::Extent;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::sync::Arc;

/// Raw native handles for attaching a render surface.
#[derive(Debug, Clone, Copy)]
pub struct RawHandles {
    pub display: RawDisplayHandle,
    pub window: RawWindowHandle,
}

// The raw handles are opaque identifiers into the windowing system; moving
// them between threads is exactly what surface creation needs. The native
// window itself stays owned by its event thread.
unsafe impl Send for RawHandles {}
unsafe impl Sync for RawHandles {}

/// Blocking native event retrieval for one window.
///
/// An event pump stays on the thread that opened the window; it is
/// deliberately not `Send`.
pub trait EventPump {
    /// Block indefinitely until the next native event.
    ///
    /// Reports [`NativeEvent::SourceClosed`] when the event source is gone;
    /// no further events follow it.
    fn wait_event(&mut self) -> NativeEvent;
}

/// Thread-safe control surface for one native window.
pub trait WindowControl: Send + Sync {
    /// Ask the backend to tear down the native window. The matching
    /// [`NativeEvent::Destroyed`] arrives on the event pump.
    fn request_destroy(&self);

    /// Set the window title.
    fn set_title(&self, title: &str);

    /// Set the window dimensions.
    fn set_dimensions(&self, extent: Extent);

    /// Switch between windowed, fullscreen, and docked-fullscreen modes.
    fn set_display_mode(&self, mode: crate::DisplayMode);

    /// Native handles for render surface attachment; `None` when the
    /// backend has no presentable handle (headless windows).
    fn raw_handles(&self) -> Option<RawHandles>;
}

/// A native platform window backend.
///
/// One implementation per platform, injected into the session manager at
/// construction time.
pub trait WindowBackend: Send + Sync {
    /// Create a native window on the calling thread.
    ///
    /// The returned pump must be driven from this same thread; the control
    /// handle may travel anywhere. The session manager calls this from the
    /// window's dedicated event thread.
    fn open(
        &self,
        desc: &WindowDescriptor,
    ) -> Result<(Box<dyn EventPump>, Arc<dyn WindowControl>)>;
}
