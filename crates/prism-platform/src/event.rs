//! Native events and the per-window user callback table.

use prism_core::WindowGeometry;

/// Events a backend reports to a window's event thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    /// The window contents need repainting.
    Expose,
    /// Geometry changed: moved, resized, or both.
    Configured(WindowGeometry),
    /// A window property or state changed.
    StateChanged,
    /// A client message arrived from the windowing system.
    ClientMessage,
    /// Keyboard focus entered the window.
    FocusGained,
    /// Keyboard focus left the window.
    FocusLost,
    /// The pointer entered the window.
    PointerEntered,
    /// The pointer left the window.
    PointerLeft,
    /// The user asked the window to close; the session decides what happens.
    CloseRequested,
    /// The native window no longer exists.
    Destroyed,
    /// The native event source disappeared; no further events will arrive.
    SourceClosed,
}

/// User callbacks invoked from a window's event thread.
///
/// Every slot is optional; the table is moved onto the event thread at
/// window creation and never shared.
#[derive(Default)]
pub struct WindowCallbacks {
    pub on_expose: Option<Box<dyn FnMut() + Send>>,
    pub on_configure: Option<Box<dyn FnMut(WindowGeometry) + Send>>,
    pub on_state_change: Option<Box<dyn FnMut() + Send>>,
    pub on_client_message: Option<Box<dyn FnMut() + Send>>,
    /// Called with `true` on focus gained, `false` on focus lost.
    pub on_focus: Option<Box<dyn FnMut(bool) + Send>>,
    /// Called with `true` on pointer enter, `false` on pointer leave.
    pub on_pointer: Option<Box<dyn FnMut(bool) + Send>>,
    pub on_close: Option<Box<dyn FnMut() + Send>>,
}

impl WindowCallbacks {
    /// An empty callback table.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_expose(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_expose = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_configure(mut self, f: impl FnMut(WindowGeometry) + Send + 'static) -> Self {
        self.on_configure = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_state_change(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_state_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_client_message(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_client_message = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_focus(mut self, f: impl FnMut(bool) + Send + 'static) -> Self {
        self.on_focus = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_pointer(mut self, f: impl FnMut(bool) + Send + 'static) -> Self {
        self.on_pointer = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_close(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }
}
