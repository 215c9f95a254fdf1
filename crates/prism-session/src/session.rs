//! Per-window session state.

use parking_lot::{Condvar, Mutex};
use prism_core::WindowGeometry;
use prism_gpu::DisplaySession;
use prism_platform::{DisplayMode, Interaction, WindowControl};
use std::sync::Arc;

/// Identity of one window session, unique for the manager's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub(crate) u64);

/// Close state of a window session.
///
/// Transitions happen only under the registry lock, so no two threads can
/// both believe they own the transition out of `Alive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    /// Fully constructed, event thread running.
    Alive,
    /// The event thread observed a destroy condition itself and claimed the
    /// close.
    CloseRequested,
    /// An external caller decided the close; the event thread will observe
    /// the native destroy notification and run the protocol.
    InternallyClosed,
}

/// One live window: identity, geometry, modes, status, and graphics state.
///
/// Created by [`WindowManager::create_window`](crate::WindowManager::create_window);
/// geometry is mutated by the window's own event thread, status by the close
/// paths under the registry lock. The session object outlives its event
/// thread and is dropped after the reaper joins it.
pub struct WindowSession {
    pub(crate) id: WindowId,
    pub(crate) name: String,
    pub(crate) geometry: Mutex<WindowGeometry>,
    display_mode: Mutex<DisplayMode>,
    pub(crate) interaction: Interaction,
    /// Guarded by the registry lock: lock order is registry, then status.
    pub(crate) status: Mutex<WindowStatus>,
    pub(crate) control: Arc<dyn WindowControl>,
    pub(crate) display: Mutex<Option<DisplaySession>>,
    closed: Mutex<bool>,
    closed_signal: Condvar,
}

impl WindowSession {
    pub(crate) fn new(
        id: WindowId,
        name: String,
        geometry: WindowGeometry,
        display_mode: DisplayMode,
        interaction: Interaction,
        control: Arc<dyn WindowControl>,
        display: Option<DisplaySession>,
    ) -> Self {
        Self {
            id,
            name,
            geometry: Mutex::new(geometry),
            display_mode: Mutex::new(display_mode),
            interaction,
            status: Mutex::new(WindowStatus::Alive),
            control,
            display: Mutex::new(display),
            closed: Mutex::new(false),
            closed_signal: Condvar::new(),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> WindowGeometry {
        *self.geometry.lock()
    }

    /// The most recently requested display mode.
    pub fn display_mode(&self) -> DisplayMode {
        *self.display_mode.lock()
    }

    /// Switch display modes, recording the new mode as the session's
    /// current one.
    pub fn set_display_mode(&self, mode: DisplayMode) {
        self.control.set_display_mode(mode);
        *self.display_mode.lock() = mode;
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn status(&self) -> WindowStatus {
        *self.status.lock()
    }

    /// The thread-safe native window control surface.
    pub fn control(&self) -> &Arc<dyn WindowControl> {
        &self.control
    }

    /// Run `f` against the session's display state, if graphics attached.
    pub fn with_display<R>(&self, f: impl FnOnce(&mut DisplaySession) -> R) -> Option<R> {
        self.display.lock().as_mut().map(f)
    }

    /// Mark the close protocol complete and wake every waiter.
    pub(crate) fn mark_closed(&self) {
        let mut closed = self.closed.lock();
        *closed = true;
        self.closed_signal.notify_all();
    }

    /// Block until the close protocol has completed for this window.
    pub fn wait_closed(&self) {
        let mut closed = self.closed.lock();
        while !*closed {
            self.closed_signal.wait(&mut closed);
        }
    }
}
