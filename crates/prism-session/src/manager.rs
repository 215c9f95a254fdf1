//! The window session manager.
//!
//! Owns the registry, spawns one event thread per window, attaches graphics
//! to presenting windows, and runs the coordinated close protocol. Every
//! event thread is joined exactly once by a dedicated reaper thread,
//! regardless of which side initiated the close.

use crate::error::{Result, SessionError};
use crate::registry::SessionRegistry;
use crate::session::{WindowId, WindowSession};
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use prism_gpu::{DisplayRequest, DisplaySession, GpuInstance};
use prism_platform::{
    EventPump, Interaction, NativeEvent, PlatformError, WindowBackend, WindowCallbacks,
    WindowControl, WindowDescriptor,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Manager configuration: shader binaries for the initial pipeline and the
/// display request template for presenting windows.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Compiled vertex shader binary.
    pub vertex_shader: PathBuf,
    /// Compiled fragment shader binary.
    pub fragment_shader: PathBuf,
    /// Display request used for every presenting window.
    pub display_request: DisplayRequest,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("shaders/triangle.vert.spv"),
            fragment_shader: PathBuf::from("shaders/triangle.frag.spv"),
            display_request: DisplayRequest::default(),
        }
    }
}

impl ManagerConfig {
    /// Set the shader binary paths.
    #[must_use]
    pub fn with_shaders(mut self, vertex: PathBuf, fragment: PathBuf) -> Self {
        self.vertex_shader = vertex;
        self.fragment_shader = fragment;
        self
    }

    /// Set the display request template.
    #[must_use]
    pub fn with_display_request(mut self, request: DisplayRequest) -> Self {
        self.display_request = request;
        self
    }
}

/// Concurrent lifecycle manager for on-screen window sessions.
pub struct WindowManager {
    backend: Arc<dyn WindowBackend>,
    gpu: Option<Arc<GpuInstance>>,
    config: ManagerConfig,
    registry: Arc<SessionRegistry>,
    joiners: Arc<Mutex<HashMap<u64, JoinHandle<()>>>>,
    finished_tx: Option<Sender<WindowId>>,
    reaper: Option<JoinHandle<()>>,
    next_id: AtomicU64,
}

impl WindowManager {
    /// Create a manager over one backend, with graphics when a GPU instance
    /// is provided. Input+output windows require the GPU instance.
    pub fn new(
        backend: Arc<dyn WindowBackend>,
        gpu: Option<Arc<GpuInstance>>,
        config: ManagerConfig,
    ) -> Self {
        let (finished_tx, finished_rx) = unbounded();
        let joiners: Arc<Mutex<HashMap<u64, JoinHandle<()>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let reaper = {
            let joiners = Arc::clone(&joiners);
            thread::Builder::new()
                .name("prism-reaper".to_string())
                .spawn(move || run_reaper(&finished_rx, &joiners))
                .expect("failed to spawn reaper thread")
        };

        Self {
            backend,
            gpu,
            config,
            registry: Arc::new(SessionRegistry::new()),
            joiners,
            finished_tx: Some(finished_tx),
            reaper: Some(reaper),
            next_id: AtomicU64::new(1),
        }
    }

    /// The shared session registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Number of live windows.
    pub fn window_count(&self) -> usize {
        self.registry.len()
    }

    /// Look up a live session by id.
    pub fn session(&self, id: WindowId) -> Option<Arc<WindowSession>> {
        self.registry.get(id)
    }

    /// Create a window session and start its event thread.
    ///
    /// Blocks until the native window handle exists (the backend constructs
    /// it on the event thread). For input+output windows this also drives
    /// device pick and logical device/swapchain creation; the initial
    /// pipeline build then runs detached on a short-lived helper thread.
    pub fn create_window(
        &self,
        desc: &WindowDescriptor,
        callbacks: WindowCallbacks,
    ) -> Result<WindowId> {
        let id = WindowId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let finished_tx = self
            .finished_tx
            .clone()
            .ok_or(SessionError::CreationAborted)?;

        let (ready_tx, ready_rx) = bounded::<prism_platform::Result<Arc<dyn WindowControl>>>(1);
        let (session_tx, session_rx) = bounded::<Arc<WindowSession>>(1);

        let handle = {
            let backend = Arc::clone(&self.backend);
            let desc = desc.clone();
            let registry = Arc::clone(&self.registry);
            thread::Builder::new()
                .name(format!("prism-window-{}", desc.title))
                .spawn(move || {
                    let (pump, control) = match backend.open(&desc) {
                        Ok(pair) => pair,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(control));

                    // The creator sends the fully constructed session, or
                    // drops the channel when construction fails.
                    let Ok(session) = session_rx.recv() else { return };
                    run_event_loop(pump, &session, &registry, callbacks);
                    let _ = finished_tx.send(session.id());
                })
                .map_err(|e| PlatformError::WindowCreation(e.to_string()))
                .map_err(SessionError::Platform)?
        };

        let control = match ready_rx.recv() {
            Ok(Ok(control)) => control,
            Ok(Err(e)) => {
                drop(session_tx);
                let _ = handle.join();
                return Err(e.into());
            }
            Err(_) => {
                drop(session_tx);
                let _ = handle.join();
                return Err(SessionError::CreationAborted);
            }
        };

        let display = match desc.interaction {
            Interaction::InputOnly => None,
            Interaction::InputOutput => match self.attach_graphics(control.as_ref(), desc) {
                Ok(display) => Some(display),
                Err(e) => {
                    // Unwind: release the native window and collect the
                    // event thread ourselves; it was never registered.
                    drop(session_tx);
                    control.request_destroy();
                    let _ = handle.join();
                    return Err(e);
                }
            },
        };

        let session = Arc::new(WindowSession::new(
            id,
            desc.title.clone(),
            desc.geometry,
            desc.display_mode,
            desc.interaction,
            control,
            display,
        ));

        self.registry.insert(Arc::clone(&session));
        self.joiners.lock().insert(id.0, handle);
        let _ = session_tx.send(Arc::clone(&session));

        if desc.interaction == Interaction::InputOutput {
            self.spawn_pipeline_build(&session);
        }

        tracing::info!(window = %desc.title, id = id.0, "window session created");
        Ok(id)
    }

    /// Externally close a window and wait for its close protocol.
    ///
    /// Marks the session `InternallyClosed` under the registry lock, asks
    /// the backend to tear down the native handle, and blocks until the
    /// event thread has completed the protocol. A second call for the same
    /// id is rejected with [`SessionError::UnknownWindow`].
    pub fn close_window(&self, id: WindowId) -> Result<()> {
        let session = self.registry.begin_external_close(id)?;
        session.control().request_destroy();
        session.wait_closed();
        Ok(())
    }

    /// Application-wide teardown: close every live window, then stop the
    /// reaper. Every event thread is joined exactly once; no session is
    /// freed while its thread may still touch it.
    pub fn shutdown(&mut self) {
        while let Some(session) = self.registry.first() {
            if let Err(e) = self.close_window(session.id()) {
                // The window closed itself between the lookup and the claim.
                tracing::debug!(window = %session.name(), "close raced: {e}");
            }
        }

        // Closing the channel lets the reaper drain and exit.
        self.finished_tx = None;
        if let Some(reaper) = self.reaper.take() {
            let _ = reaper.join();
        }
    }

    fn attach_graphics(
        &self,
        control: &dyn WindowControl,
        desc: &WindowDescriptor,
    ) -> Result<DisplaySession> {
        let gpu = self
            .gpu
            .clone()
            .ok_or(SessionError::GraphicsUnavailable)?;
        let handles = control.raw_handles().ok_or(SessionError::NoSurfaceHandles)?;

        let surface = unsafe { gpu.create_surface(handles.display, handles.window) }?;
        let mut display =
            unsafe { DisplaySession::new(gpu, self.config.display_request.clone(), surface) };

        let chosen = display.pick_device()?;
        display.set_device(chosen.handle, desc.geometry)?;
        Ok(display)
    }

    /// Detached helper thread for the initial pipeline build; it depends
    /// only on the display session, not on window-thread-local state.
    fn spawn_pipeline_build(&self, session: &Arc<WindowSession>) {
        let session = Arc::clone(session);
        let vertex = self.config.vertex_shader.clone();
        let fragment = self.config.fragment_shader.clone();
        let spawned = thread::Builder::new()
            .name("prism-pipeline".to_string())
            .spawn(move || {
                match session.with_display(|display| display.build_pipeline(&vertex, &fragment)) {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        tracing::error!(window = %session.name(), "pipeline build failed: {e}");
                    }
                    None => {}
                }
            });
        if let Err(e) = spawned {
            tracing::error!("failed to spawn pipeline build thread: {e}");
        }
    }
}

impl Drop for WindowManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Join every finished event thread; exactly one joiner per window.
fn run_reaper(finished_rx: &Receiver<WindowId>, joiners: &Mutex<HashMap<u64, JoinHandle<()>>>) {
    while let Ok(id) = finished_rx.recv() {
        if let Some(handle) = joiners.lock().remove(&id.0) {
            let _ = handle.join();
            tracing::debug!(id = id.0, "window thread reaped");
        }
    }
    // Channel closed: the manager is shutting down and the registry is
    // empty, so any remaining threads have already finished.
    for (_, handle) in joiners.lock().drain() {
        let _ = handle.join();
    }
}

/// Blocking native-event loop for one window, run on its own thread.
fn run_event_loop(
    mut pump: Box<dyn EventPump>,
    session: &Arc<WindowSession>,
    registry: &SessionRegistry,
    mut callbacks: WindowCallbacks,
) {
    loop {
        match pump.wait_event() {
            NativeEvent::Expose => {
                if let Some(f) = &mut callbacks.on_expose {
                    f();
                }
            }
            NativeEvent::Configured(geometry) => {
                *session.geometry.lock() = geometry;
                if let Some(Err(e)) = session.with_display(|display| {
                    display.resize(geometry.extent.width, geometry.extent.height)
                }) {
                    tracing::error!(window = %session.name(), "swapchain resize failed: {e}");
                }
                if let Some(f) = &mut callbacks.on_configure {
                    f(geometry);
                }
            }
            NativeEvent::StateChanged => {
                if let Some(f) = &mut callbacks.on_state_change {
                    f();
                }
            }
            NativeEvent::ClientMessage => {
                if let Some(f) = &mut callbacks.on_client_message {
                    f();
                }
            }
            NativeEvent::FocusGained => {
                if let Some(f) = &mut callbacks.on_focus {
                    f(true);
                }
            }
            NativeEvent::FocusLost => {
                if let Some(f) = &mut callbacks.on_focus {
                    f(false);
                }
            }
            NativeEvent::PointerEntered => {
                if let Some(f) = &mut callbacks.on_pointer {
                    f(true);
                }
            }
            NativeEvent::PointerLeft => {
                if let Some(f) = &mut callbacks.on_pointer {
                    f(false);
                }
            }
            NativeEvent::CloseRequested => {
                if let Some(f) = &mut callbacks.on_close {
                    f();
                }
                // The user closed the window; tear the native handle down
                // and let the Destroyed notification drive the protocol.
                session.control().request_destroy();
            }
            NativeEvent::Destroyed | NativeEvent::SourceClosed => {
                registry.begin_internal_close(session);
                run_close_protocol(registry, session);
                break;
            }
        }
    }
}

/// The close protocol, run exactly once per window by its event thread.
///
/// Registry lookup and removal happen under one lock acquisition; ownership
/// of the display session leaves with that step, so graphics destruction and
/// native release run after the lock drops. Display destruction completes
/// before the native handle is released.
fn run_close_protocol(registry: &SessionRegistry, session: &WindowSession) {
    let status = session.status();
    tracing::info!(window = %session.name(), ?status, "running close protocol");

    let display = registry.remove_for_close(session);
    if let Some(mut display) = display {
        display.destroy();
    }
    // Idempotent for windows whose native handle is already gone.
    session.control().request_destroy();
    session.mark_closed();
}
