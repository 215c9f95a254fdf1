//! Winit-backed window backend.
//!
//! Each window owns a dedicated winit event loop, created on and pumped from
//! the window's event thread. Cross-thread control requests travel through an
//! `EventLoopProxy` and are applied between pumps.

use crate::backend::{EventPump, RawHandles, WindowBackend, WindowControl};
use crate::event::NativeEvent;
use crate::{DisplayMode, PlatformError, Result, WindowDescriptor};
use parking_lot::Mutex;
use prism_core::{Extent, Position, WindowGeometry};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::collections::VecDeque;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Fullscreen, Window, WindowId};

/// Native window backend built on winit.
#[derive(Default)]
pub struct WinitBackend;

impl WinitBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Control requests delivered to the event thread through the loop proxy.
#[derive(Debug)]
enum ControlRequest {
    Destroy,
    SetTitle(String),
    SetDimensions(Extent),
    SetDisplayMode(DisplayMode),
}

impl WindowBackend for WinitBackend {
    fn open(
        &self,
        desc: &WindowDescriptor,
    ) -> Result<(Box<dyn EventPump>, Arc<dyn WindowControl>)> {
        let mut builder = EventLoop::<ControlRequest>::with_user_event();
        #[cfg(target_os = "linux")]
        {
            use winit::platform::wayland::EventLoopBuilderExtWayland;
            use winit::platform::x11::EventLoopBuilderExtX11;
            EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
            EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
        }
        #[cfg(target_os = "windows")]
        {
            use winit::platform::windows::EventLoopBuilderExtWindows;
            builder.with_any_thread(true);
        }

        let mut event_loop = builder
            .build()
            .map_err(|e| PlatformError::EventLoop(e.to_string()))?;
        let proxy = event_loop.create_proxy();

        let mut app = PumpApp::new(desc.clone());

        // Window construction happens inside `resumed` on this thread; pump
        // until the native handle exists.
        while app.window.is_none() {
            let status = event_loop.pump_app_events(None, &mut app);
            if let PumpStatus::Exit(code) = status {
                return Err(PlatformError::WindowCreation(format!(
                    "event loop exited before window creation ({code})"
                )));
            }
        }

        tracing::debug!(title = %desc.title, "opened winit window");

        let handles = app.raw_handles();
        let control = WinitControl {
            proxy: Mutex::new(proxy),
            handles,
        };
        let pump = WinitPump {
            event_loop,
            app,
            closed: false,
        };
        Ok((Box::new(pump), Arc::new(control)))
    }
}

struct WinitPump {
    event_loop: EventLoop<ControlRequest>,
    app: PumpApp,
    closed: bool,
}

impl EventPump for WinitPump {
    fn wait_event(&mut self) -> NativeEvent {
        loop {
            if let Some(event) = self.app.queue.pop_front() {
                return event;
            }
            if self.closed {
                return NativeEvent::SourceClosed;
            }
            let status = self.event_loop.pump_app_events(None, &mut self.app);
            if matches!(status, PumpStatus::Exit(_)) {
                self.closed = true;
            }
        }
    }
}

struct WinitControl {
    proxy: Mutex<EventLoopProxy<ControlRequest>>,
    handles: Option<RawHandles>,
}

impl WinitControl {
    fn send(&self, request: ControlRequest) {
        // A closed loop means the window is already gone; nothing to do.
        let _ = self.proxy.lock().send_event(request);
    }
}

impl WindowControl for WinitControl {
    fn request_destroy(&self) {
        self.send(ControlRequest::Destroy);
    }

    fn set_title(&self, title: &str) {
        self.send(ControlRequest::SetTitle(title.to_string()));
    }

    fn set_dimensions(&self, extent: Extent) {
        self.send(ControlRequest::SetDimensions(extent));
    }

    fn set_display_mode(&self, mode: DisplayMode) {
        self.send(ControlRequest::SetDisplayMode(mode));
    }

    fn raw_handles(&self) -> Option<RawHandles> {
        self.handles
    }
}

/// The winit application driven by the pump.
struct PumpApp {
    desc: WindowDescriptor,
    window: Option<Window>,
    queue: VecDeque<NativeEvent>,
    geometry: WindowGeometry,
}

impl PumpApp {
    fn new(desc: WindowDescriptor) -> Self {
        let geometry = desc.geometry;
        Self {
            desc,
            window: None,
            queue: VecDeque::new(),
            geometry,
        }
    }

    fn raw_handles(&self) -> Option<RawHandles> {
        let window = self.window.as_ref()?;
        let display = window.display_handle().ok()?.as_raw();
        let handle = window.window_handle().ok()?.as_raw();
        Some(RawHandles {
            display,
            window: handle,
        })
    }
}

fn apply_display_mode(window: &Window, mode: DisplayMode) {
    match mode {
        DisplayMode::Windowed => {
            window.set_fullscreen(None);
            window.set_decorations(true);
            window.set_maximized(false);
        }
        DisplayMode::Fullscreen => {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        DisplayMode::DockedFullscreen => {
            window.set_fullscreen(None);
            window.set_decorations(false);
            window.set_maximized(true);
        }
    }
}

impl ApplicationHandler<ControlRequest> for PumpApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.desc.title)
            .with_inner_size(PhysicalSize::new(
                self.desc.geometry.extent.width,
                self.desc.geometry.extent.height,
            ))
            .with_position(PhysicalPosition::new(
                self.desc.geometry.position.x,
                self.desc.geometry.position.y,
            ));

        match event_loop.create_window(attrs) {
            Ok(window) => {
                apply_display_mode(&window, self.desc.display_mode);
                let size = window.inner_size();
                self.geometry.extent = Extent::new(size.width, size.height);
                self.queue.push_back(NativeEvent::Configured(self.geometry));
                self.window = Some(window);
            }
            Err(e) => {
                tracing::error!("window creation failed: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        let translated = match event {
            WindowEvent::Resized(size) => {
                self.geometry.extent = Extent::new(size.width, size.height);
                Some(NativeEvent::Configured(self.geometry))
            }
            WindowEvent::Moved(position) => {
                self.geometry.position = Position::new(position.x, position.y);
                Some(NativeEvent::Configured(self.geometry))
            }
            WindowEvent::Focused(true) => Some(NativeEvent::FocusGained),
            WindowEvent::Focused(false) => Some(NativeEvent::FocusLost),
            WindowEvent::CursorEntered { .. } => Some(NativeEvent::PointerEntered),
            WindowEvent::CursorLeft { .. } => Some(NativeEvent::PointerLeft),
            WindowEvent::CloseRequested => Some(NativeEvent::CloseRequested),
            WindowEvent::Destroyed => Some(NativeEvent::Destroyed),
            WindowEvent::RedrawRequested => Some(NativeEvent::Expose),
            WindowEvent::ThemeChanged(_) | WindowEvent::ScaleFactorChanged { .. } => {
                Some(NativeEvent::StateChanged)
            }
            _ => None,
        };

        if let Some(event) = translated {
            self.queue.push_back(event);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, request: ControlRequest) {
        match request {
            ControlRequest::Destroy => {
                // Dropping the window destroys the native handle; the
                // session observes the Destroyed notification and runs the
                // close protocol.
                self.window = None;
                self.queue.push_back(NativeEvent::Destroyed);
                event_loop.exit();
            }
            ControlRequest::SetTitle(title) => {
                if let Some(window) = &self.window {
                    window.set_title(&title);
                }
            }
            ControlRequest::SetDimensions(extent) => {
                if let Some(window) = &self.window {
                    let _ = window.request_inner_size(PhysicalSize::new(
                        extent.width,
                        extent.height,
                    ));
                }
            }
            ControlRequest::SetDisplayMode(mode) => {
                if let Some(window) = &self.window {
                    apply_display_mode(window, mode);
                }
            }
        }
    }
}
