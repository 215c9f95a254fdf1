//! Channel-driven backend with no native windowing system.
//!
//! Serves input-only sessions and every concurrency test: events are
//! injected through a sender instead of arriving from a display server.

use crate::backend::{EventPump, RawHandles, WindowBackend, WindowControl};
use crate::event::NativeEvent;
use crate::{DisplayMode, Result, WindowDescriptor};
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use prism_core::{Extent, WindowGeometry};
use std::sync::Arc;

/// A backend whose windows exist only as event channels.
#[derive(Default)]
pub struct HeadlessBackend {
    windows: Mutex<Vec<(String, Sender<NativeEvent>)>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event injector for the window opened with `title`, for tests.
    pub fn injector(&self, title: &str) -> Option<Sender<NativeEvent>> {
        self.windows
            .lock()
            .iter()
            .find(|(name, _)| name == title)
            .map(|(_, sender)| sender.clone())
    }
}

impl WindowBackend for HeadlessBackend {
    fn open(
        &self,
        desc: &WindowDescriptor,
    ) -> Result<(Box<dyn EventPump>, Arc<dyn WindowControl>)> {
        let (sender, receiver) = unbounded();
        self.windows
            .lock()
            .push((desc.title.clone(), sender.clone()));

        tracing::debug!(title = %desc.title, "opened headless window");

        let pump = HeadlessPump { events: receiver };
        let control = HeadlessControl {
            events: sender,
            geometry: Mutex::new(desc.geometry),
        };
        Ok((Box::new(pump), Arc::new(control)))
    }
}

struct HeadlessPump {
    events: Receiver<NativeEvent>,
}

impl EventPump for HeadlessPump {
    fn wait_event(&mut self) -> NativeEvent {
        // A dropped sender is the event source disappearing.
        self.events.recv().unwrap_or(NativeEvent::SourceClosed)
    }
}

struct HeadlessControl {
    events: Sender<NativeEvent>,
    geometry: Mutex<WindowGeometry>,
}

impl WindowControl for HeadlessControl {
    fn request_destroy(&self) {
        let _ = self.events.send(NativeEvent::Destroyed);
    }

    fn set_title(&self, _title: &str) {}

    fn set_dimensions(&self, extent: Extent) {
        let geometry = {
            let mut geometry = self.geometry.lock();
            geometry.extent = extent;
            *geometry
        };
        let _ = self.events.send(NativeEvent::Configured(geometry));
    }

    fn set_display_mode(&self, _mode: DisplayMode) {
        let _ = self.events.send(NativeEvent::StateChanged);
    }

    fn raw_handles(&self) -> Option<RawHandles> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injected_events_arrive_in_order() {
        let backend = HeadlessBackend::new();
        let (mut pump, _control) = backend.open(&WindowDescriptor::new("w")).unwrap();

        let injector = backend.injector("w").unwrap();
        injector.send(NativeEvent::Expose).unwrap();
        injector.send(NativeEvent::FocusGained).unwrap();

        assert_eq!(pump.wait_event(), NativeEvent::Expose);
        assert_eq!(pump.wait_event(), NativeEvent::FocusGained);
    }

    #[test]
    fn destroy_request_surfaces_as_destroyed_event() {
        let backend = HeadlessBackend::new();
        let (mut pump, control) = backend.open(&WindowDescriptor::new("w")).unwrap();

        control.request_destroy();
        assert_eq!(pump.wait_event(), NativeEvent::Destroyed);
    }

    #[test]
    fn dropped_source_reports_source_closed() {
        let backend = HeadlessBackend::new();
        let (mut pump, control) = backend.open(&WindowDescriptor::new("w")).unwrap();

        backend.windows.lock().clear();
        drop(control);
        assert_eq!(pump.wait_event(), NativeEvent::SourceClosed);
    }
}
