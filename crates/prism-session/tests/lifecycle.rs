//! Window session lifecycle over the headless backend.

use crossbeam::channel::unbounded;
use prism_core::{Extent, WindowGeometry};
use prism_platform::{
    DisplayMode, HeadlessBackend, Interaction, NativeEvent, WindowBackend, WindowCallbacks,
    WindowDescriptor,
};
use prism_session::{ManagerConfig, SessionError, WindowManager, WindowStatus};
use std::sync::Arc;

fn manager_over(backend: &Arc<HeadlessBackend>) -> WindowManager {
    let backend: Arc<dyn WindowBackend> = backend.clone();
    WindowManager::new(backend, None, ManagerConfig::default())
}

fn input_only(title: &str) -> WindowDescriptor {
    WindowDescriptor::new(title).with_interaction(Interaction::InputOnly)
}

#[test]
fn shutdown_closes_every_window_and_empties_registry() {
    let backend = Arc::new(HeadlessBackend::new());
    let mut manager = manager_over(&backend);

    for i in 0..4 {
        manager
            .create_window(&input_only(&format!("w{i}")), WindowCallbacks::new())
            .unwrap();
    }
    assert_eq!(manager.window_count(), 4);

    manager.shutdown();
    assert_eq!(manager.window_count(), 0);
}

#[test]
fn second_external_close_is_rejected() {
    let backend = Arc::new(HeadlessBackend::new());
    let manager = manager_over(&backend);

    let id = manager
        .create_window(&input_only("solo"), WindowCallbacks::new())
        .unwrap();

    manager.close_window(id).unwrap();
    assert!(matches!(
        manager.close_window(id),
        Err(SessionError::UnknownWindow)
    ));
    assert_eq!(manager.window_count(), 0);
}

#[test]
fn externally_closed_session_reports_internally_closed_status() {
    let backend = Arc::new(HeadlessBackend::new());
    let manager = manager_over(&backend);

    let id = manager
        .create_window(&input_only("tracked"), WindowCallbacks::new())
        .unwrap();
    let session = manager.session(id).unwrap();
    assert_eq!(session.status(), WindowStatus::Alive);

    manager.close_window(id).unwrap();
    assert_eq!(session.status(), WindowStatus::InternallyClosed);
    assert!(manager.session(id).is_none());
}

#[test]
fn native_destroy_runs_the_close_protocol() {
    let backend = Arc::new(HeadlessBackend::new());
    let manager = manager_over(&backend);

    let id = manager
        .create_window(&input_only("doomed"), WindowCallbacks::new())
        .unwrap();
    let session = manager.session(id).unwrap();

    backend
        .injector("doomed")
        .unwrap()
        .send(NativeEvent::Destroyed)
        .unwrap();

    session.wait_closed();
    assert_eq!(session.status(), WindowStatus::CloseRequested);
    assert!(manager.session(id).is_none());
}

#[test]
fn vanished_event_source_closes_the_session() {
    let backend = Arc::new(HeadlessBackend::new());
    let manager = manager_over(&backend);

    let id = manager
        .create_window(&input_only("flaky"), WindowCallbacks::new())
        .unwrap();
    let session = manager.session(id).unwrap();

    backend
        .injector("flaky")
        .unwrap()
        .send(NativeEvent::SourceClosed)
        .unwrap();

    session.wait_closed();
    assert!(manager.session(id).is_none());
}

#[test]
fn configure_events_update_geometry_and_reach_the_callback() {
    let backend = Arc::new(HeadlessBackend::new());
    let manager = manager_over(&backend);

    let (seen_tx, seen_rx) = unbounded();
    let callbacks = WindowCallbacks::new().on_configure(move |geometry| {
        let _ = seen_tx.send(geometry);
    });

    let id = manager
        .create_window(&input_only("resizable"), callbacks)
        .unwrap();
    let session = manager.session(id).unwrap();

    let geometry = WindowGeometry {
        extent: Extent {
            width: 640,
            height: 480,
        },
        ..WindowGeometry::default()
    };
    backend
        .injector("resizable")
        .unwrap()
        .send(NativeEvent::Configured(geometry))
        .unwrap();

    assert_eq!(seen_rx.recv().unwrap(), geometry);
    assert_eq!(session.geometry().extent.width, 640);
    assert_eq!(session.geometry().extent.height, 480);
}

#[test]
fn display_mode_tracks_the_latest_request() {
    let backend = Arc::new(HeadlessBackend::new());
    let manager = manager_over(&backend);

    let id = manager
        .create_window(&input_only("switchable"), WindowCallbacks::new())
        .unwrap();
    let session = manager.session(id).unwrap();
    assert_eq!(session.display_mode(), DisplayMode::Windowed);

    session.set_display_mode(DisplayMode::Fullscreen);
    assert_eq!(session.display_mode(), DisplayMode::Fullscreen);

    session.set_display_mode(DisplayMode::Windowed);
    assert_eq!(session.display_mode(), DisplayMode::Windowed);
}

#[test]
fn close_request_fires_the_callback_then_tears_down() {
    let backend = Arc::new(HeadlessBackend::new());
    let manager = manager_over(&backend);

    let (seen_tx, seen_rx) = unbounded();
    let callbacks = WindowCallbacks::new().on_close(move || {
        let _ = seen_tx.send(());
    });

    let id = manager
        .create_window(&input_only("polite"), callbacks)
        .unwrap();
    let session = manager.session(id).unwrap();

    backend
        .injector("polite")
        .unwrap()
        .send(NativeEvent::CloseRequested)
        .unwrap();

    seen_rx.recv().unwrap();
    session.wait_closed();
    assert!(manager.session(id).is_none());
}

#[test]
fn sessions_close_concurrently_without_interference() {
    let backend = Arc::new(HeadlessBackend::new());
    let manager = Arc::new(manager_over(&backend));

    let ids: Vec<_> = (0..6)
        .map(|i| {
            manager
                .create_window(&input_only(&format!("c{i}")), WindowCallbacks::new())
                .unwrap()
        })
        .collect();
    assert_eq!(manager.window_count(), 6);

    let closers: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || manager.close_window(id).unwrap())
        })
        .collect();
    for closer in closers {
        closer.join().unwrap();
    }
    assert_eq!(manager.window_count(), 0);
}
