//! The shared, lock-guarded registry of live window sessions.
//!
//! Invariant: a session appears here if and only if it has been fully
//! constructed and has not yet completed the close protocol's removal step.
//! The registry lock is the sole synchronization primitive for membership
//! and for status transitions; it is held only for short operations, never
//! across a blocking wait or a graphics call.

use crate::error::{Result, SessionError};
use crate::session::{WindowId, WindowSession, WindowStatus};
use parking_lot::Mutex;
use prism_gpu::DisplaySession;
use std::sync::Arc;

/// Ordered collection of live window sessions, shared by every window
/// thread and the application-teardown path.
#[derive(Default)]
pub struct SessionRegistry {
    entries: Mutex<Vec<Arc<WindowSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Look up a live session by identity.
    pub fn get(&self, id: WindowId) -> Option<Arc<WindowSession>> {
        self.entries
            .lock()
            .iter()
            .find(|session| session.id == id)
            .cloned()
    }

    /// The first live session in creation order, for teardown.
    pub fn first(&self) -> Option<Arc<WindowSession>> {
        self.entries.lock().first().cloned()
    }

    /// Register a fully constructed session. This is the point the session
    /// becomes externally visible.
    pub(crate) fn insert(&self, session: Arc<WindowSession>) {
        self.entries.lock().push(session);
    }

    /// Claim an external close: mark the session `InternallyClosed` under
    /// the registry lock and hand it to the caller.
    ///
    /// Only an `Alive` session leaves that state; a close already claimed by
    /// the event thread keeps its `CloseRequested` status and the caller
    /// simply waits for the protocol it lost the race to.
    ///
    /// An id no longer present means the window never existed or already
    /// completed the close protocol; that is a rejection, not a panic.
    pub(crate) fn begin_external_close(&self, id: WindowId) -> Result<Arc<WindowSession>> {
        let entries = self.entries.lock();
        let session = entries
            .iter()
            .find(|session| session.id == id)
            .cloned()
            .ok_or(SessionError::UnknownWindow)?;
        let mut status = session.status.lock();
        if *status == WindowStatus::Alive {
            *status = WindowStatus::InternallyClosed;
        }
        drop(status);
        Ok(session)
    }

    /// Claim an internal close from the session's own event thread.
    ///
    /// Transitions `Alive -> CloseRequested` under the registry lock; a
    /// close already in flight (any non-`Alive` status) is left untouched.
    pub(crate) fn begin_internal_close(&self, session: &WindowSession) {
        let _entries = self.entries.lock();
        let mut status = session.status.lock();
        if *status == WindowStatus::Alive {
            *status = WindowStatus::CloseRequested;
        }
    }

    /// The close protocol's registry step, exactly once per window.
    ///
    /// Looks the window up by identity and removes the entry under one lock
    /// acquisition. The display session is taken out only after the registry
    /// lock drops: removal makes the close protocol the sole owner, and the
    /// display lock may be held for the duration of a pipeline build or
    /// swapchain recreation, which must never stall the registry.
    ///
    /// # Panics
    /// A window missing from the registry during close is registry
    /// corruption, a programming defect, and aborts.
    pub(crate) fn remove_for_close(&self, session: &WindowSession) -> Option<DisplaySession> {
        {
            let mut entries = self.entries.lock();
            let index = entries
                .iter()
                .position(|entry| entry.id == session.id)
                .unwrap_or_else(|| {
                    panic!(
                        "window '{}' missing from registry during close",
                        session.name
                    )
                });
            entries.remove(index);
        }
        session.display.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::WindowGeometry;
    use prism_platform::{
        DisplayMode, HeadlessBackend, Interaction, WindowBackend, WindowDescriptor,
    };
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn session(id: u64) -> Arc<WindowSession> {
        let backend = HeadlessBackend::new();
        let (_pump, control) = backend.open(&WindowDescriptor::new("w")).unwrap();
        Arc::new(WindowSession::new(
            WindowId(id),
            "w".to_string(),
            WindowGeometry::default(),
            DisplayMode::Windowed,
            Interaction::InputOnly,
            control,
            None,
        ))
    }

    #[test]
    fn external_close_claims_an_alive_session() {
        let registry = SessionRegistry::new();
        let session = session(1);
        registry.insert(Arc::clone(&session));

        let claimed = registry.begin_external_close(session.id()).unwrap();
        assert_eq!(claimed.status(), WindowStatus::InternallyClosed);
    }

    #[test]
    fn external_close_does_not_override_a_claimed_close() {
        let registry = SessionRegistry::new();
        let session = session(2);
        registry.insert(Arc::clone(&session));

        registry.begin_internal_close(&session);
        assert_eq!(session.status(), WindowStatus::CloseRequested);

        let claimed = registry.begin_external_close(session.id()).unwrap();
        assert_eq!(claimed.status(), WindowStatus::CloseRequested);
    }

    #[test]
    fn removal_does_not_wait_on_the_display_lock() {
        let registry = Arc::new(SessionRegistry::new());
        let session = session(3);
        registry.insert(Arc::clone(&session));

        // Stand in for a pipeline build holding the display lock.
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let holder_session = Arc::clone(&session);
        let holder = thread::spawn(move || {
            let _display = holder_session.display.lock();
            held_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        });
        held_rx.recv().unwrap();

        let remover_registry = Arc::clone(&registry);
        let remover_session = Arc::clone(&session);
        let remover = thread::spawn(move || {
            remover_registry.remove_for_close(&remover_session);
        });

        // Registry membership clears while the display lock is still held;
        // only the display take-out may wait behind it.
        let deadline = Instant::now() + Duration::from_secs(5);
        while !registry.is_empty() {
            assert!(
                Instant::now() < deadline,
                "registry removal blocked behind the display lock"
            );
            thread::yield_now();
        }

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        remover.join().unwrap();
    }
}
