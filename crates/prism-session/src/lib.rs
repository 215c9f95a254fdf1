//! Concurrent window session management for Prism.
//!
//! One event thread per window, a shared lock-guarded registry as the
//! single source of truth for liveness, and a close protocol that runs
//! exactly once per window on its own event thread no matter which side
//! initiated the close.

pub mod error;
pub mod manager;
pub mod registry;
pub mod session;

pub use error::{Result, SessionError};
pub use manager::{ManagerConfig, WindowManager};
pub use registry::SessionRegistry;
pub use session::{WindowId, WindowSession, WindowStatus};
