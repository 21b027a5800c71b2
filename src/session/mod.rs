//! Camera session lifecycle.
//!
//! A [`CameraSession`] owns the opened hardware handle and moves strictly
//! through `Closed → Configured → Previewing → Closed`. Closing is legal from
//! any state and idempotent.

mod callbacks;
mod camera_session;
mod config;
mod error;
mod flag;

pub use callbacks::{HostCallbacks, NoopCallbacks};
pub use camera_session::{CameraSession, SessionState, SessionStats};
pub use config::SessionConfig;
pub use error::SessionError;
pub(crate) use flag::BusyGuard;
