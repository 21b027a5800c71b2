//! Quick Camera Library
//!
//! Live camera preview on a host-provided surface plus single-shot still
//! capture persisted to a public media directory.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! orientation + preview ─→ session ─→ capture ─→ storage
//!          ↑                  ↑           ↓
//!       hardware           controller  host callbacks
//! ```
//!
//! # Design Principles
//!
//! - **Exclusive hardware ownership**: a session holds at most one device
//!   handle and releases it on stop, facing swap and drop
//! - **Orientation-correct output**: preview and still rotations are derived
//!   from the sensor mount, display rotation and facing on every start
//! - **Single outstanding capture**: a second shutter press while one is in
//!   flight is rejected, never queued
//! - **Persistence off the caller's thread**: image bytes are written on a
//!   worker and reported through [`HostCallbacks`]
//!
//! # Example
//!
//! ```no_run
//! use quick_camera::{
//!     capture::MediaDirectory,
//!     hardware::{FixedDisplay, MockBackend, SurfaceHandle},
//!     session::NoopCallbacks,
//!     Dimension, Facing, QuickCamera,
//! };
//! use std::sync::Arc;
//!
//! let mut camera = QuickCamera::new(
//!     MockBackend::new(),
//!     FixedDisplay::new(Dimension::new(1080, 1920)),
//!     Arc::new(MediaDirectory::new("/tmp/media", "QuickCamera")),
//!     Arc::new(NoopCallbacks),
//!     Facing::Back,
//! );
//!
//! camera.surface_available(SurfaceHandle::new(1)).unwrap();
//! let pending = camera.take_picture().unwrap();
//! let locator = pending.wait().unwrap();
//! println!("saved {}", locator.to_uri());
//!
//! camera.surface_destroyed().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod controller;
pub mod hardware;
pub mod metrics;
pub mod orientation;
pub mod preview;
pub mod session;

// Re-export commonly used types at crate root
pub use capture::{CaptureCoordinator, CaptureError, MediaDirectory, PendingCapture, ResourceLocator, Storage};
pub use config::{ConfigError, FileConfig};
pub use controller::QuickCamera;
pub use hardware::{CameraBackend, CameraDevice, DisplayProvider, SurfaceHandle};
pub use orientation::{DerivedOrientation, Facing, Rotation};
pub use preview::{select_optimal_size, Dimension};
pub use session::{CameraSession, HostCallbacks, SessionError, SessionState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
