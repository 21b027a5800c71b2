//! Prometheus metrics for the camera session and capture pipeline.
//!
//! # Metrics Exposed
//!
//! ## Session Metrics
//! - `quick_camera_session_state` - Current state (0=closed, 1=configured, 2=previewing)
//! - `quick_camera_facing` - Selected camera (0=back, 1=front)
//! - `quick_camera_sessions_opened_total` - Successful camera acquisitions
//! - `quick_camera_open_failures_total` - Failed camera acquisitions
//! - `quick_camera_previews_started_total` - Preview starts
//! - `quick_camera_facing_swaps_total` - Front/back swaps
//!
//! ## Capture Metrics
//! - `quick_camera_captures_triggered_total` - Captures handed to the hardware
//! - `quick_camera_captures_succeeded_total` - Captures persisted
//! - `quick_camera_captures_failed_total` - Accepted captures that failed
//! - `quick_camera_captures_rejected_total` - Requests rejected before triggering
//! - `quick_camera_bytes_persisted_total` - Image bytes written
//!
//! # Example
//!
//! ```no_run
//! use quick_camera::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     opens: 1,
//!     previews_started: 1,
//!     captures_succeeded: 2,
//!     bytes_persisted: 2048,
//!     ..Default::default()
//! };
//!
//! registry.update(&snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
