//! Single-shot still capture and persistence.
//!
//! The coordinator triggers the hardware, then hands the delivered bytes
//! to a background thread that writes them through a [`Storage`]
//! collaborator. Completion is reported to the host callbacks and to the
//! [`PendingCapture`] returned from the trigger call.

mod coordinator;
mod error;
mod locator;
mod request;
mod storage;

pub use coordinator::{CaptureCoordinator, CaptureStats, PendingCapture};
pub use error::CaptureError;
pub use locator::ResourceLocator;
pub use request::CaptureRequest;
pub use storage::{MediaDirectory, MediaKind, Storage, StorageError};
