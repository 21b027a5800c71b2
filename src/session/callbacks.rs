//! Notifications delivered to the host application.

use crate::capture::{CaptureError, ResourceLocator};

/// Host-side notification sink.
///
/// Capture notifications arrive on the persistence thread, so
/// implementations must be shareable across threads.
pub trait HostCallbacks: Send + Sync {
    /// Starting the preview failed because the camera is busy or the
    /// surface could not be bound. The host owns the user-facing message.
    fn display_camera_in_use_copy(&self, in_use: bool);

    /// Fired exactly once per successfully persisted capture.
    fn on_image_capture(&self, locator: &ResourceLocator);

    /// Fired when a capture that was accepted fails afterwards.
    fn on_capture_failed(&self, error: &CaptureError) {
        let _ = error;
    }
}

/// Callbacks that ignore every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl HostCallbacks for NoopCallbacks {
    fn display_camera_in_use_copy(&self, _in_use: bool) {}

    fn on_image_capture(&self, _locator: &ResourceLocator) {}
}
