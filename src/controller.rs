//! Host-facing camera view controller.
//!
//! Ties host surface notifications and user actions to one
//! [`CameraSession`] and one [`CaptureCoordinator`].

use crate::capture::{CaptureCoordinator, CaptureError, CaptureStats, PendingCapture, Storage};
use crate::hardware::{CameraBackend, DisplayProvider, SurfaceHandle};
use crate::metrics::MetricsSnapshot;
use crate::orientation::Facing;
use crate::preview::Dimension;
use crate::session::{CameraSession, HostCallbacks, SessionError, SessionStats};
use std::sync::Arc;

/// Camera preview plus shutter, driven by the host's surface lifecycle.
#[derive(Debug)]
pub struct QuickCamera<B: CameraBackend, D: DisplayProvider> {
    session: CameraSession<B, D>,
    coordinator: CaptureCoordinator,
    layout_size: Option<Dimension>,
}

impl<B: CameraBackend, D: DisplayProvider> QuickCamera<B, D> {
    /// Creates the controller for `facing`.
    ///
    /// The camera is opened briefly to size the preview view and released
    /// again; streaming starts once the host reports a surface. If the
    /// camera cannot be opened the view should fill its parent.
    pub fn new(
        backend: B,
        display: D,
        storage: Arc<dyn Storage>,
        callbacks: Arc<dyn HostCallbacks>,
        facing: Facing,
    ) -> Self {
        let mut session = CameraSession::new(backend, display)
            .with_facing(facing)
            .with_callbacks(Arc::clone(&callbacks));
        let coordinator = CaptureCoordinator::new(storage).with_callbacks(callbacks);

        let layout_size = match session.open(facing) {
            Ok(()) => {
                let portrait = session.is_portrait();
                let size = session
                    .config()
                    .and_then(|config| config.layout_size(portrait));
                if let Err(e) = session.stop() {
                    tracing::warn!(error = %e, "failed to release camera after sizing");
                }
                size
            }
            Err(e) => {
                tracing::warn!(%facing, error = %e, "camera unavailable while sizing preview");
                None
            }
        };

        Self {
            session,
            coordinator,
            layout_size,
        }
    }

    /// Size for the preview view, or `None` to fill the parent.
    pub fn layout_size(&self) -> Option<Dimension> {
        self.layout_size
    }

    /// Host notification: the preview surface is ready.
    pub fn surface_available(&mut self, surface: SurfaceHandle) -> Result<(), SessionError> {
        self.session.on_surface_available(surface)
    }

    /// Host notification: the preview surface is gone.
    pub fn surface_destroyed(&mut self) -> Result<(), SessionError> {
        self.session.on_surface_destroyed()
    }

    /// Stops the preview and releases the camera, keeping the surface.
    pub fn stop_preview(&mut self) -> Result<(), SessionError> {
        self.session.stop()
    }

    /// Restarts the preview on the last known surface.
    ///
    /// A no-op when no surface has been reported yet.
    pub fn start_preview(&mut self) -> Result<(), SessionError> {
        match self.session.surface() {
            Some(surface) => self.session.bind_and_start(surface),
            None => {
                tracing::debug!("start requested before a surface is available");
                Ok(())
            }
        }
    }

    /// Takes a still picture. The locator arrives via
    /// [`HostCallbacks::on_image_capture`] and the returned handle.
    pub fn take_picture(&mut self) -> Result<PendingCapture, CaptureError> {
        self.coordinator.capture(&mut self.session)
    }

    /// Switches between front and back cameras when both exist.
    pub fn swap_camera(&mut self) -> Result<(), SessionError> {
        self.session.swap_facing()
    }

    /// True while the back camera is selected.
    pub fn is_back_camera(&self) -> bool {
        self.session.current_facing() == Facing::Back
    }

    /// True while previewing.
    pub fn is_started(&self) -> bool {
        self.session.is_previewing()
    }

    /// True if the device has more than one camera.
    pub fn has_multiple_cameras(&self) -> bool {
        self.session.has_multiple_cameras()
    }

    /// The underlying session.
    pub fn session(&self) -> &CameraSession<B, D> {
        &self.session
    }

    /// Session lifecycle counters.
    pub fn session_stats(&self) -> SessionStats {
        self.session.stats()
    }

    /// Capture counters.
    pub fn capture_stats(&self) -> CaptureStats {
        self.coordinator.stats()
    }

    /// Snapshot for the metrics registry.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_components(&self.session_stats(), &self.capture_stats())
    }
}
