//! The session state machine.

use super::{BusyGuard, HostCallbacks, SessionConfig, SessionError};
use crate::capture::CaptureError;
use crate::hardware::{CameraBackend, CameraDevice, DisplayProvider, PictureCallback, SurfaceHandle};
use crate::orientation::{Facing, Rotation};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Observable lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No hardware held.
    #[default]
    Closed,
    /// Hardware held and configured, not streaming.
    Configured,
    /// Streaming to a bound surface.
    Previewing,
}

impl SessionState {
    /// Numeric encoding used for metrics.
    pub fn as_gauge(self) -> i64 {
        match self {
            SessionState::Closed => 0,
            SessionState::Configured => 1,
            SessionState::Previewing => 2,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Closed => f.write_str("closed"),
            SessionState::Configured => f.write_str("configured"),
            SessionState::Previewing => f.write_str("previewing"),
        }
    }
}

/// Counters describing a session's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Current state.
    pub state: SessionState,
    /// Current facing.
    pub facing: Facing,
    /// Successful hardware acquisitions.
    pub opens: u64,
    /// Failed hardware acquisitions.
    pub open_failures: u64,
    /// Times streaming was started.
    pub previews_started: u64,
    /// Completed facing swaps.
    pub facing_swaps: u64,
}

/// The hardware handle lives inside the state it belongs to, so a closed
/// session cannot hold one and an open session cannot lose it.
enum Slot<Dev> {
    Closed,
    Configured { device: Dev, config: SessionConfig },
    Previewing { device: Dev, config: SessionConfig },
}

/// Owns one camera and drives it through open, preview and stop.
///
/// All methods are expected to be called from a single owner thread. The
/// only state shared with other threads is the flag marking an outstanding
/// capture trigger.
pub struct CameraSession<B: CameraBackend, D: DisplayProvider> {
    backend: B,
    display: D,
    facing: Facing,
    slot: Slot<B::Device>,
    surface: Option<SurfaceHandle>,
    trigger_pending: Arc<AtomicBool>,
    callbacks: Option<Arc<dyn HostCallbacks>>,
    stats: SessionStats,
}

impl<B: CameraBackend, D: DisplayProvider> CameraSession<B, D> {
    /// Creates a closed session targeting the back camera.
    pub fn new(backend: B, display: D) -> Self {
        Self {
            backend,
            display,
            facing: Facing::Back,
            slot: Slot::Closed,
            surface: None,
            trigger_pending: Arc::new(AtomicBool::new(false)),
            callbacks: None,
            stats: SessionStats {
                state: SessionState::Closed,
                facing: Facing::Back,
                opens: 0,
                open_failures: 0,
                previews_started: 0,
                facing_swaps: 0,
            },
        }
    }

    /// Sets the host notification sink.
    pub fn with_callbacks(mut self, callbacks: Arc<dyn HostCallbacks>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    /// Sets the facing used when the session next opens.
    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// Acquires the camera for `facing` and derives its configuration.
    ///
    /// Closed → Configured. Hardware failures are reported, never retried.
    pub fn open(&mut self, facing: Facing) -> Result<(), SessionError> {
        if !matches!(self.slot, Slot::Closed) {
            return Err(SessionError::AlreadyOpen);
        }
        let (device, config) = self.acquire(facing)?;
        self.slot = Slot::Configured { device, config };
        Ok(())
    }

    fn acquire(&mut self, facing: Facing) -> Result<(B::Device, SessionConfig), SessionError> {
        self.facing = facing;

        let mut device = match self.backend.open(facing) {
            Ok(device) => device,
            Err(e) => {
                self.stats.open_failures += 1;
                tracing::warn!(%facing, error = %e, "failed to open camera");
                return Err(SessionError::HardwareUnavailable(e.to_string()));
            }
        };
        self.stats.opens += 1;

        match self.configure(&mut device) {
            Ok(config) => {
                tracing::info!(%facing, preview_size = ?config.preview_size, "camera configured");
                Ok((device, config))
            }
            Err(e) => {
                device.release();
                Err(e)
            }
        }
    }

    /// Binds `surface` and starts streaming.
    ///
    /// Re-acquires the camera first if it was released. Configuration is
    /// re-derived so a display rotation since open is picked up. Any
    /// failure also raises the host's "camera in use" notification.
    pub fn bind_and_start(&mut self, surface: SurfaceHandle) -> Result<(), SessionError> {
        let result = self.try_bind_and_start(surface);
        if let Err(ref e) = result {
            tracing::warn!(surface = surface.id(), error = %e, "failed to start preview");
            if e.is_in_use_signal() {
                if let Some(callbacks) = &self.callbacks {
                    callbacks.display_camera_in_use_copy(true);
                }
            }
        }
        result
    }

    fn try_bind_and_start(&mut self, surface: SurfaceHandle) -> Result<(), SessionError> {
        let (mut device, config) = match std::mem::replace(&mut self.slot, Slot::Closed) {
            Slot::Closed => self.acquire(self.facing)?,
            Slot::Configured { device, config } => self.reconfigure(device, config)?,
            Slot::Previewing { mut device, config } => {
                device.stop_preview();
                self.reconfigure(device, config)?
            }
        };

        if let Err(e) = Self::start_streaming(&mut device, &config, &surface) {
            self.slot = Slot::Configured { device, config };
            return Err(e);
        }

        self.surface = Some(surface);
        self.stats.previews_started += 1;
        self.slot = Slot::Previewing { device, config };
        tracing::info!(facing = %self.facing, surface = surface.id(), "preview started");
        Ok(())
    }

    /// Re-derives configuration for a held device. On failure the device
    /// is put back in the Configured slot with its previous config.
    fn reconfigure(
        &mut self,
        mut device: B::Device,
        previous: SessionConfig,
    ) -> Result<(B::Device, SessionConfig), SessionError> {
        match self.configure(&mut device) {
            Ok(config) => Ok((device, config)),
            Err(e) => {
                self.slot = Slot::Configured {
                    device,
                    config: previous,
                };
                Err(e)
            }
        }
    }

    fn configure(&self, device: &mut B::Device) -> Result<SessionConfig, SessionError> {
        let sensor = device.sensor_info();
        let sizes = device.supported_preview_sizes();
        let config = SessionConfig::derive(sensor, &self.display, &sizes);
        device
            .set_display_orientation(config.orientation.preview)
            .map_err(|e| SessionError::HardwareUnavailable(e.to_string()))?;
        Ok(config)
    }

    fn start_streaming(
        device: &mut B::Device,
        config: &SessionConfig,
        surface: &SurfaceHandle,
    ) -> Result<(), SessionError> {
        device
            .apply_parameters(&config.preview_parameters())
            .map_err(|e| SessionError::HardwareUnavailable(e.to_string()))?;
        device
            .bind_surface(surface)
            .map_err(|e| SessionError::SurfaceBindingFailed(e.to_string()))?;
        device
            .start_preview()
            .map_err(|e| SessionError::HardwareUnavailable(e.to_string()))
    }

    /// Stops streaming and releases the camera.
    ///
    /// Previewing or Configured → Closed; a no-op when already closed.
    /// Rejected with [`SessionError::CaptureTriggerPending`] while the
    /// hardware still owes a capture callback.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        if self.is_trigger_pending() {
            tracing::debug!("stop deferred: capture trigger outstanding");
            return Err(SessionError::CaptureTriggerPending);
        }

        match std::mem::replace(&mut self.slot, Slot::Closed) {
            Slot::Closed => {
                tracing::trace!("stop on closed session");
            }
            Slot::Configured { device, .. } => {
                device.release();
                tracing::info!(facing = %self.facing, "camera released");
            }
            Slot::Previewing { mut device, .. } => {
                device.stop_preview();
                device.release();
                tracing::info!(facing = %self.facing, "preview stopped, camera released");
            }
        }
        Ok(())
    }

    /// Host notification: a rendering surface became available.
    pub fn on_surface_available(&mut self, surface: SurfaceHandle) -> Result<(), SessionError> {
        self.bind_and_start(surface)
    }

    /// Host notification: the rendering surface was destroyed.
    ///
    /// The surface is forgotten and the camera released so the exclusive
    /// hardware lock is not held without a visible preview.
    pub fn on_surface_destroyed(&mut self) -> Result<(), SessionError> {
        self.stop()?;
        self.surface = None;
        Ok(())
    }

    /// Switches between front and back cameras.
    ///
    /// A no-op on single-camera devices. Otherwise stops, opens the other
    /// facing and, if a surface is known, restarts the preview on it.
    ///
    /// If the other camera cannot be started the previous facing is
    /// restored and, when it was held before, reopened on the same surface.
    /// The error from the failed swap is returned either way and no swap
    /// is counted.
    pub fn swap_facing(&mut self) -> Result<(), SessionError> {
        if !self.has_multiple_cameras() {
            tracing::debug!("swap ignored: only one camera present");
            return Ok(());
        }
        let previous = self.facing;
        let was_open = self.state() != SessionState::Closed;
        self.stop()?;

        let target = previous.other();
        tracing::info!(facing = %target, "swapping camera");

        match self.resume(target) {
            Ok(()) => {
                self.stats.facing_swaps += 1;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(facing = %target, error = %e, "swap failed, restoring previous camera");
                self.facing = previous;
                if was_open {
                    if let Err(restore) = self.resume(previous) {
                        tracing::warn!(facing = %previous, error = %restore, "failed to restore camera");
                    }
                }
                Err(e)
            }
        }
    }

    /// Opens `facing` and restarts streaming on the known surface, if any.
    fn resume(&mut self, facing: Facing) -> Result<(), SessionError> {
        self.facing = facing;
        match self.surface {
            Some(surface) => self.bind_and_start(surface),
            None => self.open(facing),
        }
    }

    /// Hands a one-shot capture trigger to the hardware.
    ///
    /// The orientation is re-derived first if the display rotated since
    /// streaming started, so the still is tagged with the current rotation.
    /// `on_taken` runs once the hardware delivers the bytes and receives
    /// the rotation they were tagged with. Only one trigger may be
    /// outstanding; lifecycle operations are rejected until it fires.
    pub(crate) fn trigger_capture<F>(&mut self, on_taken: F) -> Result<Rotation, CaptureError>
    where
        F: FnOnce(Vec<u8>, Rotation) + Send + 'static,
    {
        let Slot::Previewing { device, config } = &mut self.slot else {
            return Err(CaptureError::NotPreviewing);
        };
        let Some(guard) = BusyGuard::try_arm(&self.trigger_pending) else {
            return Err(CaptureError::CaptureInProgress);
        };

        let display_rotation = self.display.current_rotation();
        if display_rotation != config.display_rotation {
            let refreshed = config.rotated(display_rotation);
            device
                .set_display_orientation(refreshed.orientation.preview)
                .and_then(|()| device.apply_parameters(&refreshed.preview_parameters()))
                .map_err(|e| CaptureError::Hardware(e.to_string()))?;
            tracing::debug!(
                display = %display_rotation,
                capture = %refreshed.orientation.capture,
                "display rotated during preview, orientation refreshed"
            );
            *config = refreshed;
        }

        let rotation = config.orientation.capture;
        let wrapped: PictureCallback = Box::new(move |bytes| {
            drop(guard);
            on_taken(bytes, rotation);
        });

        device
            .take_picture(wrapped)
            .map_err(|e| CaptureError::Hardware(e.to_string()))?;
        Ok(rotation)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match self.slot {
            Slot::Closed => SessionState::Closed,
            Slot::Configured { .. } => SessionState::Configured,
            Slot::Previewing { .. } => SessionState::Previewing,
        }
    }

    /// True while streaming.
    pub fn is_previewing(&self) -> bool {
        matches!(self.slot, Slot::Previewing { .. })
    }

    /// Facing the session targets.
    pub fn current_facing(&self) -> Facing {
        self.facing
    }

    /// Active configuration, if the camera is held.
    pub fn config(&self) -> Option<&SessionConfig> {
        match &self.slot {
            Slot::Closed => None,
            Slot::Configured { config, .. } | Slot::Previewing { config, .. } => Some(config),
        }
    }

    /// Last surface the preview was bound to, if still valid.
    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    /// True while the hardware owes a capture callback.
    pub fn is_trigger_pending(&self) -> bool {
        self.trigger_pending.load(Ordering::SeqCst)
    }

    /// True if the device has more than one camera.
    pub fn has_multiple_cameras(&self) -> bool {
        self.backend.camera_count() > 1
    }

    /// True when the host is laid out in portrait.
    pub fn is_portrait(&self) -> bool {
        self.display.is_portrait()
    }

    /// Snapshot of lifecycle counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            state: self.state(),
            facing: self.facing,
            ..self.stats
        }
    }
}

impl<B: CameraBackend, D: DisplayProvider> std::fmt::Debug for CameraSession<B, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("facing", &self.facing)
            .field("state", &self.state())
            .field("surface", &self.surface)
            .field("trigger_pending", &self.is_trigger_pending())
            .finish()
    }
}

impl<B: CameraBackend, D: DisplayProvider> Drop for CameraSession<B, D> {
    fn drop(&mut self) {
        if let Slot::Configured { device, .. } | Slot::Previewing { device, .. } =
            std::mem::replace(&mut self.slot, Slot::Closed)
        {
            device.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{FixedDisplay, MockBackend};
    use crate::preview::Dimension;
    use crate::ResourceLocator;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct InUseCounter(AtomicUsize);

    impl HostCallbacks for InUseCounter {
        fn display_camera_in_use_copy(&self, in_use: bool) {
            if in_use {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_image_capture(&self, _locator: &ResourceLocator) {}
    }

    fn portrait_phone() -> FixedDisplay {
        FixedDisplay::new(Dimension::new(1080, 1920))
    }

    #[test]
    fn test_open_configures_without_streaming() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, portrait_phone());

        session.open(Facing::Back).unwrap();
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(probe.previews_started(), 0);
        assert_eq!(probe.last_display_orientation(), Some(Rotation::Deg90));
    }

    #[test]
    fn test_open_twice_rejected() {
        let mut session = CameraSession::new(MockBackend::new(), portrait_phone());
        session.open(Facing::Back).unwrap();
        assert_eq!(session.open(Facing::Back), Err(SessionError::AlreadyOpen));
    }

    #[test]
    fn test_open_stop_start_cycle_ends_previewing() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, portrait_phone());
        let surface = SurfaceHandle::new(7);

        session.open(Facing::Back).unwrap();
        session.bind_and_start(surface).unwrap();
        assert!(session.is_previewing());

        session.stop().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(!probe.is_held(Facing::Back));

        session.bind_and_start(surface).unwrap();
        assert!(session.is_previewing());
        assert_eq!(probe.opens(), 2);
        assert_eq!(probe.previews_started(), 2);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, portrait_phone());

        session.open(Facing::Back).unwrap();
        session.stop().unwrap();
        session.stop().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(probe.releases(), 1);
    }

    #[test]
    fn test_busy_hardware_signals_in_use() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        probe.set_busy(true);
        let callbacks = Arc::new(InUseCounter::default());
        let mut session =
            CameraSession::new(backend, portrait_phone()).with_callbacks(callbacks.clone());

        let err = session.bind_and_start(SurfaceHandle::new(1)).unwrap_err();
        assert!(matches!(err, SessionError::HardwareUnavailable(_)));
        assert_eq!(callbacks.0.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.stats().open_failures, 1);
    }

    #[test]
    fn test_bind_failure_signals_in_use_and_keeps_configured() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        probe.set_fail_bind(true);
        let callbacks = Arc::new(InUseCounter::default());
        let mut session =
            CameraSession::new(backend, portrait_phone()).with_callbacks(callbacks.clone());

        let err = session.bind_and_start(SurfaceHandle::new(1)).unwrap_err();
        assert!(matches!(err, SessionError::SurfaceBindingFailed(_)));
        assert!(err.is_in_use_signal());
        assert_eq!(callbacks.0.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), SessionState::Configured);

        probe.set_fail_bind(false);
        session.bind_and_start(SurfaceHandle::new(1)).unwrap();
        assert!(session.is_previewing());
    }

    #[test]
    fn test_swap_on_single_camera_is_noop() {
        let backend = MockBackend::single();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, portrait_phone());
        session.bind_and_start(SurfaceHandle::new(1)).unwrap();

        session.swap_facing().unwrap();
        assert_eq!(session.current_facing(), Facing::Back);
        assert!(session.is_previewing());
        assert_eq!(probe.opens(), 1);
    }

    #[test]
    fn test_swap_restarts_preview_on_other_facing() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, portrait_phone());
        session.bind_and_start(SurfaceHandle::new(3)).unwrap();
        let back_config = *session.config().unwrap();

        session.swap_facing().unwrap();
        assert_eq!(session.current_facing(), Facing::Front);
        assert!(session.is_previewing());
        assert!(!probe.is_held(Facing::Back));
        assert!(probe.is_held(Facing::Front));

        let front_config = *session.config().unwrap();
        assert_eq!(front_config.facing, Facing::Front);
        assert_ne!(front_config.orientation, back_config.orientation);
        assert_eq!(session.stats().facing_swaps, 1);
    }

    #[test]
    fn test_swap_without_surface_stops_at_configured() {
        let mut session = CameraSession::new(MockBackend::new(), portrait_phone());
        session.open(Facing::Back).unwrap();

        session.swap_facing().unwrap();
        assert_eq!(session.state(), SessionState::Configured);
        assert_eq!(session.current_facing(), Facing::Front);
    }

    #[test]
    fn test_failed_swap_restores_previous_camera() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, portrait_phone());
        session.bind_and_start(SurfaceHandle::new(3)).unwrap();
        probe.set_busy_facing(Facing::Front, true);

        let err = session.swap_facing().unwrap_err();
        assert!(matches!(err, SessionError::HardwareUnavailable(_)));
        assert_eq!(session.current_facing(), Facing::Back);
        assert!(session.is_previewing());
        assert!(probe.is_held(Facing::Back));
        assert!(!probe.is_held(Facing::Front));
        assert_eq!(session.stats().facing_swaps, 0);

        probe.set_busy_facing(Facing::Front, false);
        session.swap_facing().unwrap();
        assert_eq!(session.current_facing(), Facing::Front);
        assert_eq!(session.stats().facing_swaps, 1);
    }

    #[test]
    fn test_failed_swap_with_all_cameras_busy_ends_closed() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, portrait_phone());
        session.bind_and_start(SurfaceHandle::new(3)).unwrap();
        probe.set_busy(true);

        assert!(session.swap_facing().is_err());
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.current_facing(), Facing::Back);
        assert_eq!(session.stats().facing_swaps, 0);
        assert_eq!(session.surface(), Some(SurfaceHandle::new(3)));
    }

    #[test]
    fn test_only_one_trigger_outstanding() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        probe.set_hold_pictures(true);
        let mut session = CameraSession::new(backend, portrait_phone());
        session.bind_and_start(SurfaceHandle::new(1)).unwrap();

        session.trigger_capture(|_, _| {}).unwrap();
        assert_eq!(
            session.trigger_capture(|_, _| {}),
            Err(CaptureError::CaptureInProgress)
        );
        assert_eq!(probe.pictures_taken(), 1);
        assert_eq!(session.stop(), Err(SessionError::CaptureTriggerPending));

        probe.deliver_held();
        assert!(!session.is_trigger_pending());
        session.stop().unwrap();
    }

    #[test]
    fn test_trigger_refreshes_rotation_after_display_turns() {
        let display = Arc::new(portrait_phone());
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, Arc::clone(&display));
        session.bind_and_start(SurfaceHandle::new(1)).unwrap();

        display.set_rotation(Rotation::Deg270);
        let rotation = session.trigger_capture(|_, _| {}).unwrap();

        // Back sensor at 90: capture (90 + 270) % 360, preview (90 - 270 + 360) % 360.
        assert_eq!(rotation, Rotation::Deg0);
        assert_eq!(probe.last_parameters().unwrap().capture_rotation, Rotation::Deg0);
        assert_eq!(probe.last_display_orientation(), Some(Rotation::Deg180));
        let config = session.config().unwrap();
        assert_eq!(config.display_rotation, Rotation::Deg270);
        assert_eq!(config.orientation.capture, Rotation::Deg0);
        assert!(session.is_previewing());
    }

    #[test]
    fn test_rotation_picked_up_on_restart() {
        let display = Arc::new(portrait_phone());
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, Arc::clone(&display));

        session.bind_and_start(SurfaceHandle::new(1)).unwrap();
        assert_eq!(
            probe.last_parameters().unwrap().capture_rotation,
            Rotation::Deg90
        );

        display.set_rotation(Rotation::Deg90);
        session.on_surface_destroyed().unwrap();
        session.on_surface_available(SurfaceHandle::new(2)).unwrap();
        assert_eq!(
            probe.last_parameters().unwrap().capture_rotation,
            Rotation::Deg180
        );
        assert_eq!(session.config().unwrap().display_rotation, Rotation::Deg90);
    }

    #[test]
    fn test_surface_destroyed_releases_hardware() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, portrait_phone());
        session.on_surface_available(SurfaceHandle::new(1)).unwrap();

        session.on_surface_destroyed().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(session.surface(), None);
        assert!(!probe.is_held(Facing::Back));
    }

    #[test]
    fn test_drop_releases_hardware() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        {
            let mut session = CameraSession::new(backend, portrait_phone());
            session.bind_and_start(SurfaceHandle::new(1)).unwrap();
        }
        assert_eq!(probe.releases(), 1);
        assert!(!probe.is_held(Facing::Back));
    }
}
