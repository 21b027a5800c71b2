//! Still-capture orchestration.

use super::{CaptureError, CaptureRequest, ResourceLocator, Storage};
use crate::hardware::{CameraBackend, DisplayProvider};
use crate::orientation::Rotation;
use crate::session::{BusyGuard, CameraSession, HostCallbacks};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

type Completion = Result<ResourceLocator, CaptureError>;

/// Completion handle for one accepted capture.
///
/// Dropping it does not cancel the capture; the host callbacks still fire.
#[derive(Debug)]
pub struct PendingCapture {
    sequence: u64,
    rx: Receiver<Completion>,
}

impl PendingCapture {
    /// Capture number assigned by the coordinator.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Blocks until the capture is persisted or fails.
    pub fn wait(self) -> Completion {
        self.rx.recv().unwrap_or(Err(CaptureError::Abandoned))
    }

    /// Blocks for at most `timeout`. `None` if still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Completion> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(CaptureError::Abandoned)),
        }
    }

    /// Returns the result if the capture already finished.
    pub fn try_result(&self) -> Option<Completion> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(CaptureError::Abandoned)),
        }
    }
}

/// Capture counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Captures handed to the hardware.
    pub triggered: u64,
    /// Captures persisted successfully.
    pub succeeded: u64,
    /// Accepted captures that failed afterwards.
    pub failed: u64,
    /// Requests rejected on a local precondition.
    pub rejected: u64,
    /// Total bytes written.
    pub bytes_persisted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    triggered: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    bytes_persisted: AtomicU64,
}

/// Everything the persistence thread needs, moved in by value.
struct PersistJob {
    storage: Arc<dyn Storage>,
    callbacks: Option<Arc<dyn HostCallbacks>>,
    counters: Arc<Counters>,
    in_flight: BusyGuard,
    tx: Sender<Completion>,
    sequence: u64,
}

impl PersistJob {
    fn run(self, bytes: Vec<u8>, rotation: Rotation) {
        let len = bytes.len() as u64;
        let result = CaptureRequest::new(bytes, self.sequence, rotation).persist(&*self.storage);
        self.finish(result, len);
    }

    fn finish(self, result: Completion, len: u64) {
        match &result {
            Ok(locator) => {
                self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
                self.counters.bytes_persisted.fetch_add(len, Ordering::Relaxed);
                if let Some(callbacks) = &self.callbacks {
                    callbacks.on_image_capture(locator);
                }
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(sequence = self.sequence, error = %e, "capture failed");
                if let Some(callbacks) = &self.callbacks {
                    callbacks.on_capture_failed(e);
                }
            }
        }
        // Free the slot before reporting so a waiter can capture again.
        drop(self.in_flight);
        let _ = self.tx.send(result);
    }

    fn spawn(self, bytes: Vec<u8>, rotation: Rotation) {
        let sequence = self.sequence;
        let spawned = std::thread::Builder::new()
            .name(format!("capture-persist-{sequence}"))
            .spawn(move || self.run(bytes, rotation));
        if let Err(e) = spawned {
            // The job died with the closure: the slot is free and the
            // pending handle resolves to `Abandoned`.
            tracing::warn!(sequence, error = %e, "failed to spawn persistence thread");
        }
    }
}

/// Coordinates one-at-a-time still captures for a session.
///
/// A second capture while one is outstanding (hardware trigger or
/// persistence) is rejected with [`CaptureError::CaptureInProgress`].
pub struct CaptureCoordinator {
    storage: Arc<dyn Storage>,
    callbacks: Option<Arc<dyn HostCallbacks>>,
    in_flight: Arc<AtomicBool>,
    counters: Arc<Counters>,
    sequence: u64,
}

impl CaptureCoordinator {
    /// Creates a coordinator persisting through `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            callbacks: None,
            in_flight: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(Counters::default()),
            sequence: 0,
        }
    }

    /// Sets the host notification sink.
    pub fn with_callbacks(mut self, callbacks: Arc<dyn HostCallbacks>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    /// Triggers a still capture on a previewing session.
    ///
    /// Returns immediately. Persistence runs on a background thread and
    /// reports through the host callbacks and the returned handle.
    pub fn capture<B, D>(
        &mut self,
        session: &mut CameraSession<B, D>,
    ) -> Result<PendingCapture, CaptureError>
    where
        B: CameraBackend,
        D: DisplayProvider,
    {
        if !session.is_previewing() {
            return Err(self.reject(CaptureError::NotPreviewing));
        }
        let Some(in_flight) = BusyGuard::try_arm(&self.in_flight) else {
            return Err(self.reject(CaptureError::CaptureInProgress));
        };

        let sequence = self.sequence + 1;
        let (tx, rx) = mpsc::channel();

        let job = PersistJob {
            storage: Arc::clone(&self.storage),
            callbacks: self.callbacks.clone(),
            counters: Arc::clone(&self.counters),
            in_flight,
            tx,
            sequence,
        };
        let on_taken = move |bytes: Vec<u8>, rotation: Rotation| {
            tracing::debug!(sequence, bytes = bytes.len(), "picture delivered");
            job.spawn(bytes, rotation);
        };

        // A refused trigger drops the job, freeing the in-flight slot.
        let rotation = match session.trigger_capture(on_taken) {
            Ok(rotation) => rotation,
            Err(e) if e.is_precondition() => return Err(self.reject(e)),
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(sequence, error = %e, "capture trigger failed");
                return Err(e);
            }
        };
        self.sequence = sequence;
        self.counters.triggered.fetch_add(1, Ordering::Relaxed);
        tracing::info!(sequence, %rotation, "capture triggered");

        Ok(PendingCapture { sequence, rx })
    }

    fn reject(&self, error: CaptureError) -> CaptureError {
        self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(error = %error, "capture rejected");
        error
    }

    /// True while a capture is outstanding.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Snapshot of capture counters.
    pub fn stats(&self) -> CaptureStats {
        CaptureStats {
            triggered: self.counters.triggered.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            bytes_persisted: self.counters.bytes_persisted.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CaptureCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureCoordinator")
            .field("sequence", &self.sequence)
            .field("busy", &self.is_busy())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{MediaKind, StorageError};
    use crate::hardware::{FixedDisplay, MockBackend, MockProbe, SurfaceHandle};
    use crate::preview::Dimension;
    use crate::session::{SessionError, SessionState};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        captured: Mutex<Vec<ResourceLocator>>,
        failed: Mutex<Vec<CaptureError>>,
    }

    impl HostCallbacks for Recorder {
        fn display_camera_in_use_copy(&self, _in_use: bool) {}

        fn on_image_capture(&self, locator: &ResourceLocator) {
            self.captured.lock().unwrap().push(locator.clone());
        }

        fn on_capture_failed(&self, error: &CaptureError) {
            self.failed.lock().unwrap().push(error.clone());
        }
    }

    struct Unavailable;

    impl Storage for Unavailable {
        fn allocate_destination(&self, _kind: MediaKind) -> Result<PathBuf, StorageError> {
            Err(StorageError::NotADirectory(PathBuf::from("/nowhere")))
        }
    }

    struct TempStorage(PathBuf);

    impl Storage for TempStorage {
        fn allocate_destination(&self, _kind: MediaKind) -> Result<PathBuf, StorageError> {
            std::fs::create_dir_all(&self.0).unwrap();
            let n = std::fs::read_dir(&self.0).unwrap().count();
            Ok(self.0.join(format!("IMG_{n}.jpg")))
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "quick-camera-coordinator-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn previewing_session() -> (CameraSession<MockBackend, FixedDisplay>, Arc<MockProbe>) {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session =
            CameraSession::new(backend, FixedDisplay::new(Dimension::new(1080, 1920)));
        session.bind_and_start(SurfaceHandle::new(1)).unwrap();
        (session, probe)
    }

    #[test]
    fn test_capture_requires_previewing() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session =
            CameraSession::new(backend, FixedDisplay::new(Dimension::new(1080, 1920)));
        session.open(crate::Facing::Back).unwrap();
        let mut coordinator = CaptureCoordinator::new(Arc::new(Unavailable));

        let err = coordinator.capture(&mut session).unwrap_err();
        assert_eq!(err, CaptureError::NotPreviewing);
        assert!(err.is_precondition());
        assert_eq!(probe.pictures_taken(), 0);
        assert_eq!(coordinator.stats().rejected, 1);
    }

    #[test]
    fn test_successful_capture_notifies_once() {
        let dir = scratch_dir("success");
        let (mut session, probe) = previewing_session();
        probe.set_payload(vec![0xFF, 0xD8, 1, 2, 3, 0xFF, 0xD9]);
        let recorder = Arc::new(Recorder::default());
        let mut coordinator = CaptureCoordinator::new(Arc::new(TempStorage(dir.clone())))
            .with_callbacks(recorder.clone());

        let locator = coordinator.capture(&mut session).unwrap().wait().unwrap();

        let captured = recorder.captured.lock().unwrap().clone();
        assert_eq!(captured, vec![locator.clone()]);
        assert!(!locator.is_empty());
        assert_eq!(std::fs::read(locator.path()).unwrap(), probe.payload());
        assert_eq!(coordinator.stats().succeeded, 1);
        assert_eq!(coordinator.stats().bytes_persisted, 7);
        assert!(!coordinator.is_busy());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_storage_failure_keeps_session_previewing() {
        let (mut session, _probe) = previewing_session();
        let recorder = Arc::new(Recorder::default());
        let mut coordinator =
            CaptureCoordinator::new(Arc::new(Unavailable)).with_callbacks(recorder.clone());

        let result = coordinator.capture(&mut session).unwrap().wait();
        assert!(matches!(result, Err(CaptureError::StorageUnavailable(_))));
        assert!(recorder.captured.lock().unwrap().is_empty());
        assert_eq!(recorder.failed.lock().unwrap().len(), 1);
        assert_eq!(session.state(), SessionState::Previewing);
        assert_eq!(coordinator.stats().failed, 1);

        // The session stays usable.
        assert!(coordinator.capture(&mut session).is_ok());
    }

    #[test]
    fn test_second_capture_rejected_while_outstanding() {
        let dir = scratch_dir("in-progress");
        let (mut session, probe) = previewing_session();
        probe.set_hold_pictures(true);
        let mut coordinator = CaptureCoordinator::new(Arc::new(TempStorage(dir.clone())));

        let pending = coordinator.capture(&mut session).unwrap();
        assert_eq!(
            coordinator.capture(&mut session).unwrap_err(),
            CaptureError::CaptureInProgress
        );
        assert_eq!(probe.pictures_taken(), 1);
        assert!(pending.try_result().is_none());

        probe.deliver_held();
        assert!(pending.wait().is_ok());
        assert!(coordinator.capture(&mut session).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_lifecycle_blocked_while_trigger_outstanding() {
        let dir = scratch_dir("trigger");
        let (mut session, probe) = previewing_session();
        probe.set_hold_pictures(true);
        let mut coordinator = CaptureCoordinator::new(Arc::new(TempStorage(dir.clone())));

        let pending = coordinator.capture(&mut session).unwrap();
        assert!(session.is_trigger_pending());
        assert_eq!(session.stop(), Err(SessionError::CaptureTriggerPending));
        assert_eq!(
            session.swap_facing(),
            Err(SessionError::CaptureTriggerPending)
        );
        assert!(session.is_previewing());

        probe.deliver_held();
        assert!(!session.is_trigger_pending());
        session.stop().unwrap();
        assert!(pending.wait().is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_second_coordinator_cannot_trigger_same_session() {
        let dir = scratch_dir("two-coordinators");
        let (mut session, probe) = previewing_session();
        probe.set_hold_pictures(true);
        let storage: Arc<dyn Storage> = Arc::new(TempStorage(dir.clone()));
        let mut first = CaptureCoordinator::new(Arc::clone(&storage));
        let mut second = CaptureCoordinator::new(storage);

        let pending = first.capture(&mut session).unwrap();
        assert_eq!(
            second.capture(&mut session).unwrap_err(),
            CaptureError::CaptureInProgress
        );
        assert_eq!(probe.pictures_taken(), 1);
        assert_eq!(second.stats().rejected, 1);
        assert!(!second.is_busy());

        probe.deliver_held();
        assert!(pending.wait().is_ok());
        assert!(!session.is_trigger_pending());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_hardware_trigger_failure_is_counted_and_frees_slot() {
        let dir = scratch_dir("trigger-failure");
        let (mut session, probe) = previewing_session();
        probe.set_fail_capture(true);
        let mut coordinator = CaptureCoordinator::new(Arc::new(TempStorage(dir.clone())));

        let err = coordinator.capture(&mut session).unwrap_err();
        assert!(matches!(err, CaptureError::Hardware(_)));
        assert!(!err.is_precondition());
        assert_eq!(coordinator.stats().failed, 1);
        assert_eq!(coordinator.stats().triggered, 0);
        assert!(!coordinator.is_busy());
        assert!(!session.is_trigger_pending());
        assert!(session.is_previewing());

        probe.set_fail_capture(false);
        let pending = coordinator.capture(&mut session).unwrap();
        assert_eq!(pending.sequence(), 1);
        assert!(pending.wait().is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_capture_uses_rotation_after_display_turns() {
        let dir = scratch_dir("rotated");
        let display = Arc::new(FixedDisplay::new(Dimension::new(1080, 1920)));
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut session = CameraSession::new(backend, Arc::clone(&display));
        session.bind_and_start(SurfaceHandle::new(1)).unwrap();
        let mut coordinator = CaptureCoordinator::new(Arc::new(TempStorage(dir.clone())));

        display.set_rotation(Rotation::Deg90);
        assert!(coordinator.capture(&mut session).unwrap().wait().is_ok());

        // Back sensor at 90 on a display turned 90: capture (90 + 90).
        assert_eq!(
            probe.last_parameters().unwrap().capture_rotation,
            Rotation::Deg180
        );
        assert_eq!(probe.last_display_orientation(), Some(Rotation::Deg0));
        assert_eq!(session.config().unwrap().display_rotation, Rotation::Deg90);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_dropped_hardware_callback_frees_slot() {
        let (mut session, probe) = previewing_session();
        probe.set_hold_pictures(true);
        let mut coordinator = CaptureCoordinator::new(Arc::new(Unavailable));

        let pending = coordinator.capture(&mut session).unwrap();
        drop(session);
        // The last probe reference owns the held callback; dropping it
        // discards the callback uncalled.
        drop(probe);
        assert_eq!(pending.wait(), Err(CaptureError::Abandoned));
        assert!(!coordinator.is_busy());
    }
}
