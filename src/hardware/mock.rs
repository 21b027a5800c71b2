//! Scriptable in-memory camera hardware.
//!
//! Models the behavior that matters to session logic: exclusive per-facing
//! locks, busy and bind failures, and a picture callback that can be held
//! back to simulate a slow sensor.

use super::device::{
    CameraBackend, CameraDevice, HardwareError, PictureCallback, PreviewParameters, SensorInfo,
    SurfaceHandle,
};
use crate::orientation::{Facing, Rotation};
use crate::preview::Dimension;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn facing_slot(facing: Facing) -> usize {
    match facing {
        Facing::Back => 0,
        Facing::Front => 1,
    }
}

/// Minimal JPEG-framed payload used when no payload is configured.
const DEFAULT_PAYLOAD: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9];

/// Description of one physical sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSensor {
    /// Which way the sensor faces.
    pub facing: Facing,
    /// Mounting angle.
    pub mount: Rotation,
    /// Preview sizes the sensor reports.
    pub preview_sizes: Vec<Dimension>,
}

impl MockSensor {
    /// A rear sensor mounted at 90 degrees, as on most phones.
    pub fn back() -> Self {
        Self {
            facing: Facing::Back,
            mount: Rotation::Deg90,
            preview_sizes: Self::common_sizes(),
        }
    }

    /// A front sensor mounted at 270 degrees.
    pub fn front() -> Self {
        Self {
            facing: Facing::Front,
            mount: Rotation::Deg270,
            preview_sizes: Self::common_sizes(),
        }
    }

    fn common_sizes() -> Vec<Dimension> {
        vec![
            Dimension::new(1920, 1080),
            Dimension::new(1280, 720),
            Dimension::new(640, 480),
        ]
    }
}

/// Shared view into mock hardware state.
///
/// Held by tests alongside the backend to inject failures and count calls.
#[derive(Default)]
pub struct MockProbe {
    busy: AtomicBool,
    busy_facing: [AtomicBool; 2],
    fail_capture: AtomicBool,
    fail_bind: AtomicBool,
    fail_start: AtomicBool,
    hold_pictures: AtomicBool,
    held: [AtomicBool; 2],
    opens: AtomicUsize,
    releases: AtomicUsize,
    surfaces_bound: AtomicUsize,
    previews_started: AtomicUsize,
    pictures_taken: AtomicUsize,
    payload: Mutex<Option<Vec<u8>>>,
    pending: Mutex<Vec<PictureCallback>>,
    last_parameters: Mutex<Option<PreviewParameters>>,
    last_display_orientation: Mutex<Option<Rotation>>,
}

impl MockProbe {
    /// Simulates another client holding every camera.
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::SeqCst);
    }

    /// Simulates another client holding only the camera with `facing`.
    pub fn set_busy_facing(&self, facing: Facing, busy: bool) {
        self.busy_facing[facing_slot(facing)].store(busy, Ordering::SeqCst);
    }

    /// Makes capture triggers fail.
    pub fn set_fail_capture(&self, fail: bool) {
        self.fail_capture.store(fail, Ordering::SeqCst);
    }

    /// Makes surface binding fail with an i/o error.
    pub fn set_fail_bind(&self, fail: bool) {
        self.fail_bind.store(fail, Ordering::SeqCst);
    }

    /// Makes starting the preview fail.
    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Holds picture callbacks until [`MockProbe::deliver_held`] is called.
    pub fn set_hold_pictures(&self, hold: bool) {
        self.hold_pictures.store(hold, Ordering::SeqCst);
    }

    /// Sets the bytes delivered by the next captures.
    pub fn set_payload(&self, payload: Vec<u8>) {
        *lock(&self.payload) = Some(payload);
    }

    /// Delivers every held picture callback. Returns how many fired.
    pub fn deliver_held(&self) -> usize {
        let pending: Vec<PictureCallback> = lock(&self.pending).drain(..).collect();
        let count = pending.len();
        for callback in pending {
            callback(self.payload());
        }
        count
    }

    /// Returns the bytes a capture delivers.
    pub fn payload(&self) -> Vec<u8> {
        lock(&self.payload)
            .clone()
            .unwrap_or_else(|| DEFAULT_PAYLOAD.to_vec())
    }

    /// True while a camera with this facing is held open.
    pub fn is_held(&self, facing: Facing) -> bool {
        self.held[facing_slot(facing)].load(Ordering::SeqCst)
    }

    /// Successful opens so far.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Releases so far.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Successful surface binds so far.
    pub fn surfaces_bound(&self) -> usize {
        self.surfaces_bound.load(Ordering::SeqCst)
    }

    /// Successful preview starts so far.
    pub fn previews_started(&self) -> usize {
        self.previews_started.load(Ordering::SeqCst)
    }

    /// Capture triggers so far.
    pub fn pictures_taken(&self) -> usize {
        self.pictures_taken.load(Ordering::SeqCst)
    }

    /// Parameters most recently applied by any device.
    pub fn last_parameters(&self) -> Option<PreviewParameters> {
        *lock(&self.last_parameters)
    }

    /// Display orientation most recently set by any device.
    pub fn last_display_orientation(&self) -> Option<Rotation> {
        *lock(&self.last_display_orientation)
    }
}

impl std::fmt::Debug for MockProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProbe")
            .field("opens", &self.opens())
            .field("releases", &self.releases())
            .field("previews_started", &self.previews_started())
            .field("pictures_taken", &self.pictures_taken())
            .field("pending_pictures", &lock(&self.pending).len())
            .finish()
    }
}

/// In-memory camera service.
#[derive(Debug)]
pub struct MockBackend {
    sensors: Vec<MockSensor>,
    probe: Arc<MockProbe>,
}

impl MockBackend {
    /// A device with a back and a front camera.
    pub fn new() -> Self {
        Self::with_sensors(vec![MockSensor::back(), MockSensor::front()])
    }

    /// A device with only a back camera.
    pub fn single() -> Self {
        Self::with_sensors(vec![MockSensor::back()])
    }

    /// A device with the given sensors.
    pub fn with_sensors(sensors: Vec<MockSensor>) -> Self {
        Self {
            sensors,
            probe: Arc::new(MockProbe::default()),
        }
    }

    /// Returns a handle for inspecting and scripting the hardware.
    pub fn probe(&self) -> Arc<MockProbe> {
        Arc::clone(&self.probe)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for MockBackend {
    type Device = MockDevice;

    fn camera_count(&self) -> usize {
        self.sensors.len()
    }

    fn open(&mut self, facing: Facing) -> Result<MockDevice, HardwareError> {
        if self.probe.busy.load(Ordering::SeqCst) {
            return Err(HardwareError::InUse("held by another client".into()));
        }
        let sensor = self
            .sensors
            .iter()
            .find(|s| s.facing == facing)
            .cloned()
            .ok_or(HardwareError::NotFound(facing))?;
        if self.probe.busy_facing[facing_slot(facing)].load(Ordering::SeqCst) {
            return Err(HardwareError::InUse(format!("{facing} camera held by another client")));
        }

        if self.probe.held[facing_slot(facing)].swap(true, Ordering::SeqCst) {
            return Err(HardwareError::InUse(format!("{facing} camera already open")));
        }
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%facing, mount = %sensor.mount, "mock camera opened");

        Ok(MockDevice {
            sensor,
            probe: Arc::clone(&self.probe),
            surface: None,
            streaming: false,
        })
    }
}

/// An opened mock camera.
#[derive(Debug)]
pub struct MockDevice {
    sensor: MockSensor,
    probe: Arc<MockProbe>,
    surface: Option<SurfaceHandle>,
    streaming: bool,
}

impl CameraDevice for MockDevice {
    fn sensor_info(&self) -> SensorInfo {
        SensorInfo {
            facing: self.sensor.facing,
            mount: self.sensor.mount,
        }
    }

    fn supported_preview_sizes(&self) -> Vec<Dimension> {
        self.sensor.preview_sizes.clone()
    }

    fn set_display_orientation(&mut self, rotation: Rotation) -> Result<(), HardwareError> {
        *lock(&self.probe.last_display_orientation) = Some(rotation);
        Ok(())
    }

    fn apply_parameters(&mut self, params: &PreviewParameters) -> Result<(), HardwareError> {
        if let Some(size) = params.preview_size {
            if !self.sensor.preview_sizes.contains(&size) {
                return Err(HardwareError::Rejected(format!("unsupported preview size {size}")));
            }
        }
        *lock(&self.probe.last_parameters) = Some(*params);
        Ok(())
    }

    fn bind_surface(&mut self, surface: &SurfaceHandle) -> Result<(), HardwareError> {
        if self.probe.fail_bind.load(Ordering::SeqCst) {
            return Err(HardwareError::Io(format!("surface {} is not valid", surface.id())));
        }
        self.surface = Some(*surface);
        self.probe.surfaces_bound.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), HardwareError> {
        if self.probe.fail_start.load(Ordering::SeqCst) {
            return Err(HardwareError::InUse("preview start refused".into()));
        }
        if self.surface.is_none() {
            return Err(HardwareError::Rejected("no surface bound".into()));
        }
        self.streaming = true;
        self.probe.previews_started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.streaming = false;
    }

    fn take_picture(&mut self, on_taken: PictureCallback) -> Result<(), HardwareError> {
        if !self.streaming {
            return Err(HardwareError::Rejected("preview is not running".into()));
        }
        if self.probe.fail_capture.load(Ordering::SeqCst) {
            return Err(HardwareError::Io("capture trigger refused".into()));
        }
        self.probe.pictures_taken.fetch_add(1, Ordering::SeqCst);
        if self.probe.hold_pictures.load(Ordering::SeqCst) {
            lock(&self.probe.pending).push(on_taken);
        } else {
            on_taken(self.probe.payload());
        }
        Ok(())
    }

    fn release(self) {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(facing = %self.sensor.facing, "mock camera released");
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.probe.held[facing_slot(self.sensor.facing)].store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_is_exclusive_per_facing() {
        let mut backend = MockBackend::new();
        let probe = backend.probe();

        let device = backend.open(Facing::Back).unwrap();
        assert!(probe.is_held(Facing::Back));
        assert!(matches!(
            backend.open(Facing::Back),
            Err(HardwareError::InUse(_))
        ));

        device.release();
        assert!(!probe.is_held(Facing::Back));
        assert!(backend.open(Facing::Back).is_ok());
    }

    #[test]
    fn test_missing_facing_not_found() {
        let mut backend = MockBackend::single();
        assert_eq!(
            backend.open(Facing::Front).err(),
            Some(HardwareError::NotFound(Facing::Front))
        );
    }

    #[test]
    fn test_held_picture_delivered_later() {
        let mut backend = MockBackend::single();
        let probe = backend.probe();
        probe.set_hold_pictures(true);
        probe.set_payload(vec![1, 2, 3]);

        let mut device = backend.open(Facing::Back).unwrap();
        device.bind_surface(&SurfaceHandle::new(1)).unwrap();
        device.start_preview().unwrap();

        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);
        device
            .take_picture(Box::new(move |bytes| *lock(&sink) = Some(bytes)))
            .unwrap();
        assert!(lock(&received).is_none());

        assert_eq!(probe.deliver_held(), 1);
        assert_eq!(lock(&received).clone(), Some(vec![1, 2, 3]));
    }
}
