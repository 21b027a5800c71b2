//! Backend and device traits.

use crate::orientation::{Facing, Rotation};
use crate::preview::Dimension;
use thiserror::Error;

/// Errors reported by camera hardware.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HardwareError {
    /// Another client holds the camera.
    #[error("camera is already in use: {0}")]
    InUse(String),
    /// No sensor with this facing exists.
    #[error("no {0} camera on this device")]
    NotFound(Facing),
    /// Transport or surface failure.
    #[error("camera i/o failure: {0}")]
    Io(String),
    /// The request is invalid in the device's current state.
    #[error("camera rejected the request: {0}")]
    Rejected(String),
}

/// Static sensor metadata, read once when the device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorInfo {
    /// Which way the sensor faces.
    pub facing: Facing,
    /// Fixed mounting angle relative to the device's natural orientation.
    pub mount: Rotation,
}

/// Parameters pushed to the hardware before streaming starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewParameters {
    /// Preview stream resolution, if one could be selected.
    pub preview_size: Option<Dimension>,
    /// Rotation tag for still captures.
    pub capture_rotation: Rotation,
}

/// Opaque token for a host rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    /// Wraps a host-assigned surface identifier.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the host-assigned identifier.
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Delivers the encoded still image exactly once.
pub type PictureCallback = Box<dyn FnOnce(Vec<u8>) + Send + 'static>;

/// The system camera service.
pub trait CameraBackend {
    /// Handle type for an opened camera.
    type Device: CameraDevice;

    /// Number of physical cameras present.
    fn camera_count(&self) -> usize;

    /// Acquires exclusive access to the camera with the given facing.
    ///
    /// Fails with [`HardwareError::InUse`] if another client holds it or
    /// [`HardwareError::NotFound`] if no such camera exists.
    fn open(&mut self, facing: Facing) -> Result<Self::Device, HardwareError>;
}

/// An opened, exclusively owned camera.
///
/// Handles are move-only; [`CameraDevice::release`] consumes the handle so
/// a released camera cannot be touched again.
pub trait CameraDevice {
    /// Returns the sensor's facing and mount orientation.
    fn sensor_info(&self) -> SensorInfo;

    /// Returns the preview resolutions the sensor can stream at.
    fn supported_preview_sizes(&self) -> Vec<Dimension>;

    /// Sets the rotation applied to the live preview.
    fn set_display_orientation(&mut self, rotation: Rotation) -> Result<(), HardwareError>;

    /// Pushes preview size and capture rotation to the hardware.
    fn apply_parameters(&mut self, params: &PreviewParameters) -> Result<(), HardwareError>;

    /// Binds the rendering surface preview frames are drawn to.
    fn bind_surface(&mut self, surface: &SurfaceHandle) -> Result<(), HardwareError>;

    /// Starts streaming preview frames.
    fn start_preview(&mut self) -> Result<(), HardwareError>;

    /// Stops streaming. Safe to call when not streaming.
    fn stop_preview(&mut self);

    /// Triggers a one-shot still capture.
    ///
    /// `on_taken` is invoked exactly once with the encoded image bytes,
    /// possibly from another thread.
    fn take_picture(&mut self, on_taken: PictureCallback) -> Result<(), HardwareError>;

    /// Releases the camera back to the system.
    fn release(self);
}
