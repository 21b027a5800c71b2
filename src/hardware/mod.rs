//! Camera hardware and display abstractions.
//!
//! The session never talks to a platform camera API directly. A
//! [`CameraBackend`] hands out exclusively owned [`CameraDevice`] handles,
//! and a [`DisplayProvider`] reports the host's rotation and screen metrics.
//! Mock implementations are provided for tests and the demo binary.

mod device;
mod display;
mod mock;

pub use device::{
    CameraBackend, CameraDevice, HardwareError, PictureCallback, PreviewParameters, SensorInfo,
    SurfaceHandle,
};
pub use display::{DisplayProvider, FixedDisplay};
pub use mock::{MockBackend, MockProbe, MockSensor};
