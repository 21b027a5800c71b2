//! Sensor-to-display rotation math.
//!
//! The live preview and the captured still need different corrections:
//! a front sensor produces a mirrored preview, so its preview transform
//! compensates the mirror while the still-image rotation tag does not.

mod derive;
mod rotation;

pub use derive::{derive_capture_rotation, derive_preview_orientation, DerivedOrientation};
pub use rotation::{Facing, Rotation, RotationError};
