//! Per-open camera configuration.

use crate::hardware::{DisplayProvider, PreviewParameters, SensorInfo};
use crate::orientation::{DerivedOrientation, Facing, Rotation};
use crate::preview::{select_optimal_size, Dimension};

/// Configuration derived from sensor metadata and display state.
///
/// Rebuilt as a whole whenever the facing or display rotation may have
/// changed; individual fields are never patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Facing of the sensor this config was derived for.
    pub facing: Facing,
    /// Sensor mount orientation.
    pub mount: Rotation,
    /// Display rotation at derivation time.
    pub display_rotation: Rotation,
    /// Preview orientation and capture rotation.
    pub orientation: DerivedOrientation,
    /// Selected preview resolution, `None` if the sensor reported no sizes.
    pub preview_size: Option<Dimension>,
}

impl SessionConfig {
    /// Derives the configuration for an opened sensor.
    ///
    /// The screen size is used as the selection target, swapped when the
    /// sensor is mounted sideways relative to the device.
    pub fn derive<D: DisplayProvider + ?Sized>(
        sensor: SensorInfo,
        display: &D,
        supported_sizes: &[Dimension],
    ) -> Self {
        let display_rotation = display.current_rotation();
        let screen = display.screen_size();
        let orientation = DerivedOrientation::derive(sensor.mount, display_rotation, sensor.facing);

        let target = if sensor.mount.swaps_dimensions() {
            screen.swapped()
        } else {
            screen
        };
        let preview_size = select_optimal_size(supported_sizes, target.width, target.height);

        tracing::debug!(
            facing = %sensor.facing,
            mount = %sensor.mount,
            display = %display_rotation,
            preview = %orientation.preview,
            capture = %orientation.capture,
            ?preview_size,
            "derived camera configuration"
        );

        Self {
            facing: sensor.facing,
            mount: sensor.mount,
            display_rotation,
            orientation,
            preview_size,
        }
    }

    /// Parameters to push to the hardware.
    pub fn preview_parameters(&self) -> PreviewParameters {
        PreviewParameters {
            preview_size: self.preview_size,
            capture_rotation: self.orientation.capture,
        }
    }

    /// Re-derives orientation for a new display rotation.
    ///
    /// The preview size is kept since the stream is already running at it.
    pub fn rotated(&self, display_rotation: Rotation) -> Self {
        Self {
            display_rotation,
            orientation: DerivedOrientation::derive(self.mount, display_rotation, self.facing),
            ..*self
        }
    }

    /// Size the host should give its preview view.
    ///
    /// Preview sizes are reported in sensor orientation, so portrait hosts
    /// get them swapped. `None` means the view should fill its parent.
    pub fn layout_size(&self, portrait: bool) -> Option<Dimension> {
        self.preview_size
            .map(|size| if portrait { size.swapped() } else { size })
    }
}
