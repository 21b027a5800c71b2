//! Host display metrics.

use crate::orientation::Rotation;
use crate::preview::Dimension;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reports the host window's rotation and screen size.
///
/// Queried at session open and whenever configuration is re-derived.
pub trait DisplayProvider {
    /// Current rotation of the display from its natural orientation.
    fn current_rotation(&self) -> Rotation;

    /// Screen size in the current orientation.
    fn screen_size(&self) -> Dimension;

    /// True when the host is laid out in portrait.
    fn is_portrait(&self) -> bool {
        self.screen_size().is_portrait()
    }
}

impl<T: DisplayProvider + ?Sized> DisplayProvider for Arc<T> {
    fn current_rotation(&self) -> Rotation {
        (**self).current_rotation()
    }

    fn screen_size(&self) -> Dimension {
        (**self).screen_size()
    }

    fn is_portrait(&self) -> bool {
        (**self).is_portrait()
    }
}

/// A display with a fixed screen size and an adjustable rotation.
///
/// Rotating swaps the reported screen size the way a real device does
/// when it turns between portrait and landscape.
#[derive(Debug)]
pub struct FixedDisplay {
    natural: Dimension,
    rotation: AtomicUsize,
}

impl FixedDisplay {
    /// Creates a display with the given natural-orientation size.
    pub fn new(natural: Dimension) -> Self {
        Self {
            natural,
            rotation: AtomicUsize::new(0),
        }
    }

    /// Creates a display already rotated.
    pub fn rotated(natural: Dimension, rotation: Rotation) -> Self {
        let display = Self::new(natural);
        display.set_rotation(rotation);
        display
    }

    /// Simulates the user turning the device.
    pub fn set_rotation(&self, rotation: Rotation) {
        let index = Rotation::ALL
            .iter()
            .position(|r| *r == rotation)
            .unwrap_or_default();
        self.rotation.store(index, Ordering::Relaxed);
    }
}

impl DisplayProvider for FixedDisplay {
    fn current_rotation(&self) -> Rotation {
        Rotation::ALL[self.rotation.load(Ordering::Relaxed) % Rotation::ALL.len()]
    }

    fn screen_size(&self) -> Dimension {
        if self.current_rotation().swaps_dimensions() {
            self.natural.swapped()
        } else {
            self.natural
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_swaps_screen_size() {
        let display = FixedDisplay::new(Dimension::new(1080, 1920));
        assert!(display.is_portrait());

        display.set_rotation(Rotation::Deg90);
        assert_eq!(display.current_rotation(), Rotation::Deg90);
        assert_eq!(display.screen_size(), Dimension::new(1920, 1080));
        assert!(!display.is_portrait());
    }

    #[test]
    fn test_shared_display_sees_updates() {
        let display = Arc::new(FixedDisplay::new(Dimension::new(1080, 1920)));
        let shared = Arc::clone(&display);

        display.set_rotation(Rotation::Deg180);
        assert_eq!(shared.current_rotation(), Rotation::Deg180);
    }
}
