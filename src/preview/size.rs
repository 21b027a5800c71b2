//! Pixel dimensions shared by display metrics and hardware preview sizes.

use serde::{Deserialize, Serialize};

/// A width/height pair in pixels.
///
/// Represents either a display resolution or a preview size the
/// hardware can stream at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimension {
    /// Creates a new dimension.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the dimension with width and height exchanged.
    #[inline]
    pub const fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Width divided by height.
    #[inline]
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// True when taller than wide.
    #[inline]
    pub fn is_portrait(self) -> bool {
        self.height > self.width
    }

    /// True when both sides are non-zero.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swapped() {
        let size = Dimension::new(1920, 1080);
        assert_eq!(size.swapped(), Dimension::new(1080, 1920));
        assert!(size.swapped().is_portrait());
        assert!(!size.is_portrait());
    }

    #[test]
    fn test_display_format() {
        assert_eq!(Dimension::new(640, 480).to_string(), "640x480");
    }
}
