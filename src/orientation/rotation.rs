//! Quarter-turn rotations and sensor facing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when interpreting raw rotation values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    /// Degrees outside 0, 90, 180 and 270.
    #[error("rotation must be one of 0, 90, 180, 270 degrees (got {0})")]
    NotQuarterTurn(i32),
}

/// A clockwise rotation restricted to the four legal quarter turns.
///
/// Used both for the fixed sensor mount orientation and for the
/// current display rotation reported by the windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    /// No rotation.
    #[default]
    Deg0,
    /// A quarter turn clockwise.
    Deg90,
    /// Upside down.
    Deg180,
    /// Three quarter turns clockwise.
    Deg270,
}

impl Rotation {
    /// All legal rotations, in ascending order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Parses an exact quarter turn in degrees.
    pub fn from_degrees(degrees: i32) -> Result<Self, RotationError> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(RotationError::NotQuarterTurn(other)),
        }
    }

    /// Returns the rotation in degrees.
    #[inline]
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// True when the rotation exchanges width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<i32> for Rotation {
    type Error = RotationError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        Self::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees() as i32
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Which physical camera a session targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Faces the user; its preview is mirrored.
    Front,
    /// Faces away from the user.
    #[default]
    Back,
}

impl Facing {
    /// Returns the opposite facing.
    pub fn other(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => f.write_str("front"),
            Facing::Back => f.write_str("back"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_degrees_accepts_quarter_turns() {
        for rotation in Rotation::ALL {
            let parsed = Rotation::from_degrees(rotation.degrees() as i32).unwrap();
            assert_eq!(parsed, rotation);
        }
    }

    #[test]
    fn test_from_degrees_rejects_other_values() {
        assert_eq!(
            Rotation::from_degrees(45),
            Err(RotationError::NotQuarterTurn(45))
        );
        assert!(Rotation::from_degrees(360).is_err());
        assert!(Rotation::from_degrees(-90).is_err());
    }

    #[test]
    fn test_swaps_dimensions() {
        assert!(!Rotation::Deg0.swaps_dimensions());
        assert!(Rotation::Deg90.swaps_dimensions());
        assert!(!Rotation::Deg180.swaps_dimensions());
        assert!(Rotation::Deg270.swaps_dimensions());
    }

    #[test]
    fn test_facing_other_is_involution() {
        assert_eq!(Facing::Back.other(), Facing::Front);
        assert_eq!(Facing::Front.other().other(), Facing::Front);
    }
}
