//! Preview orientation and capture rotation formulas.

use super::{Facing, Rotation};

/// Normalizes a sum of quarter turns back into a [`Rotation`].
#[inline]
fn quarter_turns(degrees: u32) -> Rotation {
    Rotation::ALL[((degrees % 360) / 90) as usize]
}

/// Rotation to apply to the live preview transform.
///
/// Back sensor: `(mount - display + 360) mod 360`.
/// Front sensor: `(360 - (mount + display) mod 360) mod 360`, which
/// compensates the mirrored selfie preview.
pub fn derive_preview_orientation(mount: Rotation, display: Rotation, facing: Facing) -> Rotation {
    let (m, d) = (mount.degrees(), display.degrees());
    match facing {
        Facing::Back => quarter_turns(m + 360 - d),
        Facing::Front => quarter_turns(360 - (m + d) % 360),
    }
}

/// Rotation tag to apply to the captured still image.
///
/// Back sensor: `(mount + display) mod 360`.
/// Front sensor: `(mount - display + 360) mod 360`. The persisted image is
/// mirrored back by its consumer, so no mirror compensation here.
pub fn derive_capture_rotation(mount: Rotation, display: Rotation, facing: Facing) -> Rotation {
    let (m, d) = (mount.degrees(), display.degrees());
    match facing {
        Facing::Back => quarter_turns(m + d),
        Facing::Front => quarter_turns(m + 360 - d),
    }
}

/// Preview orientation and capture rotation derived from one input triple.
///
/// The two values are only ever produced together so a facing swap or a
/// device rotation can never leave one of them stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedOrientation {
    /// Applied to the live preview transform.
    pub preview: Rotation,
    /// Applied to the still-image rotation tag.
    pub capture: Rotation,
}

impl DerivedOrientation {
    /// Derives both values for the given sensor and display state.
    pub fn derive(mount: Rotation, display: Rotation, facing: Facing) -> Self {
        Self {
            preview: derive_preview_orientation(mount, display, facing),
            capture: derive_capture_rotation(mount, display, facing),
        }
    }
}
