//! Optimal preview-size selection.

use super::Dimension;

/// Maximum accepted difference between a candidate's aspect ratio and the
/// target ratio.
pub const ASPECT_TOLERANCE: f64 = 0.1;

/// Chooses the supported preview size that best matches a target.
///
/// The target ratio is `target_height / target_width`; callers pass the
/// display metrics pre-swapped for the sensor's mount orientation, so this
/// is compared directly against each candidate's `width / height`.
///
/// Candidates within [`ASPECT_TOLERANCE`] of the target ratio are ranked by
/// `|height - target_height|`. If none pass the ratio filter every candidate
/// is ranked the same way, ignoring aspect. The first minimum in iteration
/// order wins. Returns `None` only when `supported` is empty.
pub fn select_optimal_size(
    supported: &[Dimension],
    target_width: u32,
    target_height: u32,
) -> Option<Dimension> {
    let target_ratio = f64::from(target_height) / f64::from(target_width);

    let closest_height = |candidates: Vec<&Dimension>| {
        // min_by_key keeps the first of equal minima.
        candidates
            .into_iter()
            .min_by_key(|size| size.height.abs_diff(target_height))
            .copied()
    };

    let aspect_matches: Vec<&Dimension> = supported
        .iter()
        .filter(|size| (size.aspect() - target_ratio).abs() <= ASPECT_TOLERANCE)
        .collect();

    let selected = closest_height(aspect_matches).or_else(|| {
        tracing::debug!(
            target_width,
            target_height,
            "no preview size within aspect tolerance, falling back to closest height"
        );
        closest_height(supported.iter().collect())
    });

    if let Some(size) = selected {
        tracing::debug!(%size, target_width, target_height, "selected preview size");
    }
    selected
}
